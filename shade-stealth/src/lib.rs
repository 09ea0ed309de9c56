//! # SHADE Stealth Address Protocol
//!
//! High-level API for creating and discovering stealth addresses.
//!
//! This crate provides:
//!
//! - **Wallets**: recipient key sets, meta-addresses, key files
//! - **Stealth Address Creation**: one-time addresses and announcements
//! - **Payment Discovery**: scanning announcement sequences for our payments
//!
//! ## Quick Start
//!
//! ```rust
//! use shade_stealth::{create_stealth_payment, StealthWallet};
//!
//! // Recipient: generate keys and publish the meta-address
//! let wallet: StealthWallet = StealthWallet::generate().unwrap();
//!
//! // Sender: derive a one-time address and the announcement to publish
//! let payment = create_stealth_payment(wallet.meta_address()).unwrap();
//!
//! // Recipient: discover the payment
//! let announcements = vec![payment.announcement.clone()];
//! let found = wallet.scan(&announcements);
//! assert_eq!(found.len(), 1);
//! assert_eq!(*found[0].keys.address(), payment.stealth_address);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod discovery;
pub mod payment;
pub mod wallet;

pub use discovery::{
    check_announcement, AnnouncementScanner, AsAnnouncement, Discovery, NoDiagnostics,
    ObservedStealthAddress, Scan, ScanDiagnostics, ScanKey, ScanOutcome, ScanStats,
    TracingDiagnostics,
};
pub use payment::{
    create_stealth_payment, create_stealth_payment_with_rng, decode_meta_address,
    generate_stealth_address, GeneratedStealthAddress, StealthPayment, StealthPaymentBuilder,
};
pub use wallet::{StealthWallet, ViewingKeyExport, WalletConfig, WalletKeyFile};
