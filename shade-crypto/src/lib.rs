//! # SHADE Cryptography
//!
//! Elliptic-curve primitives for the SHADE stealth address protocol.
//!
//! This crate provides:
//!
//! - **Curve**: the [`CurveAdapter`] contract and its secp256k1 implementation
//! - **Hash**: the [`SecretHasher`] contract, Keccak256, EIP-55 checksums
//! - **Suite**: [`StealthSuite`] binds a curve, a hash and a scheme id
//! - **Keys**: key pairs, ephemeral keys, recipient keys, viewing keys
//! - **View Tags**: 12-byte tags for cheap rejection during scanning
//! - **Derivation**: shared secrets and stealth key pairs
//!
//! ## Security Properties
//!
//! - Scalars and points from the adapter are never zero / never the identity
//! - Secret scalars and secret hashes are zeroized on drop
//! - View tag and address comparisons are constant-time
//!
//! ## Example
//!
//! ```rust
//! use shade_crypto::{derive, generate_keypair, DefaultSuite, KeyPair, Secp256k1};
//!
//! let viewing: KeyPair<Secp256k1> = generate_keypair().unwrap();
//! let ephemeral: KeyPair<Secp256k1> = generate_keypair().unwrap();
//!
//! let sender = derive::sender_shared_secret::<Secp256k1>(ephemeral.secret(), viewing.public()).unwrap();
//! let recipient = derive::recipient_shared_secret::<Secp256k1>(viewing.secret(), ephemeral.public()).unwrap();
//!
//! let tag_a = derive::hash_shared_secret::<DefaultSuite>(&sender).view_tag();
//! let tag_b = derive::hash_shared_secret::<DefaultSuite>(&recipient).view_tag();
//! assert_eq!(tag_a, tag_b);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod curve;
pub mod derive;
pub mod hash;
pub mod keys;
pub mod suite;
pub mod view_tag;

// Re-export main items at crate root
pub use curve::{CurveAdapter, Secp256k1};
pub use derive::{derive_stealth_key_pair, SecretHash, SharedSecret, StealthKeyPair};
pub use hash::{keccak256, to_checksum_address, Keccak256Hasher, SecretHasher};
pub use keys::{
    decode_public_key, encode_public_key, generate_keypair, validate_keypair, EphemeralKeyPair,
    KeyPair, RecipientKeys, ViewingKey,
};
pub use suite::{DefaultSuite, Secp256k1Keccak, StealthSuite};
pub use view_tag::{compute_view_tag, verify_view_tag};
