//! # SHADE Core
//!
//! Core types, errors, and collaborator traits for the SHADE stealth address protocol.
//!
//! This crate provides the foundational building blocks used by all other SHADE crates:
//!
//! - **Types**: Addresses, view tags, encoded keys, meta-addresses, announcements
//! - **Errors**: The protocol error taxonomy
//! - **Constants**: Protocol sizes, scheme ids and wire offsets
//! - **Traits**: Interfaces for the external key registry and announcement log
//!
//! Nothing here performs curve arithmetic; see `shade-crypto` for that.
//!
//! ## Example
//!
//! ```rust
//! use shade_core::{Address, ViewTag};
//!
//! let address = Address::from_array([0x11; 20]);
//! let view_tag = ViewTag::from_array([0x22; 12]);
//! let slot = shade_core::pack_recipient_and_view_tag(&address, &view_tag);
//! assert_eq!(&slot[..20], address.as_bytes());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, ShadeError};
pub use traits::*;
pub use types::*;
