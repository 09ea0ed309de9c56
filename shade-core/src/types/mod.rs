//! Domain types for SHADE.
//!
//! - [`EncodedPublicKey`] / [`EncodedSecretKey`]: curve-agnostic key encodings
//! - [`Address`]: 20-byte one-way identifier of a public point
//! - [`StealthMetaAddress`]: published (spending, viewing) public keys
//! - [`ViewTag`], [`Metadata`], [`Announcement`], [`LogEntry`]: announcement records

mod keys;
mod address;
mod announcement;

pub use keys::*;
pub use address::*;
pub use announcement::*;
