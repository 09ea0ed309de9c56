//! View tag computation for efficient scanning.
//!
//! The view tag is the first 12 bytes of the secret hash. A recipient
//! recomputes it after one scalar multiplication and one hash, and only runs
//! the full address derivation when it matches.
//!
//! ## Efficiency
//!
//! An unrelated announcement passes the filter with probability 2^-96, so in
//! practice every foreign entry is rejected on the cheap path.
//!
//! ## Security
//!
//! The tag reveals 96 bits of the secret hash. The offset scalar is derived
//! from the full 256-bit digest and the secret hash itself is never published.

use subtle::ConstantTimeEq;

use shade_core::constants::VIEW_TAG_SIZE;
use shade_core::types::ViewTag;

use crate::derive::SecretHash;

/// The most-significant [`VIEW_TAG_SIZE`] bytes of the secret hash.
pub fn compute_view_tag(secret_hash: &SecretHash) -> ViewTag {
    let mut tag = [0u8; VIEW_TAG_SIZE];
    tag.copy_from_slice(&secret_hash.as_bytes()[..VIEW_TAG_SIZE]);
    ViewTag::from_array(tag)
}

/// Constant-time check of a view tag against a secret hash.
pub fn verify_view_tag(secret_hash: &SecretHash, expected: &ViewTag) -> bool {
    let computed = compute_view_tag(secret_hash);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}
