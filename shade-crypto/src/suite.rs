//! Stealth suites.
//!
//! A suite fixes the curve adapter, the hash adapter and the scheme id that
//! identifies the combination on the wire. Generator and scanner are generic
//! over one suite, so they cannot disagree on the hash or the shared-secret
//! encoding.

use shade_core::constants::SCHEME_ID_SECP256K1;
use shade_core::error::{Result, ShadeError};

use crate::curve::{CurveAdapter, Secp256k1};
use crate::hash::{Keccak256Hasher, SecretHasher};

/// Curve + hash + scheme id.
pub trait StealthSuite: Send + Sync + 'static {
    /// Group the keys live in.
    type Curve: CurveAdapter;
    /// Hash applied to the encoded shared secret.
    type Hasher: SecretHasher;

    /// Scheme id carried by meta-addresses and announcements.
    const SCHEME_ID: u64;

    /// Fails with `SchemeMismatch` when `scheme_id` belongs to another suite.
    fn ensure_scheme(scheme_id: u64) -> Result<()> {
        if scheme_id != Self::SCHEME_ID {
            return Err(ShadeError::SchemeMismatch {
                expected: Self::SCHEME_ID,
                actual: scheme_id,
            });
        }
        Ok(())
    }

    /// `curve/hash` label for logs.
    fn describe() -> String {
        format!(
            "{}/{}",
            <Self::Curve as CurveAdapter>::NAME,
            <Self::Hasher as SecretHasher>::NAME
        )
    }
}

/// secp256k1 keys, Keccak256 secret hash, 12-byte view tags.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Keccak;

impl StealthSuite for Secp256k1Keccak {
    type Curve = Secp256k1;
    type Hasher = Keccak256Hasher;

    const SCHEME_ID: u64 = SCHEME_ID_SECP256K1;
}

/// The suite used when none is named.
pub type DefaultSuite = Secp256k1Keccak;
