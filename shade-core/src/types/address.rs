//! Address types for SHADE.
//!
//! - [`Address`]: A 20-byte identifier derived one-way from a public point
//! - [`StealthMetaAddress`]: The (spending, viewing) public key pair a recipient publishes

use serde::{Deserialize, Serialize};

use super::EncodedPublicKey;
use crate::constants::{ADDRESS_SIZE, META_ADDRESS_PREFIX, SCHEME_ID_SECP256K1};
use crate::error::{Result, ShadeError};

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A 20-byte address.
///
/// Used both for stealth addresses and as the account identifier of the key
/// registry. Derivation from a public point lives in the curve adapter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    bytes: [u8; ADDRESS_SIZE],
}

impl Address {
    /// Creates an address from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| {
            ShadeError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Creates from a fixed-size array.
    pub const fn from_array(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the address as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; ADDRESS_SIZE] {
        &self.bytes
    }

    /// Returns the lowercase `0x`-prefixed hex string.
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Parses from hex string (with or without 0x prefix, any case).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the zero address.
    pub const fn zero() -> Self {
        Self {
            bytes: [0u8; ADDRESS_SIZE],
        }
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex_string())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl std::str::FromStr for Address {
    type Err = ShadeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH META-ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// The public keys a recipient publishes so senders can derive stealth addresses.
///
/// # Text Format
/// ```text
/// st:eth:0x<spending_public_key><viewing_public_key>
/// ```
/// Both keys use the curve adapter's canonical encoding and have equal length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthMetaAddress {
    /// Curve/hash suite the keys belong to
    pub scheme_id: u64,
    /// Spending public key - stealth public points are offsets of this key
    pub spending_public_key: EncodedPublicKey,
    /// Viewing public key - senders compute the shared secret against it
    pub viewing_public_key: EncodedPublicKey,
}

impl StealthMetaAddress {
    /// Creates a meta-address for the reference secp256k1 scheme.
    pub fn new(spending_public_key: EncodedPublicKey, viewing_public_key: EncodedPublicKey) -> Self {
        Self::with_scheme(SCHEME_ID_SECP256K1, spending_public_key, viewing_public_key)
    }

    /// Creates a meta-address for an explicit scheme id.
    pub fn with_scheme(
        scheme_id: u64,
        spending_public_key: EncodedPublicKey,
        viewing_public_key: EncodedPublicKey,
    ) -> Self {
        Self {
            scheme_id,
            spending_public_key,
            viewing_public_key,
        }
    }

    /// Validates the structure.
    ///
    /// Curve membership is checked later by the curve adapter; this only
    /// rejects encodings that can never be valid keys.
    pub fn validate(&self) -> Result<()> {
        if self.spending_public_key.len() != self.viewing_public_key.len() {
            return Err(ShadeError::InvalidMetaAddress(format!(
                "key lengths differ: spending {}, viewing {}",
                self.spending_public_key.len(),
                self.viewing_public_key.len()
            )));
        }

        if self.spending_public_key.is_all_zero() {
            return Err(ShadeError::InvalidMetaAddress(
                "spending key is all zeros".into(),
            ));
        }

        if self.viewing_public_key.is_all_zero() {
            return Err(ShadeError::InvalidMetaAddress(
                "viewing key is all zeros".into(),
            ));
        }

        Ok(())
    }

    /// Serializes to `spending_public_key || viewing_public_key`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(self.spending_public_key.len() + self.viewing_public_key.len());
        bytes.extend_from_slice(self.spending_public_key.as_bytes());
        bytes.extend_from_slice(self.viewing_public_key.as_bytes());
        bytes
    }

    /// Deserializes from `spending_public_key || viewing_public_key`.
    ///
    /// The two keys must have equal length, so the input length must be even.
    pub fn from_bytes(scheme_id: u64, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() || bytes.len() % 2 != 0 {
            return Err(ShadeError::InvalidMetaAddress(format!(
                "expected two equal-length keys, got {} bytes",
                bytes.len()
            )));
        }

        let (spending, viewing) = bytes.split_at(bytes.len() / 2);
        let meta = Self::with_scheme(
            scheme_id,
            EncodedPublicKey::from_bytes(spending)?,
            EncodedPublicKey::from_bytes(viewing)?,
        );

        meta.validate()?;
        Ok(meta)
    }

    /// Encodes to the `st:eth:0x…` text form.
    pub fn to_meta_string(&self) -> String {
        format!("{}{}", META_ADDRESS_PREFIX, hex::encode(self.to_bytes()))
    }

    /// Parses the `st:eth:0x…` text form for the reference scheme.
    pub fn from_meta_string(s: &str) -> Result<Self> {
        let payload = s.trim().strip_prefix(META_ADDRESS_PREFIX).ok_or_else(|| {
            ShadeError::InvalidMetaAddress(format!("missing '{}' prefix", META_ADDRESS_PREFIX))
        })?;
        let bytes = hex::decode(payload)?;
        Self::from_bytes(SCHEME_ID_SECP256K1, &bytes)
    }
}

impl std::fmt::Display for StealthMetaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_meta_string())
    }
}

impl std::str::FromStr for StealthMetaAddress {
    type Err = ShadeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_meta_string(s)
    }
}
