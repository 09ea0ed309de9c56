//! Encoded key types.
//!
//! These hold canonical byte encodings only. Decoding into curve points and
//! scalars (and validating them) is the job of the curve adapter in
//! `shade-crypto`.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::MAX_PUBLIC_KEY_SIZE;
use crate::error::{Result, ShadeError};

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical encoding of a public point (compressed SEC1 for secp256k1).
///
/// Construction only rejects empty or oversized input; curve validity is
/// checked when the key is decoded by a curve adapter.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedPublicKey {
    bytes: Vec<u8>,
}

impl EncodedPublicKey {
    /// Creates an encoded public key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ShadeError::MalformedKey("public key is empty".into()));
        }
        if bytes.len() > MAX_PUBLIC_KEY_SIZE {
            return Err(ShadeError::MalformedKey(format!(
                "public key too large: {} bytes, maximum {}",
                bytes.len(),
                MAX_PUBLIC_KEY_SIZE
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the encoded length.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the encoding is empty (never for a constructed key).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if every byte is zero.
    pub fn is_all_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Returns the hex-encoded key.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Creates a key from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for EncodedPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncodedPublicKey({})", self.to_hex())
    }
}

impl Serialize for EncodedPublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EncodedPublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECRET KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical encoding of a private scalar.
///
/// Zeroized on drop. Never expose this in logs or error messages.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncodedSecretKey {
    bytes: Vec<u8>,
}

impl EncodedSecretKey {
    /// Creates an encoded secret key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ShadeError::MalformedKey("secret key is empty".into()));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Returns the raw bytes.
    ///
    /// # Security
    /// Handle the returned bytes carefully - do not log or expose them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the hex-encoded key (for key files only).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Creates a key from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(s)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }
}

impl std::fmt::Debug for EncodedSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose secret key content
        write!(f, "EncodedSecretKey([REDACTED])")
    }
}
