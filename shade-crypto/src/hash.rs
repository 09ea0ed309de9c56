//! Hash adapter.
//!
//! The hash adapter turns the encoded shared secret into a fixed-width
//! digest. Its output feeds both the view tag and the offset scalar, and
//! nothing else.
//!
//! ```text
//! secret_hash = H(compressed(shared_secret))
//! view_tag    = secret_hash[0..12]
//! offset      = secret_hash mod n
//! ```
//!
//! Address derivation hashes with Keccak256 too, but does so through the curve
//! adapter's own path ([`keccak256`]) rather than through [`SecretHasher`].

use sha3::{Digest, Keccak256};

use shade_core::constants::DIGEST_SIZE;
use shade_core::types::Address;

// ═══════════════════════════════════════════════════════════════════════════════
// ADAPTER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed-output hash applied to the encoded shared secret.
pub trait SecretHasher: Send + Sync + 'static {
    /// Human readable hash name.
    const NAME: &'static str;

    /// Hashes `input` into a [`DIGEST_SIZE`]-byte digest.
    fn hash(input: &[u8]) -> [u8; DIGEST_SIZE];
}

/// Keccak256 (the pre-standard SHA-3 padding used by Ethereum).
#[derive(Clone, Copy, Debug, Default)]
pub struct Keccak256Hasher;

impl SecretHasher for Keccak256Hasher {
    const NAME: &'static str = "keccak256";

    fn hash(input: &[u8]) -> [u8; DIGEST_SIZE] {
        keccak256(input)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KECCAK256
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes Keccak256.
///
/// Note: Keccak256 is NOT SHA3-256. They use different padding.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// EIP-55 mixed-case checksum encoding of an address.
pub fn to_checksum_address(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0F;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256() {
        let hash = keccak256(b"hello");
        let expected =
            hex::decode("1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_hasher_matches_keccak() {
        let input = [0x02u8; 33];
        assert_eq!(Keccak256Hasher::hash(&input), keccak256(&input));
    }

    #[test]
    fn test_checksum_address() {
        let address = Address::from_hex("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            to_checksum_address(&address),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }
}
