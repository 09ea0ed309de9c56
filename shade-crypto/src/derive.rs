//! Shared secret and stealth key derivation.
//!
//! ## Derivation Flow
//!
//! ```text
//! sender:     s = e · V            recipient:  s = v · E
//!                         ↓
//!             h = H(compressed(s))
//!                         ↓
//!             view_tag = h[0..12]      k = h mod n
//!                         ↓
//!             P = S + k · G            p = s_spend + k
//!                         ↓
//!             address = point_to_address(P)
//! ```
//!
//! The shared secret is always hashed in its 33-byte compressed SEC1 form.
//! Sender and recipient must agree on this byte for byte, so it is fixed here
//! and pinned by tests.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use shade_core::constants::DIGEST_SIZE;
use shade_core::error::{Result, ShadeError};
use shade_core::types::{Address, EncodedSecretKey, ViewTag};

use crate::curve::CurveAdapter;
use crate::hash::SecretHasher;
use crate::keys::KeyPair;
use crate::suite::StealthSuite;
use crate::view_tag::compute_view_tag;

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED SECRET
// ═══════════════════════════════════════════════════════════════════════════════

/// The Diffie-Hellman point `e · V = v · E`. Never persisted.
pub struct SharedSecret<C: CurveAdapter> {
    point: C::Point,
}

impl<C: CurveAdapter> SharedSecret<C> {
    /// The encoding fed to the hash adapter (compressed point).
    pub fn encode(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(C::encode_point(&self.point))
    }

    /// The group element.
    pub fn point(&self) -> &C::Point {
        &self.point
    }
}

impl<C: CurveAdapter> std::fmt::Debug for SharedSecret<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

fn shared_point<C: CurveAdapter>(scalar: &C::Scalar, point: &C::Point) -> Result<SharedSecret<C>> {
    match C::scalar_multiply(scalar, point) {
        Ok(point) => Ok(SharedSecret { point }),
        Err(ShadeError::InvalidPoint(_)) => Err(ShadeError::SharedSecretDerivationFailed),
        Err(e) => Err(e),
    }
}

/// Sender side: `ephemeral_secret · viewing_public`.
///
/// An identity result fails with `SharedSecretDerivationFailed`; the caller
/// must draw a new ephemeral key.
pub fn sender_shared_secret<C: CurveAdapter>(
    ephemeral_secret: &C::Scalar,
    viewing_public: &C::Point,
) -> Result<SharedSecret<C>> {
    shared_point(ephemeral_secret, viewing_public)
}

/// Recipient side: `viewing_secret · ephemeral_public`.
pub fn recipient_shared_secret<C: CurveAdapter>(
    viewing_secret: &C::Scalar,
    ephemeral_public: &C::Point,
) -> Result<SharedSecret<C>> {
    shared_point(viewing_secret, ephemeral_public)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECRET HASH
// ═══════════════════════════════════════════════════════════════════════════════

/// `H(compressed(shared_secret))`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretHash([u8; DIGEST_SIZE]);

impl SecretHash {
    /// Wraps a raw digest.
    pub fn from_digest(digest: [u8; DIGEST_SIZE]) -> Self {
        Self(digest)
    }

    /// The digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Shortcut for [`compute_view_tag`].
    pub fn view_tag(&self) -> ViewTag {
        compute_view_tag(self)
    }
}

impl std::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretHash([REDACTED])")
    }
}

/// Hashes the compressed shared secret with the suite's hash adapter.
pub fn hash_shared_secret<S: StealthSuite>(secret: &SharedSecret<S::Curve>) -> SecretHash {
    SecretHash(S::Hasher::hash(&secret.encode()))
}

/// The full digest reduced into the scalar field.
pub fn offset_scalar<C: CurveAdapter>(hash: &SecretHash) -> Result<C::Scalar> {
    C::scalar_from_digest(hash.as_bytes())
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// `spending_public + offset · G`.
pub fn stealth_public_point<C: CurveAdapter>(
    spending_public: &C::Point,
    offset: &C::Scalar,
) -> Result<C::Point> {
    let offset_point = C::generator_multiply(offset)?;
    C::point_add(spending_public, &offset_point)
}

/// `spending_secret + offset`.
pub fn stealth_private_scalar<C: CurveAdapter>(
    spending_secret: &C::Scalar,
    offset: &C::Scalar,
) -> Result<C::Scalar> {
    C::scalar_add(spending_secret, offset)
}

/// Stealth public point and address for a secret hash (no private key).
pub fn derive_stealth_public<C: CurveAdapter>(
    spending_public: &C::Point,
    hash: &SecretHash,
) -> Result<(C::Point, Address)> {
    let mut offset = offset_scalar::<C>(hash)?;
    let public = stealth_public_point::<C>(spending_public, &offset);
    offset.zeroize();
    let public = public?;
    Ok((public, C::point_to_address(&public)))
}

/// The key pair controlling one stealth address.
///
/// Exists only in the recipient's memory after a successful scan.
pub struct StealthKeyPair<C: CurveAdapter> {
    secret: C::Scalar,
    public: C::Point,
    address: Address,
}

impl<C: CurveAdapter> StealthKeyPair<C> {
    /// The stealth private scalar.
    pub fn secret(&self) -> &C::Scalar {
        &self.secret
    }

    /// The stealth public point.
    pub fn public(&self) -> &C::Point {
        &self.public
    }

    /// The stealth address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Canonical encoding of the private scalar (for export).
    pub fn encoded_secret(&self) -> Result<EncodedSecretKey> {
        EncodedSecretKey::from_bytes(&C::scalar_to_bytes(&self.secret))
    }

    /// Checks `public == secret · G` and that the address matches `public`.
    pub fn validate(&self) -> bool {
        match C::generator_multiply(&self.secret) {
            Ok(p) => p == self.public && C::point_to_address(&p) == self.address,
            Err(_) => false,
        }
    }
}

impl<C: CurveAdapter> Clone for StealthKeyPair<C> {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret,
            public: self.public,
            address: self.address,
        }
    }
}

impl<C: CurveAdapter> Drop for StealthKeyPair<C> {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl<C: CurveAdapter> std::fmt::Debug for StealthKeyPair<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthKeyPair")
            .field("address", &self.address)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Derives the full stealth key pair from the spending pair and a secret hash.
pub fn derive_stealth_key_pair<C: CurveAdapter>(
    spending: &KeyPair<C>,
    hash: &SecretHash,
) -> Result<StealthKeyPair<C>> {
    let mut offset = offset_scalar::<C>(hash)?;
    let pair = stealth_public_point::<C>(spending.public(), &offset).and_then(|public| {
        let secret = stealth_private_scalar::<C>(spending.secret(), &offset)?;
        Ok(StealthKeyPair {
            secret,
            public,
            address: C::point_to_address(&public),
        })
    });
    offset.zeroize();
    pair
}

/// Constant-time address comparison.
pub fn addresses_match(a: &Address, b: &Address) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Secp256k1;
    use crate::hash::keccak256;
    use crate::suite::DefaultSuite;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    type C = Secp256k1;

    fn scalar(n: u8) -> k256::Scalar {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        C::scalar_from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_shared_secret_commutes() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let e = KeyPair::<C>::generate(&mut rng).unwrap();
        let v = KeyPair::<C>::generate(&mut rng).unwrap();

        let sender = sender_shared_secret::<C>(e.secret(), v.public()).unwrap();
        let recipient = recipient_shared_secret::<C>(v.secret(), e.public()).unwrap();

        assert_eq!(sender.point(), recipient.point());
        assert_eq!(*sender.encode(), *recipient.encode());
    }

    #[test]
    fn test_shared_secret_encoding_pinned() {
        // 1 · G = G, so the hashed encoding must be keccak256(compressed G)
        let g = C::generator_multiply(&scalar(1)).unwrap();
        let secret = sender_shared_secret::<C>(&scalar(1), &g).unwrap();

        let encoded = secret.encode();
        assert_eq!(
            hex::encode(&*encoded),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );

        let hash = hash_shared_secret::<DefaultSuite>(&secret);
        assert_eq!(hash.as_bytes(), &keccak256(&encoded));
    }

    #[test]
    fn test_identity_shared_secret_fails() {
        let identity = k256::ProjectivePoint::IDENTITY;
        assert!(matches!(
            sender_shared_secret::<C>(&scalar(5), &identity),
            Err(ShadeError::SharedSecretDerivationFailed)
        ));
    }

    #[test]
    fn test_zero_scalar_shared_secret_fails() {
        let g = C::generator_multiply(&scalar(1)).unwrap();
        assert!(matches!(
            recipient_shared_secret::<C>(&k256::Scalar::ZERO, &g),
            Err(ShadeError::InvalidScalar(_))
        ));
    }

    #[test]
    fn test_stealth_key_pair_consistent() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let spending = KeyPair::<C>::generate(&mut rng).unwrap();
        let hash = SecretHash::from_digest(keccak256(b"fixture"));

        let pair = derive_stealth_key_pair(&spending, &hash).unwrap();
        assert!(pair.validate());

        let (public, address) = derive_stealth_public::<C>(spending.public(), &hash).unwrap();
        assert_eq!(&public, pair.public());
        assert_eq!(&address, pair.address());
        assert_ne!(public, *spending.public());
    }

    #[test]
    fn test_stealth_public_is_linear() {
        // (s + k)·G == S + k·G
        let s = scalar(9);
        let k = scalar(4);
        let spend_pub = C::generator_multiply(&s).unwrap();

        let lhs = C::generator_multiply(&stealth_private_scalar::<C>(&s, &k).unwrap()).unwrap();
        let rhs = stealth_public_point::<C>(&spend_pub, &k).unwrap();
        assert_eq!(lhs, rhs);
        assert_eq!(lhs, C::generator_multiply(&scalar(13)).unwrap());
    }

    #[test]
    fn test_addresses_match() {
        let a = Address::from_array([1; 20]);
        let b = Address::from_array([2; 20]);
        assert!(addresses_match(&a, &a));
        assert!(!addresses_match(&a, &b));
    }

    #[test]
    fn test_debug_redacted() {
        let hash = SecretHash::from_digest([0xAB; 32]);
        assert_eq!(format!("{:?}", hash), "SecretHash([REDACTED])");
    }
}
