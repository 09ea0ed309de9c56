//! Key material.
//!
//! A recipient holds two independent key pairs: the spending pair controls
//! custody, the viewing pair only scans and can be handed to a scanning
//! service as a [`ViewingKey`]. Senders draw a fresh [`EphemeralKeyPair`] per
//! announcement.
//!
//! Secret scalars are zeroized on drop and never appear in `Debug` output.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use shade_core::error::{Result, ShadeError};
use shade_core::types::{Address, EncodedPublicKey, EncodedSecretKey, StealthMetaAddress};

use crate::curve::CurveAdapter;

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// `(secret, public)` with `public = secret · G`.
pub struct KeyPair<C: CurveAdapter> {
    secret: C::Scalar,
    public: C::Point,
}

impl<C: CurveAdapter> KeyPair<C> {
    /// Generates a key pair from the given CSPRNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        Self::from_secret(C::random_scalar(rng))
    }

    /// Builds the pair for an existing secret scalar.
    pub fn from_secret(secret: C::Scalar) -> Result<Self> {
        let public = C::generator_multiply(&secret)?;
        Ok(Self { secret, public })
    }

    /// Imports a secret from its canonical encoding.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_secret(C::scalar_from_bytes(bytes)?)
    }

    /// Pairs a secret with a public point without checking them.
    ///
    /// Use [`validate_keypair`] before trusting the result.
    pub fn from_parts(secret: C::Scalar, public: C::Point) -> Self {
        Self { secret, public }
    }

    /// The secret scalar.
    pub fn secret(&self) -> &C::Scalar {
        &self.secret
    }

    /// The public point.
    pub fn public(&self) -> &C::Point {
        &self.public
    }

    /// Canonical public key encoding.
    pub fn encoded_public(&self) -> Result<EncodedPublicKey> {
        encode_public_key::<C>(&self.public)
    }

    /// Canonical secret key encoding, for key files.
    pub fn encoded_secret(&self) -> Result<EncodedSecretKey> {
        EncodedSecretKey::from_bytes(&C::scalar_to_bytes(&self.secret))
    }

    /// Address of the public point.
    pub fn address(&self) -> Address {
        C::point_to_address(&self.public)
    }
}

impl<C: CurveAdapter> Clone for KeyPair<C> {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret,
            public: self.public,
        }
    }
}

impl<C: CurveAdapter> Drop for KeyPair<C> {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl<C: CurveAdapter> std::fmt::Debug for KeyPair<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &C::NAME)
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EPHEMERAL KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// Single-use sender key pair.
///
/// Not `Clone`: the generator takes it by value, so one ephemeral key can
/// back at most one announcement.
pub struct EphemeralKeyPair<C: CurveAdapter> {
    inner: KeyPair<C>,
}

impl<C: CurveAdapter> EphemeralKeyPair<C> {
    /// Draws a fresh ephemeral key from the given CSPRNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        Ok(Self {
            inner: KeyPair::generate(rng)?,
        })
    }

    /// Draws a fresh ephemeral key from the operating system.
    pub fn random() -> Result<Self> {
        Self::generate(&mut OsRng)
    }

    /// Wraps a known scalar (test fixtures).
    pub fn from_secret(secret: C::Scalar) -> Result<Self> {
        Ok(Self {
            inner: KeyPair::from_secret(secret)?,
        })
    }

    /// The ephemeral secret scalar.
    pub fn secret(&self) -> &C::Scalar {
        self.inner.secret()
    }

    /// The ephemeral public point.
    pub fn public(&self) -> &C::Point {
        self.inner.public()
    }
}

impl<C: CurveAdapter> std::fmt::Debug for EphemeralKeyPair<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EphemeralKeyPair({:?})", self.inner.public)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECIPIENT KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// A recipient's spending and viewing key pairs.
pub struct RecipientKeys<C: CurveAdapter> {
    spending: KeyPair<C>,
    viewing: KeyPair<C>,
}

impl<C: CurveAdapter> RecipientKeys<C> {
    /// Generates both pairs independently.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        Ok(Self {
            spending: KeyPair::generate(rng)?,
            viewing: KeyPair::generate(rng)?,
        })
    }

    /// Combines existing pairs.
    pub fn from_pairs(spending: KeyPair<C>, viewing: KeyPair<C>) -> Self {
        Self { spending, viewing }
    }

    /// Imports both secrets from their canonical encodings.
    pub fn from_secret_bytes(spending: &[u8], viewing: &[u8]) -> Result<Self> {
        Ok(Self {
            spending: KeyPair::from_secret_bytes(spending)?,
            viewing: KeyPair::from_secret_bytes(viewing)?,
        })
    }

    /// Spending key pair.
    pub fn spending(&self) -> &KeyPair<C> {
        &self.spending
    }

    /// Viewing key pair.
    pub fn viewing(&self) -> &KeyPair<C> {
        &self.viewing
    }

    /// The meta-address to publish.
    pub fn meta_address(&self, scheme_id: u64) -> Result<StealthMetaAddress> {
        Ok(StealthMetaAddress::with_scheme(
            scheme_id,
            self.spending.encoded_public()?,
            self.viewing.encoded_public()?,
        ))
    }

    /// View-only capability for delegated scanning.
    pub fn viewing_key(&self) -> ViewingKey<C> {
        ViewingKey::from_parts(*self.viewing.secret(), *self.spending.public())
    }
}

impl<C: CurveAdapter> std::fmt::Debug for RecipientKeys<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipientKeys")
            .field("spending", &self.spending)
            .field("viewing", &self.viewing)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEWING KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Viewing secret plus spending public key.
///
/// Enough to recognise announcements and compute stealth public points, but
/// not to recover any stealth private key.
pub struct ViewingKey<C: CurveAdapter> {
    viewing_secret: C::Scalar,
    spending_public: C::Point,
}

impl<C: CurveAdapter> ViewingKey<C> {
    /// Builds a viewing key from its parts.
    pub fn from_parts(viewing_secret: C::Scalar, spending_public: C::Point) -> Self {
        Self {
            viewing_secret,
            spending_public,
        }
    }

    /// Imports the viewing secret and the encoded spending public key.
    pub fn from_bytes(viewing_secret: &[u8], spending_public: &[u8]) -> Result<Self> {
        Ok(Self::from_parts(
            C::scalar_from_bytes(viewing_secret)?,
            decode_public_key::<C>(spending_public)?,
        ))
    }

    /// The viewing secret scalar.
    pub fn viewing_secret(&self) -> &C::Scalar {
        &self.viewing_secret
    }

    /// The spending public point.
    pub fn spending_public(&self) -> &C::Point {
        &self.spending_public
    }
}

impl<C: CurveAdapter> Drop for ViewingKey<C> {
    fn drop(&mut self) {
        self.viewing_secret.zeroize();
    }
}

impl<C: CurveAdapter> std::fmt::Debug for ViewingKey<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ViewingKey([REDACTED], {:?})", self.spending_public)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FREE FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Generates a key pair from the operating system CSPRNG.
pub fn generate_keypair<C: CurveAdapter>() -> Result<KeyPair<C>> {
    KeyPair::generate(&mut OsRng)
}

/// Canonical encoding of a public point.
pub fn encode_public_key<C: CurveAdapter>(point: &C::Point) -> Result<EncodedPublicKey> {
    EncodedPublicKey::from_bytes(&C::encode_point(point))
}

/// Decodes a public key.
///
/// Wrong length, bad prefix and off-curve points all fail with `MalformedKey`.
pub fn decode_public_key<C: CurveAdapter>(bytes: &[u8]) -> Result<C::Point> {
    C::decode_point(bytes).map_err(|e| match e {
        ShadeError::InvalidPoint(msg) => ShadeError::MalformedKey(msg),
        other => other,
    })
}

/// Checks `public == secret · G`.
pub fn validate_keypair<C: CurveAdapter>(pair: &KeyPair<C>) -> bool {
    match C::generator_multiply(pair.secret()) {
        Ok(expected) => expected == *pair.public(),
        Err(_) => false,
    }
}
