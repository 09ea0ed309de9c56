//! Stealth address generation (sender side).

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shade_core::error::{Result, ShadeError};
use shade_core::types::{
    Address, Announcement, EncodedPublicKey, Metadata, StealthMetaAddress, ViewTag,
};
use shade_crypto::derive::{derive_stealth_public, hash_shared_secret, sender_shared_secret};
use shade_crypto::{decode_public_key, encode_public_key, CurveAdapter, DefaultSuite};
use shade_crypto::{EphemeralKeyPair, StealthSuite};

type Point<S> = <<S as StealthSuite>::Curve as CurveAdapter>::Point;

/// Output of the generator: where to send, and what to announce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStealthAddress {
    /// The one-time address
    pub stealth_address: Address,
    /// Ephemeral public key the recipient needs to recompute the shared secret
    pub ephemeral_public_key: EncodedPublicKey,
    /// First 12 bytes of the secret hash
    pub view_tag: ViewTag,
}

impl GeneratedStealthAddress {
    /// Wraps the output into an announcement.
    pub fn into_announcement(self, scheme_id: u64, metadata: Metadata) -> Announcement {
        Announcement {
            scheme_id,
            ephemeral_public_key: self.ephemeral_public_key,
            stealth_address: self.stealth_address,
            view_tag: self.view_tag,
            metadata,
        }
    }
}

/// Derives a stealth address for a recipient's public keys.
///
/// The ephemeral key pair is consumed: its secret is zeroized when this call
/// returns. Deterministic for fixed inputs. A degenerate shared secret fails
/// with `SharedSecretDerivationFailed` and the caller must retry with a new
/// ephemeral key.
pub fn generate_stealth_address<S: StealthSuite>(
    spending_public: &Point<S>,
    viewing_public: &Point<S>,
    ephemeral: EphemeralKeyPair<S::Curve>,
) -> Result<GeneratedStealthAddress> {
    let shared = sender_shared_secret::<S::Curve>(ephemeral.secret(), viewing_public)?;
    let secret_hash = hash_shared_secret::<S>(&shared);
    let view_tag = secret_hash.view_tag();
    let (_, stealth_address) = derive_stealth_public::<S::Curve>(spending_public, &secret_hash)?;

    Ok(GeneratedStealthAddress {
        stealth_address,
        ephemeral_public_key: encode_public_key::<S::Curve>(ephemeral.public())?,
        view_tag,
    })
}

/// Decodes a meta-address into (spending, viewing) public points.
///
/// A meta-address for another scheme fails with `SchemeMismatch`; key
/// encoding problems fail with `MalformedKey`.
pub fn decode_meta_address<S: StealthSuite>(
    meta_address: &StealthMetaAddress,
) -> Result<(Point<S>, Point<S>)> {
    S::ensure_scheme(meta_address.scheme_id)?;
    meta_address.validate()?;

    let spending = decode_public_key::<S::Curve>(meta_address.spending_public_key.as_bytes())?;
    let viewing = decode_public_key::<S::Curve>(meta_address.viewing_public_key.as_bytes())?;
    Ok((spending, viewing))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Stealth payment: address to send to and announcement to publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPayment {
    /// The one-time address to send funds to
    pub stealth_address: Address,
    /// The announcement to append to the log
    pub announcement: Announcement,
}

/// Creates a stealth payment for a meta-address with a fresh ephemeral key.
pub fn create_stealth_payment(meta_address: &StealthMetaAddress) -> Result<StealthPayment> {
    StealthPaymentBuilder::new().recipient(meta_address.clone()).build()
}

/// Creates a stealth payment drawing the ephemeral key from `rng`.
pub fn create_stealth_payment_with_rng<S: StealthSuite, R: RngCore + CryptoRng>(
    meta_address: &StealthMetaAddress,
    metadata: Metadata,
    rng: &mut R,
) -> Result<StealthPayment> {
    let (spending, viewing) = decode_meta_address::<S>(meta_address)?;
    let ephemeral = EphemeralKeyPair::<S::Curve>::generate(rng)?;

    let generated = generate_stealth_address::<S>(&spending, &viewing, ephemeral)?;
    let stealth_address = generated.stealth_address;
    let announcement = generated.into_announcement(S::SCHEME_ID, metadata);
    announcement.validate()?;

    debug!(
        suite = %S::describe(),
        stealth_address = %stealth_address,
        "created stealth payment"
    );

    Ok(StealthPayment {
        stealth_address,
        announcement,
    })
}

/// Builder for stealth payments with optional metadata.
#[derive(Default)]
pub struct StealthPaymentBuilder {
    meta_address: Option<StealthMetaAddress>,
    metadata: Option<Metadata>,
}

impl StealthPaymentBuilder {
    /// Creates a new payment builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipient meta-address (required).
    pub fn recipient(mut self, meta_address: StealthMetaAddress) -> Self {
        self.meta_address = Some(meta_address);
        self
    }

    /// Attaches opaque metadata.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attaches asset-transfer metadata (asset id + amount).
    pub fn asset_transfer(mut self, asset: Address, amount: u128) -> Self {
        self.metadata = Some(Metadata::asset_transfer_u128(&asset, amount));
        self
    }

    /// Builds the payment with the default suite.
    pub fn build(self) -> Result<StealthPayment> {
        self.build_with_suite::<DefaultSuite>()
    }

    /// Builds the payment with an explicit suite.
    pub fn build_with_suite<S: StealthSuite>(self) -> Result<StealthPayment> {
        let meta_address = self.meta_address.ok_or_else(|| {
            ShadeError::ValidationError("recipient meta-address is required".into())
        })?;
        create_stealth_payment_with_rng::<S, _>(
            &meta_address,
            self.metadata.unwrap_or_default(),
            &mut OsRng,
        )
    }
}
