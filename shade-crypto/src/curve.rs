//! Curve adapter.
//!
//! Everything the protocol needs from a cyclic group sits behind
//! [`CurveAdapter`], so the derivation code never touches a concrete curve
//! library. [`Secp256k1`] is the reference implementation on top of `k256`.
//!
//! ## Invariants
//!
//! - Scalars produced or accepted by the adapter are never zero
//! - Points produced or accepted by the adapter are never the identity
//!
//! Both are enforced at every entry point, so a value of `Scalar` or `Point`
//! obtained through the adapter is always usable.

use k256::elliptic_curve::bigint::U256;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use shade_core::constants::{
    ADDRESS_SIZE, DIGEST_SIZE, SECP256K1_COMPRESSED_POINT_SIZE, SECP256K1_SCALAR_SIZE,
    SECP256K1_UNCOMPRESSED_POINT_SIZE,
};
use shade_core::error::{Result, ShadeError};
use shade_core::types::Address;

use crate::hash::keccak256;

// ═══════════════════════════════════════════════════════════════════════════════
// ADAPTER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Operations over a prime-order group used by the stealth protocol.
pub trait CurveAdapter: Send + Sync + 'static {
    /// Element of the scalar field.
    type Scalar: Copy + Zeroize + Send + Sync;
    /// Group element.
    type Point: Copy + PartialEq + std::fmt::Debug + Send + Sync;

    /// Human readable curve name.
    const NAME: &'static str;
    /// Length of a canonical scalar encoding.
    const SCALAR_SIZE: usize;
    /// Length of a canonical (compressed) point encoding.
    const ENCODED_POINT_SIZE: usize;

    /// Uniformly random non-zero scalar.
    fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Self::Scalar;

    /// Parses a canonical scalar. Zero or out-of-range values fail with `InvalidScalar`.
    fn scalar_from_bytes(bytes: &[u8]) -> Result<Self::Scalar>;

    /// Canonical encoding of a scalar.
    fn scalar_to_bytes(scalar: &Self::Scalar) -> Zeroizing<Vec<u8>>;

    /// Reduces a full digest into the scalar field.
    fn scalar_from_digest(digest: &[u8; DIGEST_SIZE]) -> Result<Self::Scalar>;

    /// `a + b` in the scalar field.
    fn scalar_add(a: &Self::Scalar, b: &Self::Scalar) -> Result<Self::Scalar>;

    /// `scalar · G`.
    fn generator_multiply(scalar: &Self::Scalar) -> Result<Self::Point>;

    /// `scalar · point`.
    fn scalar_multiply(scalar: &Self::Scalar, point: &Self::Point) -> Result<Self::Point>;

    /// `p1 + p2`.
    fn point_add(p1: &Self::Point, p2: &Self::Point) -> Result<Self::Point>;

    /// Canonical (compressed) point encoding.
    fn encode_point(point: &Self::Point) -> Vec<u8>;

    /// Parses a point encoding. Off-curve or identity fails with `InvalidPoint`.
    fn decode_point(bytes: &[u8]) -> Result<Self::Point>;

    /// Deterministic, one-way address of a point.
    ///
    /// Address hashing belongs to the curve adapter and is fixed per curve; it
    /// never goes through the suite's [`SecretHasher`](crate::hash::SecretHasher).
    fn point_to_address(point: &Self::Point) -> Address;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1
// ═══════════════════════════════════════════════════════════════════════════════

/// secp256k1 via `k256`.
///
/// Points encode as 33-byte compressed SEC1. Addresses are Ethereum style:
/// `keccak256(uncompressed[1..])[12..]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1;

impl Secp256k1 {
    fn non_zero(scalar: Scalar, context: &str) -> Result<Scalar> {
        if scalar == Scalar::ZERO {
            return Err(ShadeError::InvalidScalar(format!("{context}: scalar is zero")));
        }
        Ok(scalar)
    }

    fn non_identity(point: ProjectivePoint, context: &str) -> Result<ProjectivePoint> {
        if point == ProjectivePoint::IDENTITY {
            return Err(ShadeError::InvalidPoint(format!(
                "{context}: result is the identity element"
            )));
        }
        Ok(point)
    }
}

impl CurveAdapter for Secp256k1 {
    type Scalar = Scalar;
    type Point = ProjectivePoint;

    const NAME: &'static str = "secp256k1";
    const SCALAR_SIZE: usize = SECP256K1_SCALAR_SIZE;
    const ENCODED_POINT_SIZE: usize = SECP256K1_COMPRESSED_POINT_SIZE;

    fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
        *NonZeroScalar::random(rng)
    }

    fn scalar_from_bytes(bytes: &[u8]) -> Result<Scalar> {
        let mut arr: [u8; SECP256K1_SCALAR_SIZE] = bytes.try_into().map_err(|_| {
            ShadeError::InvalidScalar(format!(
                "expected {} bytes, got {}",
                SECP256K1_SCALAR_SIZE,
                bytes.len()
            ))
        })?;
        let repr = FieldBytes::from(arr);
        arr.zeroize();

        let scalar: Option<Scalar> = Scalar::from_repr(repr).into();
        let scalar = scalar
            .ok_or_else(|| ShadeError::InvalidScalar("value exceeds the group order".into()))?;
        Self::non_zero(scalar, "decode")
    }

    fn scalar_to_bytes(scalar: &Scalar) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(scalar.to_bytes().to_vec())
    }

    fn scalar_from_digest(digest: &[u8; DIGEST_SIZE]) -> Result<Scalar> {
        let bytes = FieldBytes::from(*digest);
        let scalar = <Scalar as Reduce<U256>>::reduce_bytes(&bytes);
        Self::non_zero(scalar, "digest reduction")
    }

    fn scalar_add(a: &Scalar, b: &Scalar) -> Result<Scalar> {
        Self::non_zero(*a + *b, "addition")
    }

    fn generator_multiply(scalar: &Scalar) -> Result<ProjectivePoint> {
        let scalar = Self::non_zero(*scalar, "generator multiply")?;
        Self::non_identity(ProjectivePoint::GENERATOR * scalar, "generator multiply")
    }

    fn scalar_multiply(scalar: &Scalar, point: &ProjectivePoint) -> Result<ProjectivePoint> {
        let scalar = Self::non_zero(*scalar, "scalar multiply")?;
        Self::non_identity(*point * scalar, "scalar multiply")
    }

    fn point_add(p1: &ProjectivePoint, p2: &ProjectivePoint) -> Result<ProjectivePoint> {
        Self::non_identity(*p1 + *p2, "point addition")
    }

    fn encode_point(point: &ProjectivePoint) -> Vec<u8> {
        point.to_affine().to_encoded_point(true).as_bytes().to_vec()
    }

    fn decode_point(bytes: &[u8]) -> Result<ProjectivePoint> {
        if bytes.len() != SECP256K1_COMPRESSED_POINT_SIZE
            && bytes.len() != SECP256K1_UNCOMPRESSED_POINT_SIZE
        {
            return Err(ShadeError::InvalidPoint(format!(
                "expected {} or {} bytes, got {}",
                SECP256K1_COMPRESSED_POINT_SIZE,
                SECP256K1_UNCOMPRESSED_POINT_SIZE,
                bytes.len()
            )));
        }

        let encoded = EncodedPoint::from_bytes(bytes)
            .map_err(|e| ShadeError::InvalidPoint(format!("bad SEC1 encoding: {e}")))?;
        let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
        let affine = affine
            .ok_or_else(|| ShadeError::InvalidPoint("point is not on the curve".into()))?;

        Self::non_identity(ProjectivePoint::from(affine), "decode")
    }

    /// Ethereum address: last 20 bytes of Keccak256 over the uncompressed
    /// point without its `0x04` prefix. Independent of `S::Hasher`.
    fn point_to_address(point: &ProjectivePoint) -> Address {
        let uncompressed = point.to_affine().to_encoded_point(false);
        let hash = keccak256(&uncompressed.as_bytes()[1..]);

        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&hash[DIGEST_SIZE - ADDRESS_SIZE..]);
        Address::from_array(bytes)
    }
}
