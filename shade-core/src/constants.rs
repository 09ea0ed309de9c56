//! Protocol constants for SHADE.
//!
//! Sizes for the reference suite (secp256k1 + Keccak256) and the fixed
//! offsets of the announcement wire format.

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEME IDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Scheme id of the secp256k1 / Keccak256 suite with 12-byte view tags.
pub const SCHEME_ID_SECP256K1: u64 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a secp256k1 scalar (private key) in bytes.
pub const SECP256K1_SCALAR_SIZE: usize = 32;

/// Size of a compressed SEC1 secp256k1 point in bytes.
/// This is the canonical public key encoding and the shared-secret encoding
/// fed to the hash adapter.
pub const SECP256K1_COMPRESSED_POINT_SIZE: usize = 33;

/// Size of an uncompressed SEC1 secp256k1 point in bytes.
pub const SECP256K1_UNCOMPRESSED_POINT_SIZE: usize = 65;

/// Largest public key encoding accepted anywhere (uncompressed SEC1).
pub const MAX_PUBLIC_KEY_SIZE: usize = SECP256K1_UNCOMPRESSED_POINT_SIZE;

// ═══════════════════════════════════════════════════════════════════════════════
// HASH / VIEW TAG
// ═══════════════════════════════════════════════════════════════════════════════

/// Output width of the hash adapter.
pub const DIGEST_SIZE: usize = 32;

/// Size of the view tag in bytes (most-significant bytes of the secret hash).
pub const VIEW_TAG_SIZE: usize = 12;

/// Probability that an unrelated announcement passes the view tag filter,
/// expressed as a base-2 exponent: 2^-96.
pub const VIEW_TAG_FALSE_POSITIVE_BITS: u32 = (VIEW_TAG_SIZE as u32) * 8;

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESSES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of an address in bytes (20 bytes = 160 bits).
pub const ADDRESS_SIZE: usize = 20;

/// Size of the packed `stealthAddress || viewTag` slot.
pub const PACKED_RECIPIENT_SIZE: usize = ADDRESS_SIZE + VIEW_TAG_SIZE;

/// Text prefix of an encoded stealth meta-address.
pub const META_ADDRESS_PREFIX: &str = "st:eth:0x";

// ═══════════════════════════════════════════════════════════════════════════════
// METADATA CONVENTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of the asset identifier at the start of transfer metadata.
pub const METADATA_ASSET_SIZE: usize = 20;

/// Size of the amount / token id field that follows the asset identifier.
pub const METADATA_AMOUNT_SIZE: usize = 32;

/// Length of metadata following the asset-transfer convention.
pub const METADATA_TRANSFER_SIZE: usize = METADATA_ASSET_SIZE + METADATA_AMOUNT_SIZE;

/// Upper bound on metadata accepted in a single announcement.
pub const MAX_METADATA_SIZE: usize = 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Current wire format version of announcement records.
pub const PROTOCOL_VERSION: u8 = 1;

/// Fixed header of an announcement record:
/// version (1) || scheme_id (8) || packed slot (32) || ephemeral key length (2).
pub const ANNOUNCEMENT_HEADER_SIZE: usize = 1 + 8 + PACKED_RECIPIENT_SIZE + 2;

// ═══════════════════════════════════════════════════════════════════════════════
// PERFORMANCE TUNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Default batch size when paging through an announcement log.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 1000;

/// Maximum announcements fetched from a log in a single page.
pub const MAX_SCAN_BATCH_SIZE: usize = 10_000;
