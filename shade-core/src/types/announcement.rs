//! Announcement types for the SHADE announcement log.
//!
//! Announcements are published by senders and carry everything a recipient
//! needs to recognise a stealth transfer: the ephemeral public key, the
//! stealth address and its view tag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Address, EncodedPublicKey};
use crate::constants::{
    ADDRESS_SIZE, ANNOUNCEMENT_HEADER_SIZE, MAX_METADATA_SIZE, MAX_PUBLIC_KEY_SIZE,
    METADATA_AMOUNT_SIZE, METADATA_ASSET_SIZE, METADATA_TRANSFER_SIZE, PACKED_RECIPIENT_SIZE,
    PROTOCOL_VERSION, SCHEME_ID_SECP256K1, VIEW_TAG_SIZE,
};
use crate::error::{Result, ShadeError};

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW TAG
// ═══════════════════════════════════════════════════════════════════════════════

/// The first 12 bytes of the hashed shared secret.
///
/// Public and low-entropy on purpose: it only lets a recipient reject
/// announcements that are not theirs without doing the full derivation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewTag([u8; VIEW_TAG_SIZE]);

impl ViewTag {
    /// Creates from a fixed-size array.
    pub const fn from_array(bytes: [u8; VIEW_TAG_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates from a slice of exactly [`VIEW_TAG_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; VIEW_TAG_SIZE] = bytes.try_into().map_err(|_| {
            ShadeError::InvalidAnnouncement(format!(
                "view tag must be {} bytes, got {}",
                VIEW_TAG_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; VIEW_TAG_SIZE] {
        &self.0
    }

    /// Returns the hex-encoded tag.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses from hex (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Self::from_slice(&hex::decode(s)?)
    }
}

impl std::fmt::Debug for ViewTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ViewTag({})", self.to_hex())
    }
}

impl Serialize for ViewTag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ViewTag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PACKED SLOT
// ═══════════════════════════════════════════════════════════════════════════════

/// Packs `stealthAddress || viewTag` into the single 32-byte log slot.
pub fn pack_recipient_and_view_tag(
    address: &Address,
    view_tag: &ViewTag,
) -> [u8; PACKED_RECIPIENT_SIZE] {
    let mut slot = [0u8; PACKED_RECIPIENT_SIZE];
    slot[..ADDRESS_SIZE].copy_from_slice(address.as_bytes());
    slot[ADDRESS_SIZE..].copy_from_slice(view_tag.as_bytes());
    slot
}

/// Splits a 32-byte log slot back into address (bytes 0..20) and view tag (20..32).
pub fn unpack_recipient_and_view_tag(slot: &[u8]) -> Result<(Address, ViewTag)> {
    if slot.len() != PACKED_RECIPIENT_SIZE {
        return Err(ShadeError::InvalidAnnouncement(format!(
            "packed slot must be {} bytes, got {}",
            PACKED_RECIPIENT_SIZE,
            slot.len()
        )));
    }
    let (address, view_tag) = slot.split_at(ADDRESS_SIZE);
    Ok((Address::from_bytes(address)?, ViewTag::from_slice(view_tag)?))
}

// ═══════════════════════════════════════════════════════════════════════════════
// METADATA
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque announcement metadata.
///
/// The core never interprets it. When it follows the asset-transfer
/// convention the first 20 bytes identify the asset and the next 32 bytes hold
/// the amount or token id.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Metadata(Vec<u8>);

impl Metadata {
    /// Wraps raw metadata bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > MAX_METADATA_SIZE {
            return Err(ShadeError::InvalidAnnouncement(format!(
                "metadata too large: {} bytes, maximum {}",
                bytes.len(),
                MAX_METADATA_SIZE
            )));
        }
        Ok(Self(bytes))
    }

    /// Empty metadata.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds metadata following the asset-transfer convention.
    pub fn asset_transfer(asset: &Address, amount: [u8; METADATA_AMOUNT_SIZE]) -> Self {
        let mut bytes = Vec::with_capacity(METADATA_TRANSFER_SIZE);
        bytes.extend_from_slice(asset.as_bytes());
        bytes.extend_from_slice(&amount);
        Self(bytes)
    }

    /// Builds asset-transfer metadata with a `u128` amount (big-endian, left padded).
    pub fn asset_transfer_u128(asset: &Address, amount: u128) -> Self {
        let mut word = [0u8; METADATA_AMOUNT_SIZE];
        word[METADATA_AMOUNT_SIZE - 16..].copy_from_slice(&amount.to_be_bytes());
        Self::asset_transfer(asset, word)
    }

    /// Asset identifier, if the metadata is long enough to carry one.
    pub fn asset(&self) -> Option<Address> {
        self.0
            .get(..METADATA_ASSET_SIZE)
            .and_then(|b| Address::from_bytes(b).ok())
    }

    /// Amount / token id word, if present.
    pub fn amount(&self) -> Option<[u8; METADATA_AMOUNT_SIZE]> {
        self.0
            .get(METADATA_ASSET_SIZE..METADATA_TRANSFER_SIZE)
            .and_then(|b| b.try_into().ok())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no metadata is attached.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metadata({})", hex::encode(&self.0))
    }
}

impl Serialize for Metadata {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::new(bytes).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOUNCEMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// An announcement appended to the log by a sender.
///
/// # Wire Format (binary)
/// ```text
/// version (1) || scheme_id (8, BE) || stealth_address (20) || view_tag (12)
///   || eph_len (2, BE) || ephemeral_public_key || meta_len (4, BE) || metadata
/// ```
/// `stealth_address || view_tag` is the packed 32-byte slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Curve/hash suite the announcement was generated with
    pub scheme_id: u64,
    /// Sender's single-use ephemeral public key
    pub ephemeral_public_key: EncodedPublicKey,
    /// The one-time stealth address
    pub stealth_address: Address,
    /// Prefix of the hashed shared secret
    pub view_tag: ViewTag,
    /// Opaque metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl Announcement {
    /// Creates an announcement for the reference scheme without metadata.
    pub fn new(
        ephemeral_public_key: EncodedPublicKey,
        stealth_address: Address,
        view_tag: ViewTag,
    ) -> Self {
        Self {
            scheme_id: SCHEME_ID_SECP256K1,
            ephemeral_public_key,
            stealth_address,
            view_tag,
            metadata: Metadata::empty(),
        }
    }

    /// Attaches metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the packed `stealthAddress || viewTag` slot.
    pub fn packed_recipient(&self) -> [u8; PACKED_RECIPIENT_SIZE] {
        pack_recipient_and_view_tag(&self.stealth_address, &self.view_tag)
    }

    /// Validates structure. Curve validity of the ephemeral key is not checked here.
    pub fn validate(&self) -> Result<()> {
        if self.ephemeral_public_key.len() > MAX_PUBLIC_KEY_SIZE {
            return Err(ShadeError::InvalidAnnouncement(format!(
                "ephemeral key too large: {} bytes",
                self.ephemeral_public_key.len()
            )));
        }

        if self.ephemeral_public_key.is_all_zero() {
            return Err(ShadeError::InvalidAnnouncement(
                "ephemeral key is all zeros".into(),
            ));
        }

        if self.metadata.len() > MAX_METADATA_SIZE {
            return Err(ShadeError::InvalidAnnouncement(format!(
                "metadata too large: {} bytes",
                self.metadata.len()
            )));
        }

        Ok(())
    }

    /// Serializes to the binary wire record.
    pub fn to_bytes(&self) -> Vec<u8> {
        let eph = self.ephemeral_public_key.as_bytes();
        let meta = self.metadata.as_bytes();

        let mut bytes = Vec::with_capacity(ANNOUNCEMENT_HEADER_SIZE + eph.len() + 4 + meta.len());
        bytes.push(PROTOCOL_VERSION);
        bytes.extend_from_slice(&self.scheme_id.to_be_bytes());
        bytes.extend_from_slice(&self.packed_recipient());
        bytes.extend_from_slice(&(eph.len() as u16).to_be_bytes());
        bytes.extend_from_slice(eph);
        bytes.extend_from_slice(&(meta.len() as u32).to_be_bytes());
        bytes.extend_from_slice(meta);
        bytes
    }

    /// Deserializes from the binary wire record.
    ///
    /// Every length is checked explicitly; trailing bytes are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new(bytes);

        let version = reader.take(1)?[0];
        if version != PROTOCOL_VERSION {
            return Err(ShadeError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        let scheme_id = u64::from_be_bytes(reader.take_array::<8>()?);
        let (stealth_address, view_tag) =
            unpack_recipient_and_view_tag(reader.take(PACKED_RECIPIENT_SIZE)?)?;

        let eph_len = u16::from_be_bytes(reader.take_array::<2>()?) as usize;
        let ephemeral_public_key = EncodedPublicKey::from_bytes(reader.take(eph_len)?)?;

        let meta_len = u32::from_be_bytes(reader.take_array::<4>()?) as usize;
        if meta_len > MAX_METADATA_SIZE {
            return Err(ShadeError::InvalidAnnouncement(format!(
                "metadata too large: {} bytes",
                meta_len
            )));
        }
        let metadata = Metadata::new(reader.take(meta_len)?.to_vec())?;

        reader.finish()?;

        let announcement = Self {
            scheme_id,
            ephemeral_public_key,
            stealth_address,
            view_tag,
            metadata,
        };
        announcement.validate()?;
        Ok(announcement)
    }
}

/// Cursor over a wire record that fails instead of panicking on short input.
struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ShadeError::InvalidAnnouncement(format!(
                "truncated record: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.bytes.len() - self.pos
            ))),
        }
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.take(N)?;
        slice
            .try_into()
            .map_err(|_| ShadeError::InternalError("slice length mismatch".into()))
    }

    fn finish(self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(ShadeError::InvalidAnnouncement(format!(
                "{} trailing bytes",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}

/// Builder for announcements with optional fields.
#[derive(Default)]
pub struct AnnouncementBuilder {
    scheme_id: Option<u64>,
    ephemeral_public_key: Option<EncodedPublicKey>,
    stealth_address: Option<Address>,
    view_tag: Option<ViewTag>,
    metadata: Option<Metadata>,
}

impl AnnouncementBuilder {
    /// Creates a new announcement builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scheme id (optional, defaults to secp256k1).
    pub fn scheme_id(mut self, scheme_id: u64) -> Self {
        self.scheme_id = Some(scheme_id);
        self
    }

    /// Sets the ephemeral public key (required).
    pub fn ephemeral_public_key(mut self, key: EncodedPublicKey) -> Self {
        self.ephemeral_public_key = Some(key);
        self
    }

    /// Sets the stealth address (required).
    pub fn stealth_address(mut self, address: Address) -> Self {
        self.stealth_address = Some(address);
        self
    }

    /// Sets the view tag (required).
    pub fn view_tag(mut self, tag: ViewTag) -> Self {
        self.view_tag = Some(tag);
        self
    }

    /// Sets the metadata (optional).
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Builds the announcement.
    pub fn build(self) -> Result<Announcement> {
        let ephemeral_public_key = self.ephemeral_public_key.ok_or_else(|| {
            ShadeError::ValidationError("ephemeral_public_key is required".into())
        })?;
        let stealth_address = self
            .stealth_address
            .ok_or_else(|| ShadeError::ValidationError("stealth_address is required".into()))?;
        let view_tag = self
            .view_tag
            .ok_or_else(|| ShadeError::ValidationError("view_tag is required".into()))?;

        let announcement = Announcement {
            scheme_id: self.scheme_id.unwrap_or(SCHEME_ID_SECP256K1),
            ephemeral_public_key,
            stealth_address,
            view_tag,
            metadata: self.metadata.unwrap_or_default(),
        };

        announcement.validate()?;
        Ok(announcement)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG ENTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// An announcement as stored in an announcement log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log, starting at zero
    pub offset: u64,
    /// Account that appended the entry, if the log records it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Address>,
    /// Unix timestamp (seconds) at which the entry was appended
    pub timestamp: u64,
    /// The announcement itself
    pub announcement: Announcement,
}

/// Statistics about the entries of a log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnnouncementStats {
    /// Total number of entries
    pub total_count: u64,
    /// Entries per scheme id
    pub scheme_counts: BTreeMap<u64, u64>,
    /// Entries carrying metadata
    pub with_metadata_count: u64,
    /// Earliest entry timestamp
    pub earliest_timestamp: Option<u64>,
    /// Latest entry timestamp
    pub latest_timestamp: Option<u64>,
}

impl AnnouncementStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates stats with a log entry.
    pub fn add(&mut self, entry: &LogEntry) {
        self.total_count += 1;
        *self
            .scheme_counts
            .entry(entry.announcement.scheme_id)
            .or_insert(0) += 1;

        if !entry.announcement.metadata.is_empty() {
            self.with_metadata_count += 1;
        }

        self.earliest_timestamp = Some(
            self.earliest_timestamp
                .map_or(entry.timestamp, |t| t.min(entry.timestamp)),
        );
        self.latest_timestamp = Some(
            self.latest_timestamp
                .map_or(entry.timestamp, |t| t.max(entry.timestamp)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral_key() -> EncodedPublicKey {
        let mut bytes = [0x42u8; 33];
        bytes[0] = 0x03;
        EncodedPublicKey::from_bytes(&bytes).unwrap()
    }

    fn sample() -> Announcement {
        Announcement::new(
            ephemeral_key(),
            Address::from_array([0xAA; 20]),
            ViewTag::from_array([0xBB; 12]),
        )
    }

    #[test]
    fn test_pack_layout() {
        let address = Address::from_array([0x11; 20]);
        let tag = ViewTag::from_array([0x22; 12]);
        let slot = pack_recipient_and_view_tag(&address, &tag);

        assert_eq!(&slot[..20], &[0x11; 20]);
        assert_eq!(&slot[20..], &[0x22; 12]);

        let (a, t) = unpack_recipient_and_view_tag(&slot).unwrap();
        assert_eq!(a, address);
        assert_eq!(t, tag);
    }

    #[test]
    fn test_unpack_wrong_length() {
        assert!(unpack_recipient_and_view_tag(&[0u8; 31]).is_err());
        assert!(unpack_recipient_and_view_tag(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_view_tag_from_slice() {
        assert!(ViewTag::from_slice(&[0u8; 12]).is_ok());
        assert!(matches!(
            ViewTag::from_slice(&[0u8; 11]),
            Err(ShadeError::InvalidAnnouncement(_))
        ));
    }

    #[test]
    fn test_metadata_convention() {
        let asset = Address::from_array([0xEE; 20]);
        let meta = Metadata::asset_transfer_u128(&asset, 1_000);

        assert_eq!(meta.len(), METADATA_TRANSFER_SIZE);
        assert_eq!(meta.asset(), Some(asset));

        let amount = meta.amount().unwrap();
        assert_eq!(&amount[..16], &[0u8; 16]);
        assert_eq!(u128::from_be_bytes(amount[16..].try_into().unwrap()), 1_000);
    }

    #[test]
    fn test_metadata_short_has_no_fields() {
        let meta = Metadata::new(vec![1, 2, 3]).unwrap();
        assert!(meta.asset().is_none());
        assert!(meta.amount().is_none());
    }

    #[test]
    fn test_metadata_too_large() {
        assert!(Metadata::new(vec![0u8; MAX_METADATA_SIZE + 1]).is_err());
    }

    #[test]
    fn test_announcement_bytes_roundtrip() {
        let ann = sample().with_metadata(Metadata::new(vec![7u8; 52]).unwrap());
        let bytes = ann.to_bytes();

        assert_eq!(bytes[0], PROTOCOL_VERSION);
        assert_eq!(&bytes[9..41], &ann.packed_recipient());

        let ann2 = Announcement::from_bytes(&bytes).unwrap();
        assert_eq!(ann, ann2);
    }

    #[test]
    fn test_announcement_truncated() {
        let bytes = sample().to_bytes();
        for len in [0, 1, 9, 41, 43, bytes.len() - 1] {
            assert!(
                Announcement::from_bytes(&bytes[..len]).is_err(),
                "accepted truncated record of {} bytes",
                len
            );
        }
    }

    #[test]
    fn test_announcement_trailing_bytes() {
        let mut bytes = sample().to_bytes();
        bytes.push(0);
        assert!(Announcement::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_announcement_version_mismatch() {
        let mut bytes = sample().to_bytes();
        bytes[0] = 99;
        assert!(matches!(
            Announcement::from_bytes(&bytes),
            Err(ShadeError::VersionMismatch { actual: 99, .. })
        ));
    }

    #[test]
    fn test_announcement_validation() {
        assert!(sample().validate().is_ok());

        let mut zero_key = sample();
        zero_key.ephemeral_public_key = EncodedPublicKey::from_bytes(&[0u8; 33]).unwrap();
        assert!(zero_key.validate().is_err());
    }

    #[test]
    fn test_announcement_builder() {
        let ann = AnnouncementBuilder::new()
            .ephemeral_public_key(ephemeral_key())
            .stealth_address(Address::from_array([1; 20]))
            .view_tag(ViewTag::from_array([2; 12]))
            .scheme_id(7)
            .build()
            .unwrap();

        assert_eq!(ann.scheme_id, 7);
        assert!(ann.metadata.is_empty());
    }

    #[test]
    fn test_announcement_builder_missing_required() {
        let result = AnnouncementBuilder::new()
            .stealth_address(Address::zero())
            .view_tag(ViewTag::from_array([0; 12]))
            .build();
        assert!(result.is_err());

        let result = AnnouncementBuilder::new()
            .ephemeral_public_key(ephemeral_key())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_announcement_json() {
        let ann = sample();
        let json = serde_json::to_string(&ann).unwrap();
        assert!(json.contains("bbbbbbbbbbbbbbbbbbbbbbbb"));
        let ann2: Announcement = serde_json::from_str(&json).unwrap();
        assert_eq!(ann, ann2);
    }

    #[test]
    fn test_announcement_json_oversized_key_rejected() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["ephemeral_public_key"] = serde_json::Value::String("03".repeat(70_000));
        assert!(serde_json::from_value::<Announcement>(value.clone()).is_err());

        // Largest accepted key still survives the wire record
        value["ephemeral_public_key"] = serde_json::Value::String("04".repeat(MAX_PUBLIC_KEY_SIZE));
        let ann: Announcement = serde_json::from_value(value).unwrap();
        assert_eq!(Announcement::from_bytes(&ann.to_bytes()).unwrap(), ann);
    }

    #[test]
    fn test_announcement_stats() {
        let mut stats = AnnouncementStats::new();
        for (offset, ts) in [(0u64, 100u64), (1, 50), (2, 300)] {
            stats.add(&LogEntry {
                offset,
                caller: None,
                timestamp: ts,
                announcement: sample(),
            });
        }

        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.scheme_counts.get(&SCHEME_ID_SECP256K1), Some(&3));
        assert_eq!(stats.earliest_timestamp, Some(50));
        assert_eq!(stats.latest_timestamp, Some(300));
        assert_eq!(stats.with_metadata_count, 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_decode_never_panics(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..200)) {
            if let Ok(announcement) = Announcement::from_bytes(&bytes) {
                proptest::prop_assert_eq!(announcement.to_bytes(), bytes);
            }
        }

        #[test]
        fn prop_unpack_accepts_only_one_word(len in 0usize..64) {
            let slot = vec![0xABu8; len];
            proptest::prop_assert_eq!(
                unpack_recipient_and_view_tag(&slot).is_ok(),
                len == PACKED_RECIPIENT_SIZE
            );
        }
    }
}
