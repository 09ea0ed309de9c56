//! In-memory key registry and announcement log.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use tracing::{debug, instrument};

use shade_core::error::{Result, ShadeError};
use shade_core::traits::{AnnouncementLog, KeyRegistry};
use shade_core::types::{Address, Announcement, AnnouncementStats, LogEntry, StealthMetaAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// KEY REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory key registry.
///
/// Keys are stored per `(registrant, scheme_id)`. A caller may write keys for
/// a registrant when it is the registrant itself or an approved delegate.
#[derive(Debug, Default)]
pub struct MemoryKeyRegistry {
    /// (registrant, scheme id) → meta-address
    keys: DashMap<(Address, u64), StealthMetaAddress>,
    /// (registrant, delegate) pairs allowed to write on the registrant's behalf
    delegates: DashSet<(Address, Address)>,
    /// Number of successful writes
    writes: AtomicU64,
}

impl MemoryKeyRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows `delegate` to register keys on behalf of `registrant`.
    pub fn approve_delegate(&self, registrant: &Address, delegate: &Address) {
        debug!(%registrant, %delegate, "approving delegate");
        self.delegates.insert((*registrant, *delegate));
    }

    /// Withdraws a delegate approval. Returns true if one existed.
    pub fn revoke_delegate(&self, registrant: &Address, delegate: &Address) -> bool {
        self.delegates.remove(&(*registrant, *delegate)).is_some()
    }

    /// True if `caller` may write keys for `registrant`.
    pub fn is_authorized(&self, caller: &Address, registrant: &Address) -> bool {
        caller == registrant || self.delegates.contains(&(*registrant, *caller))
    }

    /// Number of registered (registrant, scheme) entries.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl KeyRegistry for MemoryKeyRegistry {
    #[instrument(skip(self), fields(registrant = %registrant))]
    async fn get_public_keys(
        &self,
        registrant: &Address,
        scheme_id: u64,
    ) -> Result<Option<StealthMetaAddress>> {
        Ok(self
            .keys
            .get(&(*registrant, scheme_id))
            .map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self, meta_address), fields(caller = %caller, registrant = %registrant))]
    async fn set_public_keys(
        &self,
        caller: &Address,
        registrant: &Address,
        meta_address: StealthMetaAddress,
    ) -> Result<()> {
        if !self.is_authorized(caller, registrant) {
            return Err(ShadeError::AuthorizationFailed {
                caller: caller.to_hex_string(),
                registrant: registrant.to_hex_string(),
            });
        }

        // All-zero keys would be indistinguishable from "not registered"
        if meta_address.spending_public_key.is_all_zero()
            || meta_address.viewing_public_key.is_all_zero()
        {
            return Err(ShadeError::MalformedKey(
                "all-zero public key cannot be registered".into(),
            ));
        }
        meta_address.validate()?;

        debug!(scheme_id = meta_address.scheme_id, "registering keys");
        self.keys
            .insert((*registrant, meta_address.scheme_id), meta_address);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOUNCEMENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory append-only announcement log.
///
/// Offsets are assigned under the write lock, so they are dense and match
/// the position of each entry.
#[derive(Debug, Default)]
pub struct MemoryAnnouncementLog {
    entries: RwLock<Vec<LogEntry>>,
    stats: RwLock<AnnouncementStats>,
}

impl MemoryAnnouncementLog {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::with_capacity(capacity)),
            stats: RwLock::new(AnnouncementStats::new()),
        }
    }

    /// Appends with an explicit timestamp.
    pub fn append_at(
        &self,
        caller: Option<Address>,
        announcement: Announcement,
        timestamp: u64,
    ) -> Result<u64> {
        announcement.validate()?;

        let mut entries = self.entries.write();
        let offset = entries.len() as u64;
        let entry = LogEntry {
            offset,
            caller,
            timestamp,
            announcement,
        };

        self.stats.write().add(&entry);
        entries.push(entry);

        debug!(offset, "appended announcement");
        Ok(offset)
    }

    /// Lazily iterates entries from `offset`, one lock acquisition per entry.
    ///
    /// Entries appended while iterating are visited too.
    pub fn iter_from(&self, offset: u64) -> LogIter<'_> {
        LogIter { log: self, next: offset }
    }

    /// Returns a copy of a single entry.
    pub fn get(&self, offset: u64) -> Option<LogEntry> {
        let index = usize::try_from(offset).ok()?;
        self.entries.read().get(index).cloned()
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> AnnouncementStats {
        self.stats.read().clone()
    }

    /// Returns all entries (for export/backup).
    pub fn all_entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// Number of entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.read().len() as u64
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.stats.write() = AnnouncementStats::new();
    }

    /// Restores entries from a backup.
    ///
    /// Entries must continue the log: the first offset equals the current
    /// length and offsets are consecutive.
    pub fn import(&self, imported: Vec<LogEntry>) -> Result<usize> {
        let mut entries = self.entries.write();
        let mut stats = self.stats.write();
        let count = imported.len();

        for entry in imported {
            let expected = entries.len() as u64;
            if entry.offset != expected {
                return Err(ShadeError::LogError(format!(
                    "non-contiguous offset: expected {}, got {}",
                    expected, entry.offset
                )));
            }
            entry.announcement.validate()?;
            stats.add(&entry);
            entries.push(entry);
        }

        Ok(count)
    }
}

#[async_trait]
impl AnnouncementLog for MemoryAnnouncementLog {
    #[instrument(skip(self, announcement), fields(caller = %caller))]
    async fn append(&self, caller: &Address, announcement: Announcement) -> Result<u64> {
        let timestamp = Utc::now().timestamp().max(0) as u64;
        self.append_at(Some(*caller), announcement, timestamp)
    }

    #[instrument(skip(self))]
    async fn read_from(&self, offset: u64, limit: usize) -> Result<Vec<LogEntry>> {
        let entries = self.entries.read();
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(entries.len());
        let end = start.saturating_add(limit).min(entries.len());
        Ok(entries[start..end].to_vec())
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.entry_count())
    }
}

/// Lazy iterator over a [`MemoryAnnouncementLog`].
pub struct LogIter<'a> {
    log: &'a MemoryAnnouncementLog,
    next: u64,
}

impl Iterator for LogIter<'_> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        let entry = self.log.get(self.next)?;
        self.next += 1;
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shade_core::types::{EncodedPublicKey, Metadata, ViewTag};

    fn make_test_announcement(tag: u8) -> Announcement {
        let mut key = [tag; 33];
        key[0] = 0x02;
        Announcement::new(
            EncodedPublicKey::from_bytes(&key).unwrap(),
            Address::from_array([tag; 20]),
            ViewTag::from_array([tag; 12]),
        )
    }

    fn make_meta(tag: u8) -> StealthMetaAddress {
        let mut spend = [tag; 33];
        spend[0] = 0x02;
        let mut view = [tag.wrapping_add(1); 33];
        view[0] = 0x03;
        StealthMetaAddress::new(
            EncodedPublicKey::from_bytes(&spend).unwrap(),
            EncodedPublicKey::from_bytes(&view).unwrap(),
        )
    }

    fn account(n: u8) -> Address {
        Address::from_array([n; 20])
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = MemoryKeyRegistry::new();
        let alice = account(1);

        registry.set_public_keys(&alice, &alice, make_meta(7)).await.unwrap();

        let found = registry.get_public_keys(&alice, 1).await.unwrap();
        assert_eq!(found, Some(make_meta(7)));
        assert_eq!(registry.write_count(), 1);
    }

    #[tokio::test]
    async fn test_absent_is_none() {
        let registry = MemoryKeyRegistry::new();
        assert!(registry.get_public_keys(&account(1), 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_is_per_scheme() {
        let registry = MemoryKeyRegistry::new();
        let alice = account(1);
        registry.set_public_keys(&alice, &alice, make_meta(7)).await.unwrap();

        assert!(registry.get_public_keys(&alice, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_write_rejected() {
        let registry = MemoryKeyRegistry::new();
        let result = registry
            .set_public_keys(&account(2), &account(1), make_meta(7))
            .await;

        assert!(matches!(result, Err(ShadeError::AuthorizationFailed { .. })));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_delegate_write() {
        let registry = MemoryKeyRegistry::new();
        let (alice, relayer) = (account(1), account(9));

        registry.approve_delegate(&alice, &relayer);
        registry.set_public_keys(&relayer, &alice, make_meta(3)).await.unwrap();
        assert!(registry.get_public_keys(&alice, 1).await.unwrap().is_some());

        assert!(registry.revoke_delegate(&alice, &relayer));
        let result = registry.set_public_keys(&relayer, &alice, make_meta(4)).await;
        assert!(matches!(result, Err(ShadeError::AuthorizationFailed { .. })));
    }

    #[tokio::test]
    async fn test_all_zero_keys_rejected() {
        let registry = MemoryKeyRegistry::new();
        let alice = account(1);
        let zero = EncodedPublicKey::from_bytes(&[0u8; 33]).unwrap();
        let meta = StealthMetaAddress::new(zero, make_meta(1).viewing_public_key);

        let result = registry.set_public_keys(&alice, &alice, meta).await;
        assert!(matches!(result, Err(ShadeError::MalformedKey(_))));
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let log = MemoryAnnouncementLog::new();
        let caller = account(5);

        assert_eq!(log.append(&caller, make_test_announcement(1)).await.unwrap(), 0);
        assert_eq!(log.append(&caller, make_test_announcement(2)).await.unwrap(), 1);
        assert_eq!(log.append(&caller, make_test_announcement(3)).await.unwrap(), 2);

        let page = log.read_from(1, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].offset, 1);
        assert_eq!(page[0].caller, Some(caller));
        assert_eq!(page[1].announcement, make_test_announcement(3));
    }

    #[tokio::test]
    async fn test_read_past_end() {
        let log = MemoryAnnouncementLog::new();
        log.append(&account(1), make_test_announcement(1)).await.unwrap();

        assert!(log.read_from(1, 10).await.unwrap().is_empty());
        assert!(log.read_from(u64::MAX, 10).await.unwrap().is_empty());
        assert!(log.read_from(0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_announcement_rejected() {
        let log = MemoryAnnouncementLog::new();
        let invalid = Announcement::new(
            EncodedPublicKey::from_bytes(&[0u8; 33]).unwrap(),
            account(1),
            ViewTag::from_array([0; 12]),
        );

        assert!(log.append(&account(1), invalid).await.is_err());
        assert!(log.is_empty().await.unwrap());
    }

    #[test]
    fn test_iter_from() {
        let log = MemoryAnnouncementLog::new();
        for i in 0..5u8 {
            log.append_at(None, make_test_announcement(i), 100 + i as u64).unwrap();
        }

        let offsets: Vec<u64> = log.iter_from(2).map(|e| e.offset).collect();
        assert_eq!(offsets, vec![2, 3, 4]);
        assert_eq!(log.iter_from(5).count(), 0);
    }

    #[test]
    fn test_stats() {
        let log = MemoryAnnouncementLog::new();
        log.append_at(None, make_test_announcement(1), 200).unwrap();
        log.append_at(
            None,
            make_test_announcement(2).with_metadata(Metadata::asset_transfer_u128(&account(3), 5)),
            100,
        )
        .unwrap();

        let stats = log.stats();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.scheme_counts.get(&1), Some(&2));
        assert_eq!(stats.with_metadata_count, 1);
        assert_eq!(stats.earliest_timestamp, Some(100));
        assert_eq!(stats.latest_timestamp, Some(200));
    }

    #[test]
    fn test_import_requires_contiguous_offsets() {
        let source = MemoryAnnouncementLog::new();
        source.append_at(None, make_test_announcement(1), 1).unwrap();
        source.append_at(None, make_test_announcement(2), 2).unwrap();

        let restored = MemoryAnnouncementLog::new();
        assert_eq!(restored.import(source.all_entries()).unwrap(), 2);
        assert_eq!(restored.entry_count(), 2);

        let gap = MemoryAnnouncementLog::new();
        let mut entries = source.all_entries();
        entries.remove(0);
        assert!(matches!(gap.import(entries), Err(ShadeError::LogError(_))));
    }

    #[tokio::test]
    async fn test_concurrent_append() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let log = Arc::new(MemoryAnnouncementLog::new());
        let mut tasks = JoinSet::new();

        for i in 0..100u8 {
            let log = log.clone();
            tasks.spawn(async move {
                log.append(&Address::from_array([i; 20]), make_test_announcement(i.max(1)))
                    .await
                    .unwrap()
            });
        }

        let mut offsets = Vec::new();
        while let Some(result) = tasks.join_next().await {
            offsets.push(result.unwrap());
        }
        offsets.sort_unstable();

        assert_eq!(offsets, (0..100).collect::<Vec<u64>>());
    }

    #[test]
    fn test_clear() {
        let log = MemoryAnnouncementLog::new();
        log.append_at(None, make_test_announcement(1), 0).unwrap();
        log.clear();

        assert_eq!(log.entry_count(), 0);
        assert_eq!(log.stats().total_count, 0);
    }
}
