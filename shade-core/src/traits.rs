//! Collaborator traits for SHADE.
//!
//! The protocol core never owns storage. The key registry and the
//! announcement log are injected through these traits so that an in-memory
//! store, a file, or an on-chain contract can stand behind them.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Address, Announcement, LogEntry, StealthMetaAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// KEY REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Maps an account to its published stealth meta-address.
#[async_trait]
pub trait KeyRegistry: Send + Sync {
    /// Looks up the keys `registrant` published for `scheme_id`.
    ///
    /// Returns `None` when nothing is registered. This is distinct from any
    /// encoding, including an all-zero one.
    async fn get_public_keys(
        &self,
        registrant: &Address,
        scheme_id: u64,
    ) -> Result<Option<StealthMetaAddress>>;

    /// Publishes keys for `registrant`.
    ///
    /// Fails with `AuthorizationFailed` when `caller` may not write on behalf
    /// of `registrant`.
    async fn set_public_keys(
        &self,
        caller: &Address,
        registrant: &Address,
        meta_address: StealthMetaAddress,
    ) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOUNCEMENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Append-only log of announcements.
#[async_trait]
pub trait AnnouncementLog: Send + Sync {
    /// Appends an announcement and returns its offset.
    async fn append(&self, caller: &Address, announcement: Announcement) -> Result<u64>;

    /// Reads at most `limit` entries starting at `offset`.
    ///
    /// An offset at or past the end yields an empty page.
    async fn read_from(&self, offset: u64, limit: usize) -> Result<Vec<LogEntry>>;

    /// Number of entries in the log.
    async fn len(&self) -> Result<u64>;

    /// True if the log holds no entries.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
