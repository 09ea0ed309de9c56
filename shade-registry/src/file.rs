//! File-backed announcement log with persistence.
//!
//! Stores log entries in a binary file with automatic saves.
//! Suitable for single-node deployments and for the CLI.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use shade_core::constants::ADDRESS_SIZE;
use shade_core::error::{Result, ShadeError};
use shade_core::traits::AnnouncementLog;
use shade_core::types::{Address, Announcement, AnnouncementStats, LogEntry};

use crate::MemoryAnnouncementLog;

/// File-backed announcement log.
///
/// Uses a memory log internally with periodic persistence to disk.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "SHAD"
/// version (1 byte): 1
/// count (8 bytes, LE): number of entries
/// entries (variable), each:
///   has_caller (1 byte) || caller (20 bytes, if has_caller = 1)
///   timestamp (8 bytes, LE)
///   record_len (4 bytes, LE) || announcement wire record
/// ```
///
/// Offsets are implicit: the i-th record has offset i.
///
/// Saves are serialized. An append is committed once it is in memory; a
/// failed auto-save is logged and leaves the log dirty for the next
/// [`flush`](Self::flush) instead of failing the append.
pub struct FileAnnouncementLog {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory storage
    memory: MemoryAnnouncementLog,
    /// Bumped after every append
    generation: AtomicU64,
    /// Generation covered by the last successful save
    saved_generation: AtomicU64,
    /// Held for the whole temp-file write and rename
    save_lock: Mutex<()>,
    /// Auto-save threshold (save after N appends)
    auto_save_threshold: u64,
    /// Appends since last save
    writes_since_save: AtomicU64,
}

/// File format magic bytes
const MAGIC: &[u8; 4] = b"SHAD";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version + count
const HEADER_SIZE: usize = 4 + 1 + 8;
/// Default number of appends between automatic saves
pub const DEFAULT_AUTO_SAVE_THRESHOLD: u64 = 100;

impl FileAnnouncementLog {
    /// Opens the log at the given path.
    ///
    /// If the file exists it is loaded. Otherwise the log starts empty and
    /// the file is created on first save.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_auto_save(path, DEFAULT_AUTO_SAVE_THRESHOLD).await
    }

    /// Opens the log with a custom auto-save threshold.
    ///
    /// A threshold of 1 saves after every append.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let log = Self {
            path: path.as_ref().to_path_buf(),
            memory: MemoryAnnouncementLog::new(),
            generation: AtomicU64::new(0),
            saved_generation: AtomicU64::new(0),
            save_lock: Mutex::new(()),
            auto_save_threshold: threshold.max(1),
            writes_since_save: AtomicU64::new(0),
        };

        if fs::try_exists(&log.path).await? {
            log.load().await?;
        }

        Ok(log)
    }

    /// Loads entries from the file.
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path).await.map_err(|e| {
            ShadeError::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open log file: {}", e),
            ))
        })?;

        let entries = decode_file(&contents)?;
        info!(count = entries.len(), "loading announcement log from file");

        self.memory.import(entries)?;
        debug!("announcement log loaded");
        Ok(())
    }

    /// Writes all entries to the file.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        self.write_snapshot().await
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.saved_generation.load(Ordering::SeqCst)
    }

    /// Saves if there are unsaved changes.
    pub async fn flush(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        if self.is_dirty() {
            self.write_snapshot().await?;
        }
        Ok(())
    }

    /// Caller must hold `save_lock`.
    async fn write_snapshot(&self) -> Result<()> {
        // Read before the snapshot: appends racing with it stay dirty
        let generation = self.generation.load(Ordering::SeqCst);
        let entries = self.memory.all_entries();
        info!(count = entries.len(), "saving announcement log to file");

        let contents = encode_file(&entries);

        // Write to a temp file, then rename over the original
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        self.saved_generation.fetch_max(generation, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);
        debug!(generation, "announcement log saved");
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory log for direct access.
    pub fn memory(&self) -> &MemoryAnnouncementLog {
        &self.memory
    }

    /// Returns statistics.
    pub fn stats(&self) -> AnnouncementStats {
        self.memory.stats()
    }

    async fn maybe_auto_save(&self) {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst) + 1;
        if writes < self.auto_save_threshold {
            return;
        }
        // Concurrent appenders past the threshold coalesce into one write
        if let Err(e) = self.flush().await {
            warn!(path = ?self.path, error = %e, "auto-save failed; log stays dirty");
        }
    }
}

impl Drop for FileAnnouncementLog {
    fn drop(&mut self) {
        // Best effort only: no async save from Drop
        if self.is_dirty() {
            warn!(path = ?self.path, "FileAnnouncementLog dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl AnnouncementLog for FileAnnouncementLog {
    async fn append(&self, caller: &Address, announcement: Announcement) -> Result<u64> {
        let offset = self.memory.append(caller, announcement).await?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.maybe_auto_save().await;
        Ok(offset)
    }

    async fn read_from(&self, offset: u64, limit: usize) -> Result<Vec<LogEntry>> {
        self.memory.read_from(offset, limit).await
    }

    async fn len(&self) -> Result<u64> {
        self.memory.len().await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENCODING
// ═══════════════════════════════════════════════════════════════════════════════

fn encode_file(entries: &[LogEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + entries.len() * 128);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&(entries.len() as u64).to_le_bytes());

    for entry in entries {
        match &entry.caller {
            Some(caller) => {
                out.push(1);
                out.extend_from_slice(caller.as_bytes());
            }
            None => out.push(0),
        }
        out.extend_from_slice(&entry.timestamp.to_le_bytes());

        let record = entry.announcement.to_bytes();
        out.extend_from_slice(&(record.len() as u32).to_le_bytes());
        out.extend_from_slice(&record);
    }
    out
}

fn decode_file(contents: &[u8]) -> Result<Vec<LogEntry>> {
    let mut cursor = Cursor::new(contents);

    if cursor.take(MAGIC.len())? != MAGIC {
        return Err(ShadeError::LogError("invalid magic bytes".into()));
    }

    let version = cursor.take(1)?[0];
    if version != VERSION {
        return Err(ShadeError::VersionMismatch {
            expected: VERSION,
            actual: version,
        });
    }

    let count = u64::from_le_bytes(cursor.take_array()?);
    let mut entries = Vec::new();

    for offset in 0..count {
        let caller = match cursor.take(1)?[0] {
            0 => None,
            1 => Some(Address::from_bytes(cursor.take(ADDRESS_SIZE)?)?),
            flag => {
                return Err(ShadeError::LogError(format!(
                    "entry {}: invalid caller flag {}",
                    offset, flag
                )))
            }
        };
        let timestamp = u64::from_le_bytes(cursor.take_array()?);
        let record_len = u32::from_le_bytes(cursor.take_array()?) as usize;
        let announcement = Announcement::from_bytes(cursor.take(record_len)?)?;

        entries.push(LogEntry {
            offset,
            caller,
            timestamp,
            announcement,
        });
    }

    if !cursor.is_empty() {
        return Err(ShadeError::LogError("trailing bytes after last entry".into()));
    }

    Ok(entries)
}

struct Cursor<'a> {
    bytes: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(ShadeError::LogError(format!(
                "file truncated: needed {} bytes, {} left",
                n,
                self.bytes.len()
            )));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
