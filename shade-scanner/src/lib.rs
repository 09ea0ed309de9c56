//! # SHADE Scanner
//!
//! Checkpointed batch scanning of an announcement log.
//!
//! ## Features
//!
//! - **Batch Processing**: pages through the log in configurable batches
//! - **Progress Reporting**: callbacks for UI progress updates
//! - **Resumable Scans**: a checkpoint offset survives between passes
//! - **Parallel Scanning**: order-preserving rayon map over each batch
//! - **Streaming**: lazy `Stream` of discoveries, dropped at any time
//!
//! ## Example
//!
//! ```rust
//! use shade_core::{Address, AnnouncementLog};
//! use shade_registry::MemoryAnnouncementLog;
//! use shade_scanner::Scanner;
//! use shade_stealth::{create_stealth_payment, StealthWallet};
//!
//! # tokio_test::block_on(async {
//! let wallet: StealthWallet = StealthWallet::generate().unwrap();
//! let log = MemoryAnnouncementLog::new();
//!
//! let payment = create_stealth_payment(wallet.meta_address()).unwrap();
//! log.append(&Address::from_array([1; 20]), payment.announcement).await.unwrap();
//!
//! let scanner: Scanner = Scanner::new(wallet.into_keys());
//! let discoveries = scanner.scan_all(&log).await.unwrap();
//! assert_eq!(discoveries.len(), 1);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, Stream, TryStreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use shade_core::constants::{DEFAULT_SCAN_BATCH_SIZE, MAX_SCAN_BATCH_SIZE};
use shade_core::error::{Result, ShadeError};
use shade_core::traits::AnnouncementLog;
use shade_core::types::{Announcement, LogEntry};
use shade_crypto::{DefaultSuite, RecipientKeys, StealthKeyPair, StealthSuite};
use shade_stealth::discovery::{
    AnnouncementScanner, Discovery, ScanDiagnostics, ScanOutcome, ScanStats, TracingDiagnostics,
};
use shade_stealth::{StealthWallet, WalletKeyFile};

/// A log entry that belongs to the scanning recipient, with its recovered keys.
pub type DiscoveredPayment<C> = Discovery<LogEntry, StealthKeyPair<C>>;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Scanner configuration.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    /// Entries fetched from the log per read
    pub batch_size: usize,
    /// Whether to stop on first discovery
    pub stop_on_first: bool,
    /// Upper bound on entries examined in one pass (None = up to the end)
    pub max_entries: Option<u64>,
    /// Check each batch on the rayon pool
    pub parallel: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
            stop_on_first: false,
            max_entries: None,
            parallel: true,
        }
    }
}

impl ScannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size, clamped to `1..=MAX_SCAN_BATCH_SIZE`.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_SCAN_BATCH_SIZE);
        self
    }

    /// Enables stopping on first discovery.
    pub fn stop_on_first(mut self) -> Self {
        self.stop_on_first = true;
        self
    }

    /// Limits how many entries one pass examines.
    pub fn max_entries(mut self, max: u64) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Enables or disables parallel batch checks.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

/// Scan progress information.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Total entries this pass will examine
    pub total: u64,
    /// Entries scanned so far
    pub scanned: u64,
    /// Discoveries found so far
    pub discoveries: u64,
    /// Current scan rate (entries per second)
    pub rate: f64,
    /// Estimated time remaining in seconds
    pub eta_seconds: Option<f64>,
    /// Percentage complete (0-100)
    pub percent: f64,
}

impl ScanProgress {
    /// Creates a new progress tracker.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            scanned: 0,
            discoveries: 0,
            rate: 0.0,
            eta_seconds: None,
            percent: 0.0,
        }
    }

    /// Updates progress with new values.
    pub fn update(&mut self, scanned: u64, discoveries: u64, elapsed_ms: u64) {
        self.scanned = scanned;
        self.discoveries = discoveries;

        if elapsed_ms > 0 {
            self.rate = (scanned as f64 / elapsed_ms as f64) * 1000.0;
        }

        if self.total > 0 {
            self.percent = (scanned as f64 / self.total as f64) * 100.0;

            if self.rate > 0.0 {
                let remaining = self.total.saturating_sub(scanned);
                self.eta_seconds = Some(remaining as f64 / self.rate);
            }
        } else {
            self.percent = 100.0;
        }
    }
}

/// Checkpoint for resumable scanning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPosition {
    /// Offset of the next entry to examine
    pub next_offset: u64,
    /// Total entries scanned since the position was created
    pub total_scanned: u64,
    /// Total discoveries since the position was created
    pub total_discoveries: u64,
}

impl ScanPosition {
    /// Creates a position at the start of the log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a position at `offset`.
    pub fn at(offset: u64) -> Self {
        Self {
            next_offset: offset,
            ..Self::default()
        }
    }

    /// Moves the checkpoint forward.
    pub fn advance(&mut self, next_offset: u64, scanned: u64, discoveries: u64) {
        self.next_offset = self.next_offset.max(next_offset);
        self.total_scanned += scanned;
        self.total_discoveries += discoveries;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Log scanner for one recipient.
///
/// Holds the recipient keys, a checkpoint and cumulative statistics. Each
/// pass starts at the checkpoint and moves it forward.
pub struct Scanner<S: StealthSuite = DefaultSuite> {
    keys: RecipientKeys<S::Curve>,
    position: RwLock<ScanPosition>,
    stats: RwLock<ScanStats>,
    diagnostics: Arc<dyn ScanDiagnostics>,
}

impl<S: StealthSuite> Scanner<S> {
    /// Creates a scanner starting at the beginning of the log.
    pub fn new(keys: RecipientKeys<S::Curve>) -> Self {
        Self {
            keys,
            position: RwLock::new(ScanPosition::new()),
            stats: RwLock::new(ScanStats::new()),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Creates a scanner from a wallet key file.
    pub fn from_key_file(file: &WalletKeyFile) -> Result<Self> {
        Ok(Self::new(StealthWallet::<S>::from_key_file(file)?.into_keys()))
    }

    /// Replaces the sink that receives skipped entries.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn ScanDiagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Resumes from a saved checkpoint.
    pub fn with_position(self, position: ScanPosition) -> Self {
        *self.position.write() = position;
        self
    }

    /// Returns the current checkpoint.
    pub fn position(&self) -> ScanPosition {
        self.position.read().clone()
    }

    /// Returns the cumulative statistics.
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Resets the checkpoint and statistics.
    pub fn reset_position(&self) {
        *self.position.write() = ScanPosition::new();
        *self.stats.write() = ScanStats::new();
    }

    fn checker(&self) -> AnnouncementScanner<'_, S, RecipientKeys<S::Curve>> {
        AnnouncementScanner::new(&self.keys)
    }

    /// Scans a single announcement.
    pub fn scan_one(
        &self,
        announcement: &Announcement,
    ) -> Result<ScanOutcome<StealthKeyPair<S::Curve>>> {
        let result = self.checker().check(announcement);
        self.stats.write().record(&result);
        result
    }

    /// Scans from the checkpoint to the end of the log.
    #[instrument(skip(self, log))]
    pub async fn scan_all(
        &self,
        log: &dyn AnnouncementLog,
    ) -> Result<Vec<DiscoveredPayment<S::Curve>>> {
        self.run(log, &ScannerConfig::default(), None).await
    }

    /// Scans with custom configuration.
    #[instrument(skip(self, log, config))]
    pub async fn scan_with_config(
        &self,
        log: &dyn AnnouncementLog,
        config: ScannerConfig,
    ) -> Result<Vec<DiscoveredPayment<S::Curve>>> {
        self.run(log, &config, None).await
    }

    /// Scans with progress reporting after every batch.
    #[instrument(skip(self, log, config, progress_callback))]
    pub async fn scan_with_progress(
        &self,
        log: &dyn AnnouncementLog,
        config: ScannerConfig,
        progress_callback: ProgressCallback,
    ) -> Result<Vec<DiscoveredPayment<S::Curve>>> {
        self.run(log, &config, Some(&progress_callback)).await
    }

    async fn run(
        &self,
        log: &dyn AnnouncementLog,
        config: &ScannerConfig,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<Vec<DiscoveredPayment<S::Curve>>> {
        let start = Instant::now();
        let total = log.len().await?;
        let mut offset = self.position.read().next_offset;
        let end = match config.max_entries {
            Some(max) => total.min(offset.saturating_add(max)),
            None => total,
        };

        let mut progress = ScanProgress::new(end.saturating_sub(offset));
        let mut session = ScanStats::new();
        let mut discoveries = Vec::new();

        info!(from = offset, to = end, suite = %S::describe(), "starting scan");

        while offset < end {
            let limit = (end - offset).min(config.batch_size.max(1) as u64) as usize;
            let batch = log.read_from(offset, limit).await?;
            if batch.is_empty() {
                break;
            }
            if batch[0].offset != offset {
                return Err(ShadeError::LogError(format!(
                    "log returned offset {} for a read at {}",
                    batch[0].offset, offset
                )));
            }

            let (found, mut batch_stats) = if config.stop_on_first {
                self.scan_until_first(batch, offset)
            } else {
                self.scan_entries(batch, offset, config.parallel)
            };
            batch_stats.duration_ms = 0;

            offset += batch_stats.total_scanned;
            debug!(
                next_offset = offset,
                found = found.len(),
                skipped = batch_stats.skipped,
                "batch scanned"
            );

            session.merge(&batch_stats);
            self.stats.write().merge(&batch_stats);
            self.position
                .write()
                .advance(offset, batch_stats.total_scanned, found.len() as u64);
            discoveries.extend(found);

            if let Some(callback) = progress_callback {
                progress.update(
                    session.total_scanned,
                    discoveries.len() as u64,
                    start.elapsed().as_millis() as u64,
                );
                callback(progress.clone());
            }

            if config.stop_on_first && !discoveries.is_empty() {
                info!("stopping on first discovery");
                break;
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        session.duration_ms = elapsed_ms;
        self.stats.write().duration_ms += elapsed_ms;

        if let Some(callback) = progress_callback {
            progress.update(session.total_scanned, discoveries.len() as u64, elapsed_ms);
            callback(progress);
        }

        info!(
            discoveries = discoveries.len(),
            scanned = session.total_scanned,
            skipped = session.skipped,
            duration_ms = session.duration_ms,
            rate = format!("{:.2}/s", session.rate()),
            "scan complete"
        );

        Ok(discoveries)
    }

    fn scan_entries(
        &self,
        batch: Vec<LogEntry>,
        base: u64,
        parallel: bool,
    ) -> (Vec<DiscoveredPayment<S::Curve>>, ScanStats) {
        let diagnostics = AtOffset {
            base,
            inner: self.diagnostics.as_ref(),
        };

        if parallel {
            return self.checker().scan_batch(batch, &diagnostics);
        }

        let checker = self.checker();
        let mut scan = checker.scan_with_diagnostics(batch, &diagnostics);
        let found: Vec<_> = scan.by_ref().collect();
        (found, scan.stats().clone())
    }

    fn scan_until_first(
        &self,
        batch: Vec<LogEntry>,
        base: u64,
    ) -> (Vec<DiscoveredPayment<S::Curve>>, ScanStats) {
        let diagnostics = AtOffset {
            base,
            inner: self.diagnostics.as_ref(),
        };

        let checker = self.checker();
        let mut scan = checker.scan_with_diagnostics(batch, &diagnostics);
        let found: Vec<_> = scan.next().into_iter().collect();
        (found, scan.stats().clone())
    }

    /// Lazy stream of discoveries from the checkpoint onwards.
    ///
    /// The checkpoint advances as entries are pulled; dropping the stream
    /// ends the scan.
    pub fn discoveries<'a>(
        &'a self,
        log: &'a dyn AnnouncementLog,
        batch_size: usize,
    ) -> impl Stream<Item = Result<DiscoveredPayment<S::Curve>>> + 'a {
        let from = self.position.read().next_offset;

        announcement_stream(log, from, batch_size).try_filter_map(move |entry| {
            let result = self.checker().check(&entry.announcement);
            self.stats.write().record(&result);

            let discovered = match result {
                Ok(outcome) => outcome.into_discovered(),
                Err(e) => {
                    self.diagnostics
                        .skipped(entry.offset, &entry.announcement, &e);
                    None
                }
            };
            self.position.write().advance(
                entry.offset + 1,
                1,
                u64::from(discovered.is_some()),
            );

            futures::future::ready(Ok(discovered.map(|keys| Discovery { entry, keys })))
        })
    }
}

impl<S: StealthSuite> std::fmt::Debug for Scanner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("suite", &S::describe())
            .field("position", &*self.position.read())
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Reports batch-relative positions as log offsets.
struct AtOffset<'a> {
    base: u64,
    inner: &'a dyn ScanDiagnostics,
}

impl ScanDiagnostics for AtOffset<'_> {
    fn skipped(&self, position: u64, announcement: &Announcement, error: &ShadeError) {
        self.inner
            .skipped(self.base.saturating_add(position), announcement, error)
    }
}

/// Lazily pages through `log` from `from`, `batch_size` entries per read.
///
/// Ends at the first empty page.
pub fn announcement_stream<'a>(
    log: &'a dyn AnnouncementLog,
    from: u64,
    batch_size: usize,
) -> impl Stream<Item = Result<LogEntry>> + 'a {
    let batch_size = batch_size.clamp(1, MAX_SCAN_BATCH_SIZE);

    stream::try_unfold(from, move |offset| async move {
        let page: Vec<LogEntry> = log.read_from(offset, batch_size).await?;
        let next = if page.is_empty() {
            None
        } else {
            let next_offset = offset + page.len() as u64;
            Some((stream::iter(page.into_iter().map(Ok::<_, ShadeError>)), next_offset))
        };
        Ok::<_, ShadeError>(next)
    })
    .try_flatten()
}

/// Scan result summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of entries scanned
    pub total_scanned: u64,
    /// Number of view tag matches
    pub view_tag_matches: u64,
    /// View tag matches whose address did not match
    pub false_positives: u64,
    /// Number of payments discovered
    pub discoveries: u64,
    /// Entries skipped as malformed
    pub skipped: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Scan rate (entries per second)
    pub rate: f64,
    /// Filter efficiency (% rejected by view tag)
    pub filter_efficiency: f64,
}

impl From<ScanStats> for ScanSummary {
    fn from(stats: ScanStats) -> Self {
        Self {
            total_scanned: stats.total_scanned,
            view_tag_matches: stats.view_tag_matches,
            false_positives: stats.false_positives,
            discoveries: stats.discoveries,
            skipped: stats.skipped,
            duration_ms: stats.duration_ms,
            rate: stats.rate(),
            filter_efficiency: stats.filter_efficiency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use shade_core::constants::SCHEME_ID_SECP256K1;
    use shade_core::types::{Address, EncodedPublicKey, StealthMetaAddress, ViewTag};
    use shade_crypto::Secp256k1;
    use shade_registry::MemoryAnnouncementLog;
    use shade_stealth::create_stealth_payment;

    fn sender() -> Address {
        Address::from_array([0x5E; 20])
    }

    fn setup(seed: u64) -> (Scanner, StealthMetaAddress, MemoryAnnouncementLog) {
        let keys =
            RecipientKeys::<Secp256k1>::generate(&mut ChaCha20Rng::seed_from_u64(seed)).unwrap();
        let meta = keys.meta_address(SCHEME_ID_SECP256K1).unwrap();
        (Scanner::new(keys), meta, MemoryAnnouncementLog::new())
    }

    fn other_meta(seed: u64) -> StealthMetaAddress {
        RecipientKeys::<Secp256k1>::generate(&mut ChaCha20Rng::seed_from_u64(seed))
            .unwrap()
            .meta_address(SCHEME_ID_SECP256K1)
            .unwrap()
    }

    async fn pay(log: &MemoryAnnouncementLog, meta: &StealthMetaAddress) -> Address {
        let payment = create_stealth_payment(meta).unwrap();
        log.append(&sender(), payment.announcement).await.unwrap();
        payment.stealth_address
    }

    fn malformed() -> Announcement {
        let mut bad = [0xFFu8; 33];
        bad[0] = 0x02;
        Announcement::new(
            EncodedPublicKey::from_bytes(&bad).unwrap(),
            Address::from_array([1; 20]),
            ViewTag::from_array([2; 12]),
        )
    }

    #[tokio::test]
    async fn test_scan_empty_log() {
        let (scanner, _, log) = setup(1);

        let discoveries = scanner.scan_all(&log).await.unwrap();
        assert!(discoveries.is_empty());
        assert_eq!(scanner.position().next_offset, 0);
    }

    #[tokio::test]
    async fn test_scan_finds_payment() {
        let (scanner, meta, log) = setup(2);
        let address = pay(&log, &meta).await;

        let discoveries = scanner.scan_all(&log).await.unwrap();
        assert_eq!(discoveries.len(), 1);
        assert_eq!(*discoveries[0].keys.address(), address);
        assert_eq!(discoveries[0].entry.offset, 0);
    }

    #[tokio::test]
    async fn test_scan_ignores_other_payments() {
        let (scanner, meta, log) = setup(3);
        let other = other_meta(30);

        for _ in 0..5 {
            pay(&log, &other).await;
        }
        pay(&log, &meta).await;
        for _ in 0..5 {
            pay(&log, &other).await;
        }

        let discoveries = scanner.scan_all(&log).await.unwrap();
        assert_eq!(discoveries.len(), 1);
        assert_eq!(discoveries[0].entry.offset, 5);
        assert_eq!(scanner.stats().total_scanned, 11);
    }

    #[tokio::test]
    async fn test_scan_across_batches() {
        let (scanner, meta, log) = setup(4);
        for _ in 0..7 {
            pay(&log, &meta).await;
        }

        let config = ScannerConfig::new().batch_size(3);
        let discoveries = scanner.scan_with_config(&log, config).await.unwrap();

        let offsets: Vec<u64> = discoveries.iter().map(|d| d.entry.offset).collect();
        assert_eq!(offsets, (0..7).collect::<Vec<u64>>());
        assert_eq!(scanner.position().next_offset, 7);
    }

    #[tokio::test]
    async fn test_parallel_and_sequential_agree() {
        let (scanner, meta, log) = setup(5);
        let other = other_meta(50);
        for i in 0..12 {
            if i % 4 == 1 {
                pay(&log, &meta).await;
            } else {
                pay(&log, &other).await;
            }
        }

        let parallel = scanner
            .scan_with_config(&log, ScannerConfig::new().batch_size(5).parallel(true))
            .await
            .unwrap();
        scanner.reset_position();
        let sequential = scanner
            .scan_with_config(&log, ScannerConfig::new().batch_size(5).parallel(false))
            .await
            .unwrap();

        let p: Vec<u64> = parallel.iter().map(|d| d.entry.offset).collect();
        let s: Vec<u64> = sequential.iter().map(|d| d.entry.offset).collect();
        assert_eq!(p, vec![1, 5, 9]);
        assert_eq!(p, s);
    }

    #[tokio::test]
    async fn test_stop_on_first_sets_checkpoint() {
        let (scanner, meta, log) = setup(6);
        let other = other_meta(60);
        pay(&log, &other).await;
        pay(&log, &meta).await;
        pay(&log, &other).await;
        pay(&log, &meta).await;

        let config = ScannerConfig::new().stop_on_first();
        let first = scanner.scan_with_config(&log, config.clone()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].entry.offset, 1);
        assert_eq!(scanner.position().next_offset, 2);

        let second = scanner.scan_with_config(&log, config).await.unwrap();
        assert_eq!(second[0].entry.offset, 3);
        assert_eq!(scanner.position().total_discoveries, 2);
    }

    #[tokio::test]
    async fn test_max_entries() {
        let (scanner, meta, log) = setup(7);
        for _ in 0..5 {
            pay(&log, &meta).await;
        }

        let config = ScannerConfig::new().max_entries(2);
        let discoveries = scanner.scan_with_config(&log, config).await.unwrap();
        assert_eq!(discoveries.len(), 2);
        assert_eq!(scanner.position().next_offset, 2);
    }

    #[tokio::test]
    async fn test_resume_from_checkpoint() {
        let (scanner, meta, log) = setup(8);
        pay(&log, &meta).await;
        assert_eq!(scanner.scan_all(&log).await.unwrap().len(), 1);

        // Nothing new: the checkpoint is at the end
        assert!(scanner.scan_all(&log).await.unwrap().is_empty());

        pay(&log, &meta).await;
        let discoveries = scanner.scan_all(&log).await.unwrap();
        assert_eq!(discoveries.len(), 1);
        assert_eq!(discoveries[0].entry.offset, 1);

        let saved = serde_json::to_string(&scanner.position()).unwrap();
        let restored: ScanPosition = serde_json::from_str(&saved).unwrap();
        assert_eq!(restored.next_offset, 2);
    }

    #[tokio::test]
    async fn test_malformed_entries_reported_at_log_offset() {
        let (scanner, meta, log) = setup(9);
        let reported = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = reported.clone();
        let scanner = scanner.with_diagnostics(Arc::new(
            move |position: u64, _: &Announcement, _: &ShadeError| sink.lock().push(position),
        ));

        pay(&log, &meta).await;
        log.append(&sender(), malformed()).await.unwrap();
        pay(&log, &meta).await;
        log.append(&sender(), malformed()).await.unwrap();

        let config = ScannerConfig::new().batch_size(2);
        let discoveries = scanner.scan_with_config(&log, config).await.unwrap();

        assert_eq!(discoveries.len(), 2);
        assert_eq!(*reported.lock(), vec![1, 3]);
        assert_eq!(scanner.stats().skipped, 2);
    }

    #[test]
    fn test_diagnostic_offsets_beyond_u32() {
        let reported = parking_lot::Mutex::new(Vec::new());
        let sink = |position: u64, _: &Announcement, _: &ShadeError| reported.lock().push(position);
        let base = u64::from(u32::MAX) + 5;
        let at_offset = AtOffset { base, inner: &sink };

        at_offset.skipped(3, &malformed(), &ShadeError::MalformedKey("bad".into()));

        assert_eq!(*reported.lock(), vec![u64::from(u32::MAX) + 8]);
    }

    #[tokio::test]
    async fn test_scan_progress_callback() {
        let (scanner, meta, log) = setup(10);
        for _ in 0..10 {
            pay(&log, &meta).await;
        }

        let updates = Arc::new(RwLock::new(Vec::new()));
        let updates_clone = updates.clone();
        let callback: ProgressCallback = Box::new(move |progress| {
            updates_clone.write().push(progress);
        });

        let config = ScannerConfig::new().batch_size(4);
        scanner.scan_with_progress(&log, config, callback).await.unwrap();

        let updates = updates.read();
        // Three batches plus the final update
        assert_eq!(updates.len(), 4);
        let last = updates.last().unwrap();
        assert_eq!(last.discoveries, 10);
        assert!(last.percent >= 99.0);
    }

    #[tokio::test]
    async fn test_discovery_stream() {
        let (scanner, meta, log) = setup(11);
        let other = other_meta(110);
        pay(&log, &other).await;
        pay(&log, &meta).await;
        pay(&log, &meta).await;

        let found: Vec<_> = scanner.discoveries(&log, 2).try_collect().await.unwrap();
        let offsets: Vec<u64> = found.iter().map(|d| d.entry.offset).collect();
        assert_eq!(offsets, vec![1, 2]);
        assert_eq!(scanner.position().next_offset, 3);
    }

    #[tokio::test]
    async fn test_discovery_stream_early_termination() {
        let (scanner, meta, log) = setup(12);
        for _ in 0..4 {
            pay(&log, &meta).await;
        }

        let first: Vec<_> = scanner
            .discoveries(&log, 10)
            .take(1)
            .collect::<Vec<_>>()
            .await;
        assert_eq!(first.len(), 1);
        assert_eq!(scanner.position().next_offset, 1);
    }

    #[tokio::test]
    async fn test_announcement_stream_pages() {
        let (_, meta, log) = setup(13);
        for _ in 0..5 {
            pay(&log, &meta).await;
        }

        let entries: Vec<LogEntry> = announcement_stream(&log, 1, 2).try_collect().await.unwrap();
        let offsets: Vec<u64> = entries.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_reset_position() {
        let (scanner, meta, log) = setup(14);
        pay(&log, &meta).await;

        scanner.scan_all(&log).await.unwrap();
        scanner.reset_position();

        let pos = scanner.position();
        assert_eq!(pos.next_offset, 0);
        assert_eq!(pos.total_scanned, 0);
        assert_eq!(scanner.scan_all(&log).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_from_key_file() {
        let wallet: StealthWallet = StealthWallet::generate().unwrap();
        let file = wallet.to_key_file().unwrap();
        let log = MemoryAnnouncementLog::new();
        pay(&log, wallet.meta_address()).await;

        let scanner: Scanner = Scanner::from_key_file(&file).unwrap();
        assert_eq!(scanner.scan_all(&log).await.unwrap().len(), 1);
    }

    #[test]
    fn test_scan_one() {
        let (scanner, meta, _) = setup(15);
        let payment = create_stealth_payment(&meta).unwrap();

        assert!(scanner.scan_one(&payment.announcement).unwrap().is_discovered());
        assert!(scanner.scan_one(&malformed()).is_err());
        assert_eq!(scanner.stats().skipped, 1);
    }

    #[test]
    fn test_scan_summary() {
        let stats = ScanStats {
            total_scanned: 100,
            view_tag_matches: 2,
            discoveries: 1,
            false_positives: 1,
            duration_ms: 1000,
            ..ScanStats::default()
        };
        let summary = ScanSummary::from(stats);
        assert!((summary.rate - 100.0).abs() < 0.01);
        assert!((summary.filter_efficiency - 98.0).abs() < 0.01);
    }

    #[test]
    fn test_scan_progress_eta() {
        let mut progress = ScanProgress::new(1000);

        // 500 scanned in 1000ms
        progress.update(500, 2, 1000);

        assert!((progress.percent - 50.0).abs() < 0.1);
        assert!((progress.rate - 500.0).abs() < 1.0);
        assert!((progress.eta_seconds.unwrap() - 1.0).abs() < 0.1);
    }
}
