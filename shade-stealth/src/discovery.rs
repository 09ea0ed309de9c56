//! Announcement scanning (recipient side).
//!
//! Scanning is a pure filter-map over a sequence of announcements:
//!
//! ```text
//! E = decode(ephemeral_public_key)      (MalformedKey → skip, report)
//! h = H(compressed(v · E))
//! h[0..12] != view_tag                  → skip (cheap path)
//! P = S + (h mod n) · G
//! address(P) != stealth_address         → skip (false positive)
//! emit (entry, keys)
//! ```
//!
//! A bad entry never aborts a scan. It is skipped and handed to the
//! caller's [`ScanDiagnostics`] sink.

use std::marker::PhantomData;
use std::time::Instant;

use tracing::{debug, warn};

use shade_core::error::{Result, ShadeError};
use shade_core::types::{Address, Announcement, LogEntry};
use shade_crypto::derive::{
    addresses_match, derive_stealth_key_pair, derive_stealth_public, hash_shared_secret,
    recipient_shared_secret, SecretHash,
};
use shade_crypto::{
    decode_public_key, verify_view_tag, CurveAdapter, RecipientKeys, StealthKeyPair, StealthSuite,
    ViewingKey,
};

// ═══════════════════════════════════════════════════════════════════════════════
// INPUTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Anything that carries an announcement: a bare announcement or a log entry.
pub trait AsAnnouncement {
    /// The announcement to check.
    fn announcement(&self) -> &Announcement;
}

impl AsAnnouncement for Announcement {
    fn announcement(&self) -> &Announcement {
        self
    }
}

impl AsAnnouncement for LogEntry {
    fn announcement(&self) -> &Announcement {
        &self.announcement
    }
}

impl<T: AsAnnouncement + ?Sized> AsAnnouncement for &T {
    fn announcement(&self) -> &Announcement {
        (**self).announcement()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Key material a scanner can run with.
///
/// Full recipient keys recover a [`StealthKeyPair`]; a [`ViewingKey`] only
/// recognises announcements and yields an [`ObservedStealthAddress`].
pub trait ScanKey<C: CurveAdapter>: Sync {
    /// What a match produces.
    type Output: Send;

    /// Viewing secret scalar.
    fn viewing_secret(&self) -> &C::Scalar;

    /// Spending public point.
    fn spending_public(&self) -> &C::Point;

    /// Builds the output once the view tag has matched. `None` when the
    /// recomputed address differs from `expected`.
    fn resolve(&self, hash: &SecretHash, expected: &Address) -> Result<Option<Self::Output>>;
}

impl<C: CurveAdapter> ScanKey<C> for RecipientKeys<C> {
    type Output = StealthKeyPair<C>;

    fn viewing_secret(&self) -> &C::Scalar {
        self.viewing().secret()
    }

    fn spending_public(&self) -> &C::Point {
        self.spending().public()
    }

    fn resolve(&self, hash: &SecretHash, expected: &Address) -> Result<Option<StealthKeyPair<C>>> {
        let (_, candidate) = derive_stealth_public::<C>(self.spending().public(), hash)?;
        if !addresses_match(&candidate, expected) {
            return Ok(None);
        }
        derive_stealth_key_pair(self.spending(), hash).map(Some)
    }
}

/// A stealth address recognised with a viewing key only.
#[derive(Debug, Clone)]
pub struct ObservedStealthAddress<C: CurveAdapter> {
    /// The stealth public point
    pub public: C::Point,
    /// Its address
    pub address: Address,
}

impl<C: CurveAdapter> ScanKey<C> for ViewingKey<C> {
    type Output = ObservedStealthAddress<C>;

    fn viewing_secret(&self) -> &C::Scalar {
        ViewingKey::viewing_secret(self)
    }

    fn spending_public(&self) -> &C::Point {
        ViewingKey::spending_public(self)
    }

    fn resolve(
        &self,
        hash: &SecretHash,
        expected: &Address,
    ) -> Result<Option<ObservedStealthAddress<C>>> {
        let (public, address) = derive_stealth_public::<C>(self.spending_public(), hash)?;
        if !addresses_match(&address, expected) {
            return Ok(None);
        }
        Ok(Some(ObservedStealthAddress { public, address }))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of checking a single announcement.
#[derive(Debug)]
pub enum ScanOutcome<O> {
    /// Announcement was produced with another scheme
    OtherScheme,
    /// View tag didn't match - not for this recipient
    ViewTagMismatch,
    /// View tag matched but the address did not
    FalsePositive,
    /// The announcement belongs to this recipient
    Discovered(O),
}

impl<O> ScanOutcome<O> {
    /// Returns true if the announcement was ours.
    pub fn is_discovered(&self) -> bool {
        matches!(self, ScanOutcome::Discovered(_))
    }

    /// Returns the discovered output if present.
    pub fn into_discovered(self) -> Option<O> {
        match self {
            ScanOutcome::Discovered(o) => Some(o),
            _ => None,
        }
    }
}

/// A matched entry together with what the scan key recovered.
#[derive(Debug)]
pub struct Discovery<T, O> {
    /// The input entry (announcement or log entry)
    pub entry: T,
    /// Stealth key pair, or observed address for view-only scans
    pub keys: O,
}

/// Statistics for scanning operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Total announcements scanned
    pub total_scanned: u64,
    /// Announcements for other schemes
    pub other_scheme: u64,
    /// Number of view tag matches
    pub view_tag_matches: u64,
    /// View tag matched but address did not
    pub false_positives: u64,
    /// Number of announcements discovered
    pub discoveries: u64,
    /// Entries skipped because they were malformed
    pub skipped: u64,
    /// Duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl ScanStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scan result.
    pub fn record<O>(&mut self, result: &Result<ScanOutcome<O>>) {
        self.total_scanned += 1;
        match result {
            Ok(ScanOutcome::OtherScheme) => self.other_scheme += 1,
            Ok(ScanOutcome::ViewTagMismatch) => {}
            Ok(ScanOutcome::FalsePositive) => {
                self.view_tag_matches += 1;
                self.false_positives += 1;
            }
            Ok(ScanOutcome::Discovered(_)) => {
                self.view_tag_matches += 1;
                self.discoveries += 1;
            }
            Err(_) => self.skipped += 1,
        }
    }

    /// Adds another batch's counters to this one.
    pub fn merge(&mut self, other: &ScanStats) {
        self.total_scanned += other.total_scanned;
        self.other_scheme += other.other_scheme;
        self.view_tag_matches += other.view_tag_matches;
        self.false_positives += other.false_positives;
        self.discoveries += other.discoveries;
        self.skipped += other.skipped;
        self.duration_ms += other.duration_ms;
    }

    /// Returns the scan rate (announcements per second).
    pub fn rate(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.total_scanned as f64 / self.duration_ms as f64) * 1000.0
        }
    }

    /// Percentage of announcements rejected by the view tag alone.
    pub fn filter_efficiency(&self) -> f64 {
        if self.total_scanned == 0 {
            0.0
        } else {
            let rejected = self.total_scanned - self.view_tag_matches;
            (rejected as f64 / self.total_scanned as f64) * 100.0
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Receives entries a scan skipped.
///
/// `position` is the entry's index in the scanned sequence.
pub trait ScanDiagnostics: Send + Sync {
    /// Called once per skipped entry.
    fn skipped(&self, position: u64, announcement: &Announcement, error: &ShadeError);
}

/// Discards diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl ScanDiagnostics for NoDiagnostics {
    fn skipped(&self, _position: u64, _announcement: &Announcement, _error: &ShadeError) {}
}

/// Logs skipped entries at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl ScanDiagnostics for TracingDiagnostics {
    fn skipped(&self, position: u64, announcement: &Announcement, error: &ShadeError) {
        warn!(
            position,
            stealth_address = %announcement.stealth_address,
            error = %error,
            "skipping malformed announcement"
        );
    }
}

impl<F> ScanDiagnostics for F
where
    F: Fn(u64, &Announcement, &ShadeError) + Send + Sync,
{
    fn skipped(&self, position: u64, announcement: &Announcement, error: &ShadeError) {
        self(position, announcement, error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Checks announcements against one recipient's keys.
///
/// Holds no mutable state; cheap to copy and safe to share across threads.
pub struct AnnouncementScanner<'k, S: StealthSuite, K> {
    keys: &'k K,
    _suite: PhantomData<fn() -> S>,
}

impl<'k, S: StealthSuite, K> Clone for AnnouncementScanner<'k, S, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'k, S: StealthSuite, K> Copy for AnnouncementScanner<'k, S, K> {}

impl<'k, S, K> AnnouncementScanner<'k, S, K>
where
    S: StealthSuite,
    K: ScanKey<S::Curve>,
{
    /// Creates a scanner over `keys`.
    pub fn new(keys: &'k K) -> Self {
        Self {
            keys,
            _suite: PhantomData,
        }
    }

    /// Checks a single announcement.
    ///
    /// Errors are per-entry: a caller scanning a sequence should skip the
    /// entry and continue.
    pub fn check(&self, announcement: &Announcement) -> Result<ScanOutcome<K::Output>> {
        if announcement.scheme_id != S::SCHEME_ID {
            return Ok(ScanOutcome::OtherScheme);
        }

        let ephemeral =
            decode_public_key::<S::Curve>(announcement.ephemeral_public_key.as_bytes())?;
        let shared = recipient_shared_secret::<S::Curve>(self.keys.viewing_secret(), &ephemeral)?;
        let hash = hash_shared_secret::<S>(&shared);

        if !verify_view_tag(&hash, &announcement.view_tag) {
            return Ok(ScanOutcome::ViewTagMismatch);
        }

        match self.keys.resolve(&hash, &announcement.stealth_address)? {
            Some(output) => Ok(ScanOutcome::Discovered(output)),
            None => {
                debug!(
                    stealth_address = %announcement.stealth_address,
                    "view tag matched but address differs"
                );
                Ok(ScanOutcome::FalsePositive)
            }
        }
    }

    /// Lazily scans a sequence, yielding every entry that belongs to us.
    ///
    /// Stop pulling from the iterator to end the scan early.
    pub fn scan<I>(&self, entries: I) -> Scan<'k, S, K, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsAnnouncement,
    {
        self.scan_with_diagnostics(entries, &NoDiagnostics)
    }

    /// Like [`scan`](Self::scan), reporting skipped entries to `diagnostics`.
    pub fn scan_with_diagnostics<I>(
        &self,
        entries: I,
        diagnostics: &'k dyn ScanDiagnostics,
    ) -> Scan<'k, S, K, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsAnnouncement,
    {
        Scan {
            scanner: *self,
            entries: entries.into_iter(),
            diagnostics,
            position: 0,
            stats: ScanStats::new(),
        }
    }

    /// Scans a materialised batch, preserving input order in the output.
    ///
    /// With the `parallel` feature the per-entry checks run on the rayon
    /// pool; diagnostics are still delivered in input order.
    pub fn scan_batch<T>(
        &self,
        entries: Vec<T>,
        diagnostics: &dyn ScanDiagnostics,
    ) -> (Vec<Discovery<T, K::Output>>, ScanStats)
    where
        T: AsAnnouncement + Sync,
    {
        let start = Instant::now();
        let results = self.check_all(&entries);

        let mut stats = ScanStats::new();
        let mut discoveries = Vec::new();
        for (position, (entry, result)) in entries.into_iter().zip(results).enumerate() {
            stats.record(&result);
            match result {
                Ok(ScanOutcome::Discovered(keys)) => discoveries.push(Discovery { entry, keys }),
                Ok(_) => {}
                Err(e) => diagnostics.skipped(position as u64, entry.announcement(), &e),
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        (discoveries, stats)
    }

    #[cfg(feature = "parallel")]
    fn check_all<T>(&self, entries: &[T]) -> Vec<Result<ScanOutcome<K::Output>>>
    where
        T: AsAnnouncement + Sync,
    {
        use rayon::prelude::*;

        entries
            .par_iter()
            .map(|entry| self.check(entry.announcement()))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn check_all<T>(&self, entries: &[T]) -> Vec<Result<ScanOutcome<K::Output>>>
    where
        T: AsAnnouncement + Sync,
    {
        entries
            .iter()
            .map(|entry| self.check(entry.announcement()))
            .collect()
    }
}

/// Lazy scan iterator returned by [`AnnouncementScanner::scan`].
pub struct Scan<'k, S: StealthSuite, K, I> {
    scanner: AnnouncementScanner<'k, S, K>,
    entries: I,
    diagnostics: &'k dyn ScanDiagnostics,
    position: u64,
    stats: ScanStats,
}

impl<'k, S: StealthSuite, K, I> Scan<'k, S, K, I> {
    /// Counters for the entries pulled so far.
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}

impl<'k, S, K, I> Iterator for Scan<'k, S, K, I>
where
    S: StealthSuite,
    K: ScanKey<S::Curve>,
    I: Iterator,
    I::Item: AsAnnouncement,
{
    type Item = Discovery<I::Item, K::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.entries.next()?;
            let position = self.position;
            self.position += 1;

            let result = self.scanner.check(entry.announcement());
            self.stats.record(&result);

            match result {
                Ok(ScanOutcome::Discovered(keys)) => return Some(Discovery { entry, keys }),
                Ok(_) => continue,
                Err(e) => self.diagnostics.skipped(position, entry.announcement(), &e),
            }
        }
    }
}

/// Checks one announcement against full recipient keys.
pub fn check_announcement<S: StealthSuite>(
    announcement: &Announcement,
    keys: &RecipientKeys<S::Curve>,
) -> Result<ScanOutcome<StealthKeyPair<S::Curve>>> {
    AnnouncementScanner::<S, _>::new(keys).check(announcement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{generate_stealth_address, StealthPaymentBuilder};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use shade_core::constants::SCHEME_ID_SECP256K1;
    use shade_core::types::{EncodedPublicKey, Metadata, ViewTag};
    use shade_crypto::{DefaultSuite, EphemeralKeyPair, Secp256k1};
    use std::sync::Mutex;

    type Keys = RecipientKeys<Secp256k1>;

    fn recipient(seed: u64) -> Keys {
        RecipientKeys::generate(&mut ChaCha20Rng::seed_from_u64(seed)).unwrap()
    }

    fn announce_to(keys: &Keys) -> Announcement {
        let meta = keys.meta_address(SCHEME_ID_SECP256K1).unwrap();
        StealthPaymentBuilder::new()
            .recipient(meta)
            .build()
            .unwrap()
            .announcement
    }

    fn scanner(keys: &Keys) -> AnnouncementScanner<'_, DefaultSuite, Keys> {
        AnnouncementScanner::new(keys)
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

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_round_trip(recipient_seed in any::<u64>(), ephemeral_seed in any::<u64>()) {
            let keys = recipient(recipient_seed);
            let ephemeral = EphemeralKeyPair::<Secp256k1>::generate(
                &mut ChaCha20Rng::seed_from_u64(ephemeral_seed),
            ).unwrap();

            let generated = generate_stealth_address::<DefaultSuite>(
                keys.spending().public(),
                keys.viewing().public(),
                ephemeral,
            ).unwrap();
            let expected_address = generated.stealth_address;
            let announcement = generated.into_announcement(SCHEME_ID_SECP256K1, Metadata::empty());

            let found: Vec<_> = scanner(&keys).scan(vec![announcement]).collect();
            prop_assert_eq!(found.len(), 1);

            let pair = &found[0].keys;
            prop_assert_eq!(*pair.address(), expected_address);
            let recomputed = Secp256k1::generator_multiply(pair.secret()).unwrap();
            prop_assert_eq!(&recomputed, pair.public());
            prop_assert_eq!(Secp256k1::point_to_address(&recomputed), expected_address);
        }
    }

    #[test]
    fn test_non_recipient_rejected() {
        let alice = recipient(1);
        let bob = recipient(2);
        let announcement = announce_to(&alice);

        let outcome = scanner(&bob).check(&announcement).unwrap();
        assert!(matches!(outcome, ScanOutcome::ViewTagMismatch));
        assert_eq!(scanner(&bob).scan(vec![announcement]).count(), 0);
    }

    #[test]
    fn test_false_positive_caught_by_address() {
        let alice = recipient(3);
        let mut announcement = announce_to(&alice);
        announcement.stealth_address = Address::from_array([0x42; 20]);

        let outcome = scanner(&alice).check(&announcement).unwrap();
        assert!(matches!(outcome, ScanOutcome::FalsePositive));
    }

    #[test]
    fn test_other_scheme_skipped_without_error() {
        let alice = recipient(4);
        let mut announcement = announce_to(&alice);
        announcement.scheme_id = 2;

        let outcome = scanner(&alice).check(&announcement).unwrap();
        assert!(matches!(outcome, ScanOutcome::OtherScheme));
    }

    #[test]
    fn test_malformed_entry_skipped_and_reported() {
        let alice = recipient(5);
        let reported = Mutex::new(Vec::new());
        let sink = |position: u64, _: &Announcement, error: &ShadeError| {
            reported.lock().unwrap().push((position, error.is_skippable()));
        };

        let entries = vec![malformed(), announce_to(&alice), malformed()];
        let mut scan = scanner(&alice).scan_with_diagnostics(entries, &sink);
        let found: Vec<_> = scan.by_ref().collect();

        assert_eq!(found.len(), 1);
        assert_eq!(*reported.lock().unwrap(), vec![(0, true), (2, true)]);
        assert_eq!(scan.stats().skipped, 2);
        assert_eq!(scan.stats().discoveries, 1);
    }

    #[test]
    fn test_check_reports_malformed_key() {
        let alice = recipient(6);
        assert!(matches!(
            scanner(&alice).check(&malformed()),
            Err(ShadeError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_view_tag_determinism() {
        // Same shared secret through the sender path and the recipient path
        let alice = recipient(7);
        let mut rng = ChaCha20Rng::seed_from_u64(70);
        let ephemeral = EphemeralKeyPair::<Secp256k1>::generate(&mut rng).unwrap();
        let ephemeral_public = *ephemeral.public();
        let ephemeral_secret = *ephemeral.secret();

        let sender = shade_crypto::derive::sender_shared_secret::<Secp256k1>(
            &ephemeral_secret,
            alice.viewing().public(),
        )
        .unwrap();
        let recipient_side =
            recipient_shared_secret::<Secp256k1>(alice.viewing().secret(), &ephemeral_public)
                .unwrap();

        let sender_tag = hash_shared_secret::<DefaultSuite>(&sender).view_tag();
        let recipient_tag = hash_shared_secret::<DefaultSuite>(&recipient_side).view_tag();
        assert_eq!(sender_tag, recipient_tag);

        let generated = generate_stealth_address::<DefaultSuite>(
            alice.spending().public(),
            alice.viewing().public(),
            ephemeral,
        )
        .unwrap();
        assert_eq!(generated.view_tag, recipient_tag);
    }

    #[test]
    fn test_scenario_one_entry_log() {
        let recipient_keys = recipient(8);
        let unrelated = recipient(9);
        let meta = recipient_keys.meta_address(SCHEME_ID_SECP256K1).unwrap();

        let payment = StealthPaymentBuilder::new().recipient(meta).build().unwrap();
        let log = vec![LogEntry {
            offset: 0,
            caller: None,
            timestamp: 0,
            announcement: payment.announcement.clone(),
        }];

        assert_eq!(scanner(&unrelated).scan(log.iter()).count(), 0);

        let found: Vec<_> = scanner(&recipient_keys).scan(log.iter()).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entry.offset, 0);
        assert_eq!(*found[0].keys.address(), payment.stealth_address);
        assert!(found[0].keys.validate());
    }

    #[test]
    fn test_view_only_scan() {
        let alice = recipient(10);
        let bob = recipient(11);
        let entries = vec![announce_to(&bob), announce_to(&alice)];
        let expected = entries[1].stealth_address;

        let viewing = alice.viewing_key();
        let view_only = AnnouncementScanner::<DefaultSuite, _>::new(&viewing);
        let found: Vec<_> = view_only.scan(&entries).collect();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].keys.address, expected);
    }

    #[test]
    fn test_scan_batch_preserves_order() {
        let alice = recipient(12);
        let bob = recipient(13);

        let mut entries = Vec::new();
        for i in 0..12 {
            let owner = if i % 3 == 0 { &alice } else { &bob };
            entries.push(LogEntry {
                offset: i,
                caller: None,
                timestamp: 0,
                announcement: announce_to(owner),
            });
        }
        entries.push(LogEntry {
            offset: 12,
            caller: None,
            timestamp: 0,
            announcement: malformed(),
        });

        let (found, stats) = scanner(&alice).scan_batch(entries, &NoDiagnostics);
        let offsets: Vec<u64> = found.iter().map(|d| d.entry.offset).collect();

        assert_eq!(offsets, vec![0, 3, 6, 9]);
        assert_eq!(stats.total_scanned, 13);
        assert_eq!(stats.discoveries, 4);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_early_termination() {
        let alice = recipient(14);
        let entries: Vec<_> = (0..5).map(|_| announce_to(&alice)).collect();

        let mut scan = scanner(&alice).scan(&entries);
        assert!(scan.next().is_some());
        assert_eq!(scan.stats().total_scanned, 1);
    }

    #[test]
    fn test_scan_stats() {
        let mut stats = ScanStats::new();
        stats.record::<()>(&Ok(ScanOutcome::ViewTagMismatch));
        stats.record::<()>(&Ok(ScanOutcome::Discovered(())));
        stats.record::<()>(&Ok(ScanOutcome::FalsePositive));
        stats.record::<()>(&Err(ShadeError::MalformedKey("x".into())));

        assert_eq!(stats.total_scanned, 4);
        assert_eq!(stats.view_tag_matches, 2);
        assert_eq!(stats.discoveries, 1);
        assert_eq!(stats.false_positives, 1);
        assert_eq!(stats.skipped, 1);
        assert!((stats.filter_efficiency() - 50.0).abs() < f64::EPSILON);
    }
}
