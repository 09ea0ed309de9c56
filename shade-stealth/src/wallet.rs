//! SHADE wallet implementation.
//!
//! The wallet manages a recipient's key pairs and provides high-level
//! operations for receiving stealth payments.

use std::marker::PhantomData;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use shade_core::constants::PROTOCOL_VERSION;
use shade_core::error::{Result, ShadeError};
use shade_core::types::{Announcement, StealthMetaAddress};
use shade_crypto::{
    encode_public_key, DefaultSuite, KeyPair, RecipientKeys, StealthKeyPair, StealthSuite,
    ViewingKey,
};

use crate::discovery::{
    AnnouncementScanner, AsAnnouncement, Discovery, ScanOutcome, TracingDiagnostics,
};

/// Configuration for wallet creation.
#[derive(Clone, Debug, Default)]
pub struct WalletConfig {
    /// Optional human-readable label
    pub label: Option<String>,
}

/// A SHADE wallet containing keys for receiving private payments.
///
/// The wallet holds:
/// - Spending keys: for deriving stealth private keys and spending funds
/// - Viewing keys: for scanning announcements (can be shared with auditors)
pub struct StealthWallet<S: StealthSuite = DefaultSuite> {
    keys: RecipientKeys<S::Curve>,
    meta_address: StealthMetaAddress,
    config: WalletConfig,
    _suite: PhantomData<fn() -> S>,
}

impl<S: StealthSuite> StealthWallet<S> {
    /// Generates a new wallet with random keys.
    ///
    /// ```rust
    /// use shade_stealth::StealthWallet;
    ///
    /// let wallet: StealthWallet = StealthWallet::generate().unwrap();
    /// println!("Meta-address: {}", wallet.meta_address());
    /// ```
    pub fn generate() -> Result<Self> {
        Self::generate_with_config(WalletConfig::default())
    }

    /// Generates a new wallet with custom configuration.
    pub fn generate_with_config(config: WalletConfig) -> Result<Self> {
        Self::generate_with_rng(&mut OsRng, config)
    }

    /// Generates a new wallet drawing keys from `rng`.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        rng: &mut R,
        config: WalletConfig,
    ) -> Result<Self> {
        let keys = RecipientKeys::generate(rng)?;
        let wallet = Self::from_keys(keys, config)?;
        info!(meta_address = %wallet.meta_address, "generated wallet");
        Ok(wallet)
    }

    /// Creates a wallet from existing keys.
    pub fn from_keys(keys: RecipientKeys<S::Curve>, config: WalletConfig) -> Result<Self> {
        let meta_address = keys.meta_address(S::SCHEME_ID)?;
        Ok(Self {
            keys,
            meta_address,
            config,
            _suite: PhantomData,
        })
    }

    /// Returns the meta-address for publishing.
    pub fn meta_address(&self) -> &StealthMetaAddress {
        &self.meta_address
    }

    /// Returns the recipient keys.
    pub fn keys(&self) -> &RecipientKeys<S::Curve> {
        &self.keys
    }

    /// Consumes the wallet, returning its keys.
    pub fn into_keys(self) -> RecipientKeys<S::Curve> {
        self.keys
    }

    /// Returns the wallet label, if any.
    pub fn label(&self) -> Option<&str> {
        self.config.label.as_deref()
    }

    /// A scanner bound to this wallet's keys.
    pub fn scanner(&self) -> AnnouncementScanner<'_, S, RecipientKeys<S::Curve>> {
        AnnouncementScanner::new(&self.keys)
    }

    /// Checks one announcement.
    ///
    /// `Ok(None)` when the announcement is not ours (including other schemes).
    pub fn try_discover(
        &self,
        announcement: &Announcement,
    ) -> Result<Option<StealthKeyPair<S::Curve>>> {
        Ok(match self.scanner().check(announcement)? {
            ScanOutcome::Discovered(pair) => Some(pair),
            _ => None,
        })
    }

    /// Scans a slice of entries. Malformed entries are skipped and logged.
    pub fn scan<'a, T: AsAnnouncement>(
        &'a self,
        entries: &'a [T],
    ) -> Vec<Discovery<&'a T, StealthKeyPair<S::Curve>>> {
        let mut scan = self
            .scanner()
            .scan_with_diagnostics(entries, &TracingDiagnostics);
        let found: Vec<_> = scan.by_ref().collect();
        debug!(
            scanned = scan.stats().total_scanned,
            found = found.len(),
            "wallet scan complete"
        );
        found
    }

    /// View-only capability for delegated scanning.
    pub fn viewing_key(&self) -> ViewingKey<S::Curve> {
        self.keys.viewing_key()
    }

    /// Exports the viewing key for third-party auditing.
    ///
    /// The export allows scanning for payments but not spending them.
    pub fn export_viewing_key(&self) -> Result<ViewingKeyExport> {
        Ok(ViewingKeyExport {
            scheme_id: S::SCHEME_ID,
            viewing_secret_key: self.keys.viewing().encoded_secret()?.to_hex(),
            spending_public_key: encode_public_key::<S::Curve>(self.keys.spending().public())?
                .to_hex(),
        })
    }

    /// Serializable key file (contains secrets).
    pub fn to_key_file(&self) -> Result<WalletKeyFile> {
        Ok(WalletKeyFile {
            version: PROTOCOL_VERSION,
            scheme_id: S::SCHEME_ID,
            spending_secret_key: self.keys.spending().encoded_secret()?.to_hex(),
            viewing_secret_key: self.keys.viewing().encoded_secret()?.to_hex(),
            meta_address: self.meta_address.to_meta_string(),
            label: self.config.label.clone(),
        })
    }

    /// Restores a wallet from a key file.
    ///
    /// Fails with `SchemeMismatch` for another suite's file and with
    /// `InvalidMetaAddress` when the stored meta-address does not match the
    /// secrets.
    pub fn from_key_file(file: &WalletKeyFile) -> Result<Self> {
        if file.version != PROTOCOL_VERSION {
            return Err(ShadeError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: file.version,
            });
        }
        S::ensure_scheme(file.scheme_id)?;

        let spending_secret = Zeroizing::new(hex::decode(&file.spending_secret_key)?);
        let viewing_secret = Zeroizing::new(hex::decode(&file.viewing_secret_key)?);
        let spending = KeyPair::from_secret_bytes(&spending_secret)?;
        let viewing = KeyPair::from_secret_bytes(&viewing_secret)?;
        let wallet = Self::from_keys(
            RecipientKeys::from_pairs(spending, viewing),
            WalletConfig {
                label: file.label.clone(),
            },
        )?;

        if wallet.meta_address.to_meta_string() != file.meta_address {
            return Err(ShadeError::InvalidMetaAddress(
                "stored meta-address does not match the key file secrets".into(),
            ));
        }
        Ok(wallet)
    }
}

impl<S: StealthSuite> std::fmt::Debug for StealthWallet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthWallet")
            .field("meta_address", &self.meta_address.to_meta_string())
            .field("config", &self.config)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Exported viewing key information.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ViewingKeyExport {
    /// Scheme id of the suite the keys belong to
    pub scheme_id: u64,
    /// Viewing secret key (hex)
    pub viewing_secret_key: String,
    /// Spending public key (hex)
    pub spending_public_key: String,
}

impl ViewingKeyExport {
    /// Rebuilds the viewing key.
    pub fn to_viewing_key<S: StealthSuite>(&self) -> Result<ViewingKey<S::Curve>> {
        S::ensure_scheme(self.scheme_id)?;
        let secret = Zeroizing::new(hex::decode(&self.viewing_secret_key)?);
        ViewingKey::from_bytes(&secret, &hex::decode(&self.spending_public_key)?)
    }
}

impl std::fmt::Debug for ViewingKeyExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewingKeyExport")
            .field("scheme_id", &self.scheme_id)
            .field("viewing_secret_key", &"[REDACTED]")
            .field("spending_public_key", &self.spending_public_key)
            .finish()
    }
}

/// Serializable wallet key file.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct WalletKeyFile {
    /// Version for forward compatibility
    pub version: u8,
    /// Scheme id of the suite
    pub scheme_id: u64,
    /// Spending secret key (hex)
    pub spending_secret_key: String,
    /// Viewing secret key (hex)
    pub viewing_secret_key: String,
    /// Meta-address string (`st:eth:0x...`)
    pub meta_address: String,
    /// Optional label
    pub label: Option<String>,
}

impl std::fmt::Debug for WalletKeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKeyFile")
            .field("version", &self.version)
            .field("scheme_id", &self.scheme_id)
            .field("meta_address", &self.meta_address)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
