//! Error types for SHADE.
//!
//! Protocol errors are fatal to the single operation that raised them. During a
//! multi-entry scan, per-entry errors (see [`ShadeError::is_skippable`]) only
//! cause that entry to be skipped.

use thiserror::Error;

/// Result type alias using `ShadeError`.
pub type Result<T> = std::result::Result<T, ShadeError>;

/// Main error type for all SHADE operations.
#[derive(Debug, Error)]
pub enum ShadeError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CRYPTOGRAPHIC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Scalar is zero or outside the scalar field.
    #[error("Invalid scalar: {0}")]
    InvalidScalar(String),

    /// Point is off the curve, or is the identity where a non-identity is required.
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    /// Key encoding has the wrong length or format.
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// The shared secret collapsed to the identity element.
    /// The caller must retry with a fresh ephemeral key.
    #[error("Shared secret derivation failed: result is the identity element")]
    SharedSecretDerivationFailed,

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Keys or announcements were produced for a different curve/hash suite.
    #[error("Scheme mismatch: expected scheme {expected}, got {actual}")]
    SchemeMismatch {
        /// Scheme id of the configured suite
        expected: u64,
        /// Scheme id found in the input
        actual: u64,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STEALTH ADDRESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Invalid meta-address format or content.
    #[error("Invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    /// Invalid address encoding.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid announcement format.
    #[error("Invalid announcement: {0}")]
    InvalidAnnouncement(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // COLLABORATOR ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Registry write rejected for this caller.
    #[error("Authorization failed: {caller} may not register keys for {registrant}")]
    AuthorizationFailed {
        /// Account attempting the write
        caller: String,
        /// Account whose keys would be written
        registrant: String,
    },

    /// Announcement log is unavailable or corrupted.
    #[error("Announcement log error: {0}")]
    LogError(String),

    /// Storage format version mismatch.
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Version found
        actual: u8,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION / INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════
    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ShadeError {
    /// Returns true if this is a cryptographic input error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            ShadeError::InvalidScalar(_)
                | ShadeError::InvalidPoint(_)
                | ShadeError::MalformedKey(_)
                | ShadeError::SharedSecretDerivationFailed
        )
    }

    /// Returns true if a scan may skip the offending entry and continue.
    ///
    /// Everything else (log I/O, configuration) must be propagated.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ShadeError::InvalidScalar(_)
                | ShadeError::InvalidPoint(_)
                | ShadeError::MalformedKey(_)
                | ShadeError::SharedSecretDerivationFailed
                | ShadeError::InvalidAnnouncement(_)
                | ShadeError::InvalidAddress(_)
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ShadeError::ValidationError(_)
                | ShadeError::InvalidMetaAddress(_)
                | ShadeError::InvalidAddress(_)
                | ShadeError::InvalidAnnouncement(_)
                | ShadeError::VersionMismatch { .. }
        )
    }
}
