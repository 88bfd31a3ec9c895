//! # Error Handling
//!
//! This module provides the error types for SEA Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Key Material Errors (100-199)                                     │
//! │  │   ├── MissingKey            - No usable key and no resolver         │
//! │  │   └── InvalidKey            - Key string/JWK could not be decoded   │
//! │  │                                                                      │
//! │  ├── Envelope Errors (200-299)                                         │
//! │  │   ├── MalformedEnvelope     - Tagged value missing m/s or ct/iv/s   │
//! │  │   ├── SignatureMismatch     - Every verify strategy exhausted       │
//! │  │   └── Encoding              - hex/base64/text decoding failed       │
//! │  │                                                                      │
//! │  ├── Provider Errors (300-399)                                         │
//! │  │   └── ProviderFailure       - Engine rejected params or algorithm   │
//! │  │                                                                      │
//! │  ├── Policy Errors (400-499)                                           │
//! │  │   └── PolicyInvalid         - No policy or no certificants          │
//! │  │                                                                      │
//! │  └── Internal Errors (900-999)                                         │
//! │      └── Serialization         - JSON encode/decode failed             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every public operation on [`crate::Sea`] returns [`Result`]. Before a
//! failure is handed back it is copied into the context's diagnostic slot
//! (see [`crate::Sea::last_error`]), which is why `Error` is `Clone`.

use thiserror::Error;

/// Result type alias for SEA Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for SEA Core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Key Material Errors (100-199)
    // ========================================================================

    /// No key was supplied and no resolver could provide one
    #[error("Missing key: {0}")]
    MissingKey(String),

    /// A key string or JWK could not be turned into a usable key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ========================================================================
    // Envelope Errors (200-299)
    // ========================================================================

    /// A tagged value is missing required fields
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Every verification strategy was tried and none matched
    #[error("Signature did not match")]
    SignatureMismatch,

    /// A hex/base64/text field could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    // ========================================================================
    // Provider Errors (300-399)
    // ========================================================================

    /// The cryptographic provider rejected the parameters or algorithm
    #[error("Crypto provider failure: {0}")]
    ProviderFailure(String),

    // ========================================================================
    // Policy Errors (400-499)
    // ========================================================================

    /// Certification was asked for without a usable policy or certificants
    #[error("Invalid policy: {0}")]
    PolicyInvalid(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// - 100-199: Key material
    /// - 200-299: Envelopes and signatures
    /// - 300-399: Provider
    /// - 400-499: Policy
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::MissingKey(_) => 100,
            Error::InvalidKey(_) => 101,

            Error::MalformedEnvelope(_) => 200,
            Error::SignatureMismatch => 201,
            Error::Encoding(_) => 202,

            Error::ProviderFailure(_) => 300,

            Error::PolicyInvalid(_) => 400,

            Error::Serialization(_) => 900,
        }
    }

    /// Whether a compatibility fallback is allowed to retry after this error
    ///
    /// Missing keys and policy problems will fail identically on every
    /// strategy, so fallback chains stop early on them.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::MissingKey(_) | Error::PolicyInvalid(_))
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::ProviderFailure(format!("provider task aborted: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================
