//! Error types for the signature policy engine.

use gridlink_crypto::CryptoError;
use thiserror::Error;

/// Errors from policy construction, signing and verification.
///
/// Drop/Reject/AcceptUnverified outcomes are *not* errors; they are
/// successful policy evaluations returned through the outcome enums.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Default action / default key invariant violated at construction
    #[error("Policy construction failed: {0}")]
    Construction(String),

    /// Signing was required but no usable credential could be resolved
    #[error("No signing credentials resolved for context {context}")]
    MissingSigningCredentials { context: String },

    /// Key material or the crypto primitive failed during signing
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Verification was required but the message carries no signatures
    #[error("Message {identification} has no signatures")]
    NoSignatures { identification: String },

    /// Verification ran and did not accept the message
    #[error("Signature verification failed for message {identification}: {reason}")]
    VerificationFailed {
        identification: String,
        reason: String,
    },
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
