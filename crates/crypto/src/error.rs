//! Error types for GridLink crypto operations.

use thiserror::Error;

/// Errors that can occur during canonicalization, signing or verification.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Private key bytes missing or not a valid scalar for the curve
    #[error("Invalid private key for {algorithm}: {reason}")]
    InvalidPrivateKey { algorithm: String, reason: String },

    /// Public key bytes missing or not a valid SEC1 point on the curve
    #[error("Invalid public key for {algorithm}: {reason}")]
    InvalidPublicKey { algorithm: String, reason: String },

    /// Signature bytes are not valid DER
    #[error("Malformed signature encoding: {0}")]
    MalformedSignature(String),

    /// The signing primitive itself failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Hex decoding of key material failed
    #[error("Invalid hex in {field}: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    /// Message could not be canonicalized
    #[error("Canonicalization failed: {0}")]
    Canonicalization(#[from] serde_json::Error),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
