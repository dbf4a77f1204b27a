//! Signing key material.
//!
//! A [`KeyPair`] carries both halves of an ECDSA key as hex strings together
//! with the named-curve algorithm tag they belong to. The private half is
//! zeroized when the pair is dropped.

use crate::engine::{self, NamedCurve};
use crate::error::{CryptoError, Result};
use gridlink_core::message::KeyHint;
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroize;

/// An ECDSA key pair on a named curve.
#[derive(Clone, PartialEq)]
pub struct KeyPair {
    /// Algorithm tag naming the curve (e.g. `secp256r1`)
    pub algorithm: String,
    private_key_hex: String,
    public_key_hex: String,
}

impl KeyPair {
    /// Build a key pair from hex-encoded halves.
    ///
    /// No parsing happens here; call [`KeyPair::validate`] before use.
    pub fn new(
        algorithm: impl Into<String>,
        private_key_hex: impl Into<String>,
        public_key_hex: impl Into<String>,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            private_key_hex: private_key_hex.into(),
            public_key_hex: public_key_hex.into(),
        }
    }

    /// Generate a fresh key pair on the curve named by `algorithm`.
    ///
    /// Unrecognized algorithm tags fall back to the default curve, matching
    /// the verification-side curve selection.
    pub fn generate(algorithm: impl Into<String>) -> Self {
        let algorithm = algorithm.into();
        let (private_key_hex, public_key_hex) = match NamedCurve::from_algorithm(&algorithm) {
            NamedCurve::Secp256r1 => {
                let key = p256::ecdsa::SigningKey::random(&mut OsRng);
                let public = key.verifying_key().to_encoded_point(false);
                (hex::encode(key.to_bytes()), hex::encode(public.as_bytes()))
            }
            NamedCurve::Secp384r1 => {
                let key = p384::ecdsa::SigningKey::random(&mut OsRng);
                let public = key.verifying_key().to_encoded_point(false);
                (hex::encode(key.to_bytes()), hex::encode(public.as_bytes()))
            }
            NamedCurve::Secp521r1 => {
                let key = p521::ecdsa::SigningKey::random(&mut OsRng);
                let public = p521::ecdsa::VerifyingKey::from(&key).to_encoded_point(false);
                (hex::encode(key.to_bytes()), hex::encode(public.as_bytes()))
            }
        };

        Self {
            algorithm,
            private_key_hex,
            public_key_hex,
        }
    }

    /// Decoded private scalar bytes.
    pub fn private_key_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.private_key_hex).map_err(|source| CryptoError::InvalidHex {
            field: "private_key",
            source,
        })
    }

    /// Decoded SEC1 public key bytes.
    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.public_key_hex).map_err(|source| CryptoError::InvalidHex {
            field: "public_key",
            source,
        })
    }

    /// Hex-encoded public key, used as the signature key id.
    pub fn public_key_hex(&self) -> &str {
        &self.public_key_hex
    }

    /// Check that both halves decode and parse on the declared curve.
    ///
    /// Fails with an error naming the half that is unusable, so callers can
    /// report exactly which check failed.
    pub fn validate(&self) -> Result<()> {
        let private = self.private_key_bytes()?;
        engine::validate_private_key(&private, &self.algorithm)?;

        let public = self.public_key_bytes()?;
        engine::validate_public_key(&public, &self.algorithm)?;
        Ok(())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("private_key_hex", &"<redacted>")
            .field("public_key_hex", &self.public_key_hex)
            .finish()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private_key_hex.zeroize();
    }
}

impl From<&KeyHint> for KeyPair {
    fn from(hint: &KeyHint) -> Self {
        Self::new(
            hint.algorithm.clone(),
            hint.private_key_hex.clone(),
            hint.public_key_hex.clone(),
        )
    }
}
