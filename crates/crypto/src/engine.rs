//! ECDSA signing engine.
//!
//! The engine is parametrized by the named curve derived from a signature's
//! declared algorithm tag. Digest width follows the curve: the two
//! higher-strength curves hash with SHA-512, everything else with SHA-256.
//! Signing operates on the already-computed digest (prehash mode); the
//! engine never hashes a second time.

use crate::error::{CryptoError, Result};
use sha2::{Digest, Sha256, Sha512};
use signature::hazmat::{PrehashSigner, PrehashVerifier};

/// Curves supported by the signing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedCurve {
    /// NIST P-256, the default curve
    Secp256r1,
    /// NIST P-384
    Secp384r1,
    /// NIST P-521
    Secp521r1,
}

impl NamedCurve {
    /// Select the curve for an algorithm tag.
    ///
    /// Unrecognized tags map to the default curve so that verification of a
    /// message with an unknown algorithm degrades to a deterministic check
    /// instead of an error.
    pub fn from_algorithm(algorithm: &str) -> Self {
        match algorithm.to_ascii_lowercase().as_str() {
            "secp384r1" => NamedCurve::Secp384r1,
            "secp521r1" => NamedCurve::Secp521r1,
            _ => NamedCurve::Secp256r1,
        }
    }
}

/// Hash `bytes` with the digest selected by the algorithm tag.
///
/// `secp384r1` and `secp521r1` map to SHA-512 (64-byte digest), all other
/// algorithms map to SHA-256 (32-byte digest).
pub fn hash(bytes: &[u8], algorithm: &str) -> Vec<u8> {
    match NamedCurve::from_algorithm(algorithm) {
        NamedCurve::Secp384r1 | NamedCurve::Secp521r1 => Sha512::digest(bytes).to_vec(),
        NamedCurve::Secp256r1 => Sha256::digest(bytes).to_vec(),
    }
}

/// Sign an already-computed digest, returning a DER-encoded signature.
///
/// Deterministic (RFC 6979): the same digest and key always produce the same
/// signature bytes.
pub fn sign_digest(digest: &[u8], private_key: &[u8], algorithm: &str) -> Result<Vec<u8>> {
    match NamedCurve::from_algorithm(algorithm) {
        NamedCurve::Secp256r1 => {
            let secret = p256::SecretKey::from_slice(private_key).map_err(|e| {
                CryptoError::InvalidPrivateKey {
                    algorithm: algorithm.to_string(),
                    reason: e.to_string(),
                }
            })?;
            let signing_key = p256::ecdsa::SigningKey::from(secret);
            let signature: p256::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        NamedCurve::Secp384r1 => {
            let secret = p384::SecretKey::from_slice(private_key).map_err(|e| {
                CryptoError::InvalidPrivateKey {
                    algorithm: algorithm.to_string(),
                    reason: e.to_string(),
                }
            })?;
            let signing_key = p384::ecdsa::SigningKey::from(secret);
            let signature: p384::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        NamedCurve::Secp521r1 => {
            let secret = p521::SecretKey::from_slice(private_key).map_err(|e| {
                CryptoError::InvalidPrivateKey {
                    algorithm: algorithm.to_string(),
                    reason: e.to_string(),
                }
            })?;
            let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
                .map_err(|e| CryptoError::InvalidPrivateKey {
                    algorithm: algorithm.to_string(),
                    reason: e.to_string(),
                })?;
            let signature: p521::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
    }
}

/// Verify a DER-encoded signature against an already-computed digest.
///
/// The public key point is reconstructed from SEC1 bytes on the curve named
/// by the algorithm tag. Returns `Ok(false)` for a well-formed but invalid
/// signature; malformed keys or signature encodings are errors.
pub fn verify_digest(
    digest: &[u8],
    signature_der: &[u8],
    public_key: &[u8],
    algorithm: &str,
) -> Result<bool> {
    match NamedCurve::from_algorithm(algorithm) {
        NamedCurve::Secp256r1 => {
            let verifying_key =
                p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(|e| {
                    CryptoError::InvalidPublicKey {
                        algorithm: algorithm.to_string(),
                        reason: e.to_string(),
                    }
                })?;
            let signature = p256::ecdsa::Signature::from_der(signature_der)
                .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
            Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
        }
        NamedCurve::Secp384r1 => {
            let verifying_key =
                p384::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(|e| {
                    CryptoError::InvalidPublicKey {
                        algorithm: algorithm.to_string(),
                        reason: e.to_string(),
                    }
                })?;
            let signature = p384::ecdsa::Signature::from_der(signature_der)
                .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
            Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
        }
        NamedCurve::Secp521r1 => {
            let verifying_key =
                p521::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(|e| {
                    CryptoError::InvalidPublicKey {
                        algorithm: algorithm.to_string(),
                        reason: e.to_string(),
                    }
                })?;
            let signature = p521::ecdsa::Signature::from_der(signature_der)
                .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
            Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
        }
    }
}

/// Check that private key bytes form a valid scalar on the named curve.
pub fn validate_private_key(private_key: &[u8], algorithm: &str) -> Result<()> {
    let invalid = |e: p256::elliptic_curve::Error| CryptoError::InvalidPrivateKey {
        algorithm: algorithm.to_string(),
        reason: e.to_string(),
    };
    match NamedCurve::from_algorithm(algorithm) {
        NamedCurve::Secp256r1 => p256::SecretKey::from_slice(private_key)
            .map(|_| ())
            .map_err(invalid),
        NamedCurve::Secp384r1 => p384::SecretKey::from_slice(private_key)
            .map(|_| ())
            .map_err(invalid),
        NamedCurve::Secp521r1 => p521::SecretKey::from_slice(private_key)
            .map(|_| ())
            .map_err(invalid),
    }
}

/// Check that public key bytes form a valid SEC1 point on the named curve.
pub fn validate_public_key(public_key: &[u8], algorithm: &str) -> Result<()> {
    let result = match NamedCurve::from_algorithm(algorithm) {
        NamedCurve::Secp256r1 => p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map(|_| ()),
        NamedCurve::Secp384r1 => p384::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map(|_| ()),
        NamedCurve::Secp521r1 => p521::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map(|_| ()),
    };
    result.map_err(|e| CryptoError::InvalidPublicKey {
        algorithm: algorithm.to_string(),
        reason: e.to_string(),
    })
}
