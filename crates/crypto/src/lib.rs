//! GridLink Crypto - signing primitives for the signature policy engine.
//!
//! # Core Components
//!
//! - **Canonicalizer**: deterministic, signature-stripped byte form of a
//!   message, used identically for signing and verification
//! - **CryptoEngine**: digest + ECDSA sign/verify over the named curve
//!   declared by a signature's algorithm tag
//! - **Key material**: per-curve key pairs with hex halves and private-key
//!   zeroization
//!
//! # Security Model
//!
//! - Signatures are deterministic (RFC 6979) for the same input
//! - The engine signs an already-computed digest; it never hashes twice
//! - Malformed key material fails the surrounding call with a descriptive
//!   error instead of panicking

pub mod canonical;
pub mod engine;
pub mod error;
pub mod keys;

pub use canonical::{canonical_bytes, canonical_bytes_of};
pub use engine::{hash, sign_digest, verify_digest, NamedCurve};
pub use error::{CryptoError, Result};
pub use keys::KeyPair;
