//! Message envelopes and digital signatures.
//!
//! The transport layer produces [`MessageEnvelope`] values; the security core
//! treats the payload as opaque JSON except for the canonical byte form
//! needed for signing. Binary transports use [`BinaryMessageEnvelope`], whose
//! payload is hashed directly without canonicalization.
//!
//! A [`Signature`] is created at sign time and mutated exactly once
//! afterwards: verification updates its [`SignatureStatus`] in place.

use crate::types::{NetworkPath, NodeIdentity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level payload field carrying the message context in canonical form.
pub const CONTEXT_FIELD: &str = "context";

/// Namespaced tag identifying a message's semantic type.
///
/// Used as the matching key for signing rules, verification rules, and
/// forwarding decision hooks (e.g. `ocpp/charging/profile`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContext(String);

impl MessageContext {
    /// Create a context tag.
    pub fn new(context: impl Into<String>) -> Self {
        Self(context.into())
    }

    /// The raw tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageContext {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Verification status of a signature.
///
/// `Unverified` until a verification pass runs; `DropMessage` and
/// `RejectMessage` record a policy *decision* the caller must enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureStatus {
    /// Not yet checked, or accepted without verification
    Unverified,
    /// Policy decided the carrying message must be dropped
    DropMessage,
    /// Policy decided the carrying message must be rejected
    RejectMessage,
    /// Cryptographic verification succeeded
    ValidSignature,
    /// Cryptographic verification failed
    InvalidSignature,
}

/// A digital signature attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Key identifier: hex-encoded SEC1 public key of the signer
    pub key_id: String,
    /// DER-encoded ECDSA signature bytes
    pub value: Vec<u8>,
    /// Signature algorithm tag (named curve, e.g. `secp256r1`)
    pub algorithm: String,
    /// Signing method applied over the canonical bytes
    pub signing_method: String,
    /// Encoding of the signature value
    pub encoding_method: String,
    /// Optional human-readable signer name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional description of why the signature was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional signing timestamp (Unix epoch milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Verification status, mutated in place during verification
    #[serde(default = "default_status")]
    pub status: SignatureStatus,
}

fn default_status() -> SignatureStatus {
    SignatureStatus::Unverified
}

impl Signature {
    /// Create a fresh, unverified signature.
    pub fn new(key_id: impl Into<String>, value: Vec<u8>, algorithm: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            value,
            algorithm: algorithm.into(),
            signing_method: "ecdsa".to_string(),
            encoding_method: "der".to_string(),
            name: None,
            description: None,
            timestamp: None,
            status: SignatureStatus::Unverified,
        }
    }
}

/// Bare signing key material a caller may attach to an outbound message.
///
/// Hints are never serialized onto the wire; they exist only between message
/// construction and the signing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyHint {
    /// Named-curve algorithm tag for this key pair
    pub algorithm: String,
    /// Hex-encoded private scalar
    pub private_key_hex: String,
    /// Hex-encoded SEC1 public key
    pub public_key_hex: String,
}

/// Signing key material enriched with static signer metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SignerInfoHint {
    /// The key material
    pub key: KeyHint,
    /// Signer name to stamp on the resulting signature
    pub name: Option<String>,
    /// Description to stamp on the resulting signature
    pub description: Option<String>,
    /// Timestamp to stamp on the resulting signature
    pub timestamp: Option<u64>,
}

/// A JSON message envelope as produced by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Unique message identification (request/response correlation key)
    pub identification: String,
    /// Declared message context
    pub context: MessageContext,
    /// Logical sender
    pub source: NodeIdentity,
    /// Logical destination
    pub destination: NodeIdentity,
    /// Hops traversed so far
    #[serde(default)]
    pub network_path: NetworkPath,
    /// Opaque message payload
    pub payload: serde_json::Value,
    /// Attached signatures
    #[serde(default)]
    pub signatures: Vec<Signature>,
    /// Signing keys attached by the caller, not serialized
    #[serde(skip)]
    pub sign_keys: Vec<KeyHint>,
    /// Signer-info objects attached by the caller, not serialized
    #[serde(skip)]
    pub sign_infos: Vec<SignerInfoHint>,
}

impl MessageEnvelope {
    /// Create an envelope with an empty path and no signatures.
    pub fn new(
        identification: impl Into<String>,
        context: MessageContext,
        source: NodeIdentity,
        destination: NodeIdentity,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            identification: identification.into(),
            context,
            source,
            destination,
            network_path: NetworkPath::new(),
            payload,
            signatures: Vec::new(),
            sign_keys: Vec::new(),
            sign_infos: Vec::new(),
        }
    }

    /// Inject the declared context as a top-level payload field if absent.
    ///
    /// The canonical byte form always includes the context, so signing and
    /// verification apply this before hashing.
    pub fn ensure_context_field(&mut self) {
        if let serde_json::Value::Object(map) = &mut self.payload {
            if !map.contains_key(CONTEXT_FIELD) {
                map.insert(
                    CONTEXT_FIELD.to_string(),
                    serde_json::Value::String(self.context.as_str().to_string()),
                );
            }
        }
    }
}

/// A message envelope whose payload is already an opaque byte sequence.
///
/// Signing and verification hash the payload directly; there is no canonical
/// JSON form. The control flow is otherwise identical to the JSON path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryMessageEnvelope {
    /// Unique message identification
    pub identification: String,
    /// Declared message context
    pub context: MessageContext,
    /// Logical sender
    pub source: NodeIdentity,
    /// Logical destination
    pub destination: NodeIdentity,
    /// Hops traversed so far
    #[serde(default)]
    pub network_path: NetworkPath,
    /// Opaque binary payload
    pub payload: Vec<u8>,
    /// Attached signatures
    #[serde(default)]
    pub signatures: Vec<Signature>,
    /// Signing keys attached by the caller, not serialized
    #[serde(skip)]
    pub sign_keys: Vec<KeyHint>,
    /// Signer-info objects attached by the caller, not serialized
    #[serde(skip)]
    pub sign_infos: Vec<SignerInfoHint>,
}

impl BinaryMessageEnvelope {
    /// Create a binary envelope with an empty path and no signatures.
    pub fn new(
        identification: impl Into<String>,
        context: MessageContext,
        source: NodeIdentity,
        destination: NodeIdentity,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            identification: identification.into(),
            context,
            source,
            destination,
            network_path: NetworkPath::new(),
            payload,
            signatures: Vec::new(),
            sign_keys: Vec::new(),
            sign_infos: Vec::new(),
        }
    }
}
