//! Pluggable signature metadata generators.
//!
//! Signing rules may carry an annotator that produces a signer name,
//! description and timestamp against the concrete message being signed.
//! Modeling this as a capability trait keeps the policy code free of raw
//! function pointers while remaining pluggable.

use gridlink_core::{BinaryMessageEnvelope, MessageEnvelope};
use std::time::{SystemTime, UNIX_EPOCH};

/// The message a signature is being generated for.
///
/// JSON and binary envelopes share the signing control flow, so annotators
/// see either through one borrow.
#[derive(Debug, Clone, Copy)]
pub enum SignTarget<'a> {
    /// A JSON message envelope
    Json(&'a MessageEnvelope),
    /// A binary message envelope
    Binary(&'a BinaryMessageEnvelope),
}

impl SignTarget<'_> {
    /// The message identification of the target.
    pub fn identification(&self) -> &str {
        match self {
            SignTarget::Json(envelope) => &envelope.identification,
            SignTarget::Binary(envelope) => &envelope.identification,
        }
    }

    /// The declared context of the target.
    pub fn context(&self) -> &gridlink_core::MessageContext {
        match self {
            SignTarget::Json(envelope) => &envelope.context,
            SignTarget::Binary(envelope) => &envelope.context,
        }
    }
}

/// Per-message generator for optional signature metadata.
///
/// Every method defaults to "nothing to add"; implementors override the
/// pieces they care about.
pub trait SignatureAnnotator: Send + Sync {
    /// Human-readable signer name for the resulting signature.
    fn signer_name(&self, _target: &SignTarget<'_>) -> Option<String> {
        None
    }

    /// Description for the resulting signature.
    fn description(&self, _target: &SignTarget<'_>) -> Option<String> {
        None
    }

    /// Timestamp (Unix epoch milliseconds) for the resulting signature.
    fn timestamp(&self, _target: &SignTarget<'_>) -> Option<u64> {
        None
    }
}

/// Annotator with fixed name/description and an optional current-time stamp.
#[derive(Debug, Clone, Default)]
pub struct StaticAnnotator {
    /// Signer name to stamp on every signature
    pub name: Option<String>,
    /// Description to stamp on every signature
    pub description: Option<String>,
    /// Stamp the signing time onto every signature
    pub stamp_time: bool,
}

impl SignatureAnnotator for StaticAnnotator {
    fn signer_name(&self, _target: &SignTarget<'_>) -> Option<String> {
        self.name.clone()
    }

    fn description(&self, _target: &SignTarget<'_>) -> Option<String> {
        self.description.clone()
    }

    fn timestamp(&self, _target: &SignTarget<'_>) -> Option<u64> {
        if self.stamp_time {
            Some(current_timestamp())
        } else {
            None
        }
    }
}

/// Get current timestamp in milliseconds.
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
