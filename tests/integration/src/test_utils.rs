//! Shared fixtures for the scenario tests.

use gridlink_core::{MessageContext, MessageEnvelope, NodeIdentity};
use gridlink_crypto::KeyPair;
use gridlink_policy::rules::{SigningAction, VerificationAction};
use gridlink_policy::SignaturePolicy;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// A charging-station fixture with its own signing key pair.
pub struct TestStation {
    pub identity: NodeIdentity,
    pub key_pair: KeyPair,
}

impl TestStation {
    pub fn new(id: &str) -> Self {
        Self {
            identity: NodeIdentity::from(id),
            key_pair: KeyPair::generate("secp256r1"),
        }
    }

    /// Build an outbound envelope from this station.
    pub fn message(
        &self,
        identification: &str,
        context: &str,
        destination: &str,
        payload: serde_json::Value,
    ) -> MessageEnvelope {
        let mut envelope = MessageEnvelope::new(
            identification,
            MessageContext::from(context),
            self.identity.clone(),
            NodeIdentity::from(destination),
            payload,
        );
        envelope.network_path.push(self.identity.clone());
        envelope
    }
}

/// A policy that forwards and accepts everything.
pub fn open_policy(identification: &str) -> Arc<SignaturePolicy> {
    Arc::new(
        SignaturePolicy::new(
            identification,
            SigningAction::ForwardUnsigned,
            None,
            VerificationAction::AcceptUnverified,
            None,
        )
        .unwrap(),
    )
}

/// Initialize tracing once for test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
