//! Application-pluggable forwarding decisions.
//!
//! After a relayed message passes signature verification, the hosting
//! application gets a veto: a hook registered for the message's context can
//! let it through, bounce it, swallow it, or substitute a different message.
//! Contexts without a hook forward unchanged.

use gridlink_core::{MessageContext, MessageEnvelope};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// What to do with a verified relayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardingOutcome {
    /// Relay the message unchanged
    Forward,
    /// Do not relay; report the rejection to the sender
    Reject,
    /// Do not relay, silently
    Drop,
    /// Relay a substitute message instead of the original
    Replace,
}

/// A hook's verdict, with the data each outcome needs.
#[derive(Debug, Clone)]
pub struct ForwardingDecision {
    /// The chosen outcome
    pub outcome: ForwardingOutcome,
    /// Substitute message; present exactly when the outcome is `Replace`
    pub replacement: Option<MessageEnvelope>,
    /// Prebuilt response sent back to the sender on `Reject` of a request
    pub rejection: Option<MessageEnvelope>,
    /// Human-readable reason, carried on `Reject` and `Drop`
    pub reason: Option<String>,
}

impl ForwardingDecision {
    /// Relay the message unchanged.
    pub fn forward() -> Self {
        Self {
            outcome: ForwardingOutcome::Forward,
            replacement: None,
            rejection: None,
            reason: None,
        }
    }

    /// Bounce the message back to its sender.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            outcome: ForwardingOutcome::Reject,
            replacement: None,
            rejection: None,
            reason: Some(reason.into()),
        }
    }

    /// Bounce a request back to its sender with a prebuilt response.
    pub fn reject_with_response(reason: impl Into<String>, response: MessageEnvelope) -> Self {
        Self {
            outcome: ForwardingOutcome::Reject,
            replacement: None,
            rejection: Some(response),
            reason: Some(reason.into()),
        }
    }

    /// Swallow the message without telling anyone.
    pub fn drop(reason: impl Into<String>) -> Self {
        Self {
            outcome: ForwardingOutcome::Drop,
            replacement: None,
            rejection: None,
            reason: Some(reason.into()),
        }
    }

    /// Relay `replacement` in place of the original message.
    ///
    /// The substitute counts as originated by this node: the pipeline signs
    /// it under the local signing rules before sending.
    pub fn replace(replacement: MessageEnvelope) -> Self {
        Self {
            outcome: ForwardingOutcome::Replace,
            replacement: Some(replacement),
            rejection: None,
            reason: None,
        }
    }
}

/// Hook function deciding the fate of a verified relayed message.
pub type DecisionHook = Arc<dyn Fn(&MessageEnvelope) -> ForwardingDecision + Send + Sync>;

/// Registry of forwarding hooks keyed by exact message context.
pub struct DecisionEngine {
    hooks: Mutex<HashMap<MessageContext, DecisionHook>>,
}

impl DecisionEngine {
    /// Create an engine with no hooks; everything forwards.
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(HashMap::new()),
        }
    }

    /// Register (or replace) the hook for a context.
    pub fn register(&self, context: MessageContext, hook: DecisionHook) {
        let mut hooks = self.hooks.lock().expect("decision hook lock poisoned");
        hooks.insert(context, hook);
    }

    /// Remove the hook for a context.
    pub fn unregister(&self, context: &MessageContext) {
        let mut hooks = self.hooks.lock().expect("decision hook lock poisoned");
        hooks.remove(context);
    }

    /// Decide the fate of a message. No hook means forward.
    ///
    /// The hook is cloned out before it runs so the registry lock is not
    /// held across application code.
    pub fn decide(&self, envelope: &MessageEnvelope) -> ForwardingDecision {
        let hook = {
            let hooks = self.hooks.lock().expect("decision hook lock poisoned");
            hooks.get(&envelope.context).cloned()
        };
        match hook {
            Some(hook) => hook(envelope),
            None => ForwardingDecision::forward(),
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.hooks.lock().expect("decision hook lock poisoned").len();
        f.debug_struct("DecisionEngine").field("hooks", &count).finish()
    }
}
