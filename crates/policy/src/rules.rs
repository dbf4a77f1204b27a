//! Context-scoped signing and verification rules.
//!
//! A rule maps a context pattern to an action with a priority; higher
//! priority wins. Patterns match a context exactly, or by prefix when they
//! end in the `...` wildcard marker: `ocpp/charging...` matches
//! `ocpp/charging/profile` but not `ocpp/other`.
//!
//! Rule collections are mutable at runtime from multiple callers, so each
//! set serializes access through a mutex. The lock covers only the vector
//! scan/mutation; cryptographic work happens outside it.

use crate::annotator::SignatureAnnotator;
use gridlink_core::MessageContext;
use gridlink_crypto::KeyPair;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Wildcard marker terminating a prefix pattern.
pub const WILDCARD: &str = "...";

/// A context pattern: exact tag, or prefix followed by `...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextPattern(String);

impl ContextPattern {
    /// Create a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Pattern matching every context.
    pub fn match_all() -> Self {
        Self(WILDCARD.to_string())
    }

    /// Whether this pattern matches the given context.
    pub fn matches(&self, context: &MessageContext) -> bool {
        match self.0.strip_suffix(WILDCARD) {
            Some(prefix) => context.as_str().starts_with(prefix),
            None => context.as_str() == self.0,
        }
    }

    /// The raw pattern string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextPattern {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Action an outbound message's matching signing rule prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningAction {
    /// Send the message without signatures
    ForwardUnsigned,
    /// Do not send the message, silently
    Drop,
    /// Do not send the message, tell the caller why
    Reject,
    /// Sign before sending
    Sign,
}

/// Action an inbound message's matching verification rule prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationAction {
    /// Accept without checking signatures
    AcceptUnverified,
    /// Decide the message must be dropped
    Drop,
    /// Decide the message must be rejected
    Reject,
    /// Accept if at least one signature verifies
    VerifyAny,
    /// Accept only if every signature verifies
    VerifyAll,
}

/// A signing rule. Immutable once added; priority is assigned by the owning
/// rule set at insertion.
#[derive(Clone)]
pub struct SigningRule {
    /// Context pattern this rule applies to
    pub pattern: ContextPattern,
    /// Priority, higher wins; 0 is reserved for the synthetic fallback
    pub priority: u32,
    /// What to do with a matching outbound message
    pub action: SigningAction,
    /// Key pair used when the action is `Sign`
    pub key_pair: Option<KeyPair>,
    /// Optional per-message metadata generator
    pub annotator: Option<Arc<dyn SignatureAnnotator>>,
}

impl SigningRule {
    /// Create a rule; the priority is assigned when it is added to a set.
    pub fn new(pattern: impl Into<ContextPattern>, action: SigningAction) -> Self {
        Self {
            pattern: pattern.into(),
            priority: 0,
            action,
            key_pair: None,
            annotator: None,
        }
    }

    /// Attach the key pair used for signing.
    pub fn with_key_pair(mut self, key_pair: KeyPair) -> Self {
        self.key_pair = Some(key_pair);
        self
    }

    /// Attach a metadata annotator.
    pub fn with_annotator(mut self, annotator: Arc<dyn SignatureAnnotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }
}

impl fmt::Debug for SigningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningRule")
            .field("pattern", &self.pattern)
            .field("priority", &self.priority)
            .field("action", &self.action)
            .field("key_pair", &self.key_pair)
            .field("annotator", &self.annotator.as_ref().map(|_| "<annotator>"))
            .finish()
    }
}

impl PartialEq for SigningRule {
    /// Structural equality; the annotator capability is not comparable and
    /// is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.priority == other.priority
            && self.action == other.action
            && self.key_pair == other.key_pair
    }
}

/// A verification rule. Immutable once added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRule {
    /// Context pattern this rule applies to
    pub pattern: ContextPattern,
    /// Priority, higher wins; 0 is reserved for the synthetic fallback
    pub priority: u32,
    /// What to do with a matching inbound message
    pub action: VerificationAction,
}

impl VerificationRule {
    /// Create a rule; the priority is assigned when it is added to a set.
    pub fn new(pattern: impl Into<ContextPattern>, action: VerificationAction) -> Self {
        Self {
            pattern: pattern.into(),
            priority: 0,
            action,
        }
    }
}

/// Ordered collection of signing rules guarded by a mutex.
pub struct SigningRuleSet {
    rules: Mutex<Vec<SigningRule>>,
    default_action: SigningAction,
}

impl SigningRuleSet {
    /// Create an empty set whose fallback rule carries `default_action`.
    pub fn new(default_action: SigningAction) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default_action,
        }
    }

    /// Insert a rule.
    ///
    /// When `priority` is `None`, the rule gets (max existing priority)+1,
    /// or 1 in an empty set. Returns the assigned priority.
    pub fn add(&self, mut rule: SigningRule, priority: Option<u32>) -> u32 {
        let mut rules = self.rules.lock().expect("signing rule lock poisoned");
        let assigned =
            priority.unwrap_or_else(|| rules.iter().map(|r| r.priority).max().map_or(1, |m| m + 1));
        rule.priority = assigned;
        rules.push(rule);
        assigned
    }

    /// Configured rules matching the context, in insertion order. Empty when
    /// nothing matches; no fallback is synthesized.
    pub fn matching(&self, context: &MessageContext) -> Vec<SigningRule> {
        let rules = self.rules.lock().expect("signing rule lock poisoned");
        rules
            .iter()
            .filter(|rule| rule.pattern.matches(context))
            .cloned()
            .collect()
    }

    /// Matching rules, or the synthetic priority-0 fallback when none match.
    pub fn lookup(&self, context: &MessageContext) -> Vec<SigningRule> {
        let matches = self.matching(context);
        if matches.is_empty() {
            vec![self.fallback()]
        } else {
            matches
        }
    }

    /// The single highest-priority matching rule, or the fallback.
    ///
    /// Equal priorities resolve to the most recently added rule.
    pub fn highest(&self, context: &MessageContext) -> SigningRule {
        let rules = self.rules.lock().expect("signing rule lock poisoned");
        let mut best: Option<&SigningRule> = None;
        for rule in rules.iter().filter(|rule| rule.pattern.matches(context)) {
            if best.map_or(true, |b| rule.priority >= b.priority) {
                best = Some(rule);
            }
        }
        best.cloned().unwrap_or_else(|| self.fallback())
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.rules.lock().expect("signing rule lock poisoned").len()
    }

    /// Whether no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fallback(&self) -> SigningRule {
        SigningRule {
            pattern: ContextPattern::match_all(),
            priority: 0,
            action: self.default_action,
            key_pair: None,
            annotator: None,
        }
    }
}

/// Ordered collection of verification rules guarded by a mutex.
pub struct VerificationRuleSet {
    rules: Mutex<Vec<VerificationRule>>,
    default_action: VerificationAction,
}

impl VerificationRuleSet {
    /// Create an empty set whose fallback rule carries `default_action`.
    pub fn new(default_action: VerificationAction) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default_action,
        }
    }

    /// Insert a rule; same priority assignment as the signing set.
    pub fn add(&self, mut rule: VerificationRule, priority: Option<u32>) -> u32 {
        let mut rules = self.rules.lock().expect("verification rule lock poisoned");
        let assigned =
            priority.unwrap_or_else(|| rules.iter().map(|r| r.priority).max().map_or(1, |m| m + 1));
        rule.priority = assigned;
        rules.push(rule);
        assigned
    }

    /// Matching rules, or the synthetic priority-0 fallback when none match.
    pub fn lookup(&self, context: &MessageContext) -> Vec<VerificationRule> {
        let rules = self.rules.lock().expect("verification rule lock poisoned");
        let matches: Vec<VerificationRule> = rules
            .iter()
            .filter(|rule| rule.pattern.matches(context))
            .cloned()
            .collect();
        if matches.is_empty() {
            vec![self.fallback()]
        } else {
            matches
        }
    }

    /// The single highest-priority matching rule, or the fallback.
    ///
    /// Equal priorities resolve to the most recently added rule.
    pub fn highest(&self, context: &MessageContext) -> VerificationRule {
        let rules = self.rules.lock().expect("verification rule lock poisoned");
        let mut best: Option<&VerificationRule> = None;
        for rule in rules.iter().filter(|rule| rule.pattern.matches(context)) {
            if best.map_or(true, |b| rule.priority >= b.priority) {
                best = Some(rule);
            }
        }
        best.cloned().unwrap_or_else(|| self.fallback())
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.rules
            .lock()
            .expect("verification rule lock poisoned")
            .len()
    }

    /// Whether no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fallback(&self) -> VerificationRule {
        VerificationRule {
            pattern: ContextPattern::match_all(),
            priority: 0,
            action: self.default_action,
        }
    }
}
