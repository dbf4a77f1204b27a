//! Declarative policy configuration.
//!
//! A [`PolicyConfig`] is the serialized form of a [`SignaturePolicy`]:
//! defaults, validity window, rule lists and key material as plain data.
//! This crate stays I/O-free; the node service deserializes the file and
//! hands the parsed value to [`SignaturePolicy::from_config`].

use crate::error::{PolicyError, Result};
use crate::policy::SignaturePolicy;
use crate::rules::{SigningAction, SigningRule, VerificationAction, VerificationRule};
use gridlink_core::Signature;
use gridlink_crypto::KeyPair;
use serde::{Deserialize, Serialize};

/// Hex-encoded key pair as it appears in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPairConfig {
    /// Named-curve algorithm tag
    pub algorithm: String,
    /// Hex-encoded private scalar
    pub private_key_hex: String,
    /// Hex-encoded SEC1 public key
    pub public_key_hex: String,
}

impl From<&KeyPairConfig> for KeyPair {
    fn from(config: &KeyPairConfig) -> Self {
        KeyPair::new(
            config.algorithm.clone(),
            config.private_key_hex.clone(),
            config.public_key_hex.clone(),
        )
    }
}

/// One signing rule entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningRuleConfig {
    /// Context pattern, exact or `...`-terminated prefix
    pub context: String,
    /// Action for matching outbound messages
    pub action: SigningAction,
    /// Explicit priority; omitted means "highest so far plus one"
    #[serde(default)]
    pub priority: Option<u32>,
    /// Key pair for `sign` rules
    #[serde(default)]
    pub key_pair: Option<KeyPairConfig>,
}

/// One verification rule entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRuleConfig {
    /// Context pattern, exact or `...`-terminated prefix
    pub context: String,
    /// Action for matching inbound messages
    pub action: VerificationAction,
    /// Explicit priority; omitted means "highest so far plus one"
    #[serde(default)]
    pub priority: Option<u32>,
}

/// Full serialized policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Policy identification
    pub identification: String,
    /// Policy priority among sibling policies
    #[serde(default)]
    pub priority: u8,
    /// Validity window start, epoch milliseconds
    #[serde(default)]
    pub not_before: u64,
    /// Validity window end, epoch milliseconds; open-ended when absent
    #[serde(default)]
    pub not_after: Option<u64>,
    /// Fallback action for outbound messages no rule matches
    pub default_signing_action: SigningAction,
    /// Default signing key pair; required when the default action is `sign`
    #[serde(default)]
    pub default_signing_keys: Option<KeyPairConfig>,
    /// Fallback action for inbound messages no rule matches
    pub default_verification_action: VerificationAction,
    /// Default verification key pair; required for verifying defaults
    #[serde(default)]
    pub default_verification_keys: Option<KeyPairConfig>,
    /// Signing rules, applied in listed order for priority assignment
    #[serde(default)]
    pub signing_rules: Vec<SigningRuleConfig>,
    /// Verification rules, applied in listed order for priority assignment
    #[serde(default)]
    pub verification_rules: Vec<VerificationRuleConfig>,
    /// Signatures over the policy object itself
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl SignaturePolicy {
    /// Build a policy from its serialized form.
    ///
    /// Enforces the same invariants as [`SignaturePolicy::new`], plus one
    /// only the declarative form can violate: a `sign` rule entry must carry
    /// a key pair.
    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        let policy = SignaturePolicy::new(
            config.identification.clone(),
            config.default_signing_action,
            config.default_signing_keys.as_ref().map(KeyPair::from),
            config.default_verification_action,
            config.default_verification_keys.as_ref().map(KeyPair::from),
        )?
        .with_priority(config.priority)
        .with_validity_window(config.not_before, config.not_after)
        .with_signatures(config.signatures.clone());

        for entry in &config.signing_rules {
            let mut rule = SigningRule::new(entry.context.as_str(), entry.action);
            if let Some(pair) = &entry.key_pair {
                rule = rule.with_key_pair(KeyPair::from(pair));
            }
            if entry.action == SigningAction::Sign && rule.key_pair.is_none() {
                return Err(PolicyError::Construction(format!(
                    "signing rule for context {} has action sign but no key pair",
                    entry.context
                )));
            }
            policy.add_signing_rule(rule, entry.priority);
        }

        for entry in &config.verification_rules {
            policy.add_verification_rule(
                VerificationRule::new(entry.context.as_str(), entry.action),
                entry.priority,
            );
        }

        Ok(policy)
    }
}
