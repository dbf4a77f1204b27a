//! The signature policy: sign/verify decisions plus execution.
//!
//! A policy composes one signing rule set, one verification rule set,
//! default actions/keys, a validity window, and the crypto engine. Signing
//! resolves signer credentials in a fixed order (explicit, message keys,
//! message signer infos, then matched-rule keys) and is all-or-nothing:
//! either every resolved credential produces a signature or the message is
//! left untouched. Verification marks every attached signature's status in
//! place and separates *decisions* (Drop/Reject, returned as `Ok` outcomes)
//! from *errors* (malformed material, failed crypto).

use crate::annotator::{SignTarget, SignatureAnnotator};
use crate::error::{PolicyError, Result};
use crate::rules::{
    SigningAction, SigningRule, SigningRuleSet, VerificationAction, VerificationRule,
    VerificationRuleSet,
};
use gridlink_core::{
    BinaryMessageEnvelope, KeyHint, MessageContext, MessageEnvelope, Signature, SignatureStatus,
    SignerInfoHint,
};
use gridlink_crypto::{canonical_bytes, engine, CryptoError, KeyPair};
use std::sync::Arc;

/// A resolved signer: key material plus optional signature metadata.
#[derive(Clone)]
pub struct SignerCredential {
    /// The key pair to sign with
    pub key_pair: KeyPair,
    /// Static signer name for the resulting signature
    pub name: Option<String>,
    /// Static description for the resulting signature
    pub description: Option<String>,
    /// Static timestamp for the resulting signature
    pub timestamp: Option<u64>,
    /// Per-message metadata generator, consulted when the static fields
    /// above are absent
    pub annotator: Option<Arc<dyn SignatureAnnotator>>,
}

impl SignerCredential {
    /// A credential carrying only key material.
    pub fn from_key_pair(key_pair: KeyPair) -> Self {
        Self {
            key_pair,
            name: None,
            description: None,
            timestamp: None,
            annotator: None,
        }
    }
}

impl From<&KeyHint> for SignerCredential {
    fn from(hint: &KeyHint) -> Self {
        Self::from_key_pair(KeyPair::from(hint))
    }
}

impl From<&SignerInfoHint> for SignerCredential {
    fn from(hint: &SignerInfoHint) -> Self {
        Self {
            key_pair: KeyPair::from(&hint.key),
            name: hint.name.clone(),
            description: hint.description.clone(),
            timestamp: hint.timestamp,
            annotator: None,
        }
    }
}

/// Successful result of a signing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutcome {
    /// Signatures were appended (count attached)
    Signed(usize),
    /// No signature requirement applied; send the message unsigned
    Unsigned,
    /// Policy decided the message must not be sent, silently
    Dropped,
    /// Policy decided the message must not be sent; tell the caller
    Rejected,
}

/// Successful result of a verification pass.
///
/// `Dropped`/`Rejected` are policy decisions the caller enforces by
/// inspecting the outcome (and the per-signature status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The message may continue through the pipeline
    Accepted,
    /// Policy decided the message must be silently discarded
    Dropped,
    /// Policy decided the message must be rejected back to its sender
    Rejected,
}

/// A signature policy instance.
pub struct SignaturePolicy {
    identification: String,
    priority: u8,
    not_before: u64,
    not_after: Option<u64>,
    default_verification_action: VerificationAction,
    /// Never an implicit signer: referenced only when callers build rules
    default_signing_keys: Option<KeyPair>,
    default_verification_keys: Option<KeyPair>,
    signing_rules: SigningRuleSet,
    verification_rules: VerificationRuleSet,
    /// Signatures attached to the policy object itself (from configuration)
    signatures: Vec<Signature>,
}

impl SignaturePolicy {
    /// Create a policy with the given defaults.
    ///
    /// Fails when the default signing action is `Sign` without a default
    /// signing key pair, or the default verification action is
    /// `VerifyAny`/`VerifyAll` without a default verification key pair.
    pub fn new(
        identification: impl Into<String>,
        default_signing_action: SigningAction,
        default_signing_keys: Option<KeyPair>,
        default_verification_action: VerificationAction,
        default_verification_keys: Option<KeyPair>,
    ) -> Result<Self> {
        if default_signing_action == SigningAction::Sign && default_signing_keys.is_none() {
            return Err(PolicyError::Construction(
                "default signing action is Sign but no default signing key pair is set".to_string(),
            ));
        }
        if matches!(
            default_verification_action,
            VerificationAction::VerifyAny | VerificationAction::VerifyAll
        ) && default_verification_keys.is_none()
        {
            return Err(PolicyError::Construction(
                "default verification action requires a default verification key pair".to_string(),
            ));
        }

        Ok(Self {
            identification: identification.into(),
            priority: 0,
            not_before: 0,
            not_after: None,
            default_verification_action,
            default_signing_keys,
            default_verification_keys,
            signing_rules: SigningRuleSet::new(default_signing_action),
            verification_rules: VerificationRuleSet::new(default_verification_action),
            signatures: Vec::new(),
        })
    }

    /// Set the policy validity window.
    pub fn with_validity_window(mut self, not_before: u64, not_after: Option<u64>) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    /// Set the policy priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Attach signatures carried by the policy object itself.
    pub fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.signatures = signatures;
        self
    }

    /// Policy identification.
    pub fn identification(&self) -> &str {
        &self.identification
    }

    /// Policy priority.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Whether the policy is active at the given time (epoch milliseconds).
    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms >= self.not_before && self.not_after.map_or(true, |until| now_ms <= until)
    }

    /// Signatures attached to the policy object.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The default signing key pair, when configured. It is never used as
    /// an implicit signer; callers reference it when building rules.
    pub fn default_signing_keys(&self) -> Option<&KeyPair> {
        self.default_signing_keys.as_ref()
    }

    /// The default verification key pair, when configured.
    pub fn default_verification_keys(&self) -> Option<&KeyPair> {
        self.default_verification_keys.as_ref()
    }

    /// Add a signing rule; unspecified priority is assigned max+1.
    pub fn add_signing_rule(&self, rule: SigningRule, priority: Option<u32>) -> u32 {
        self.signing_rules.add(rule, priority)
    }

    /// Add a verification rule; unspecified priority is assigned max+1.
    pub fn add_verification_rule(&self, rule: VerificationRule, priority: Option<u32>) -> u32 {
        self.verification_rules.add(rule, priority)
    }

    /// The signing rule set.
    pub fn signing_rules(&self) -> &SigningRuleSet {
        &self.signing_rules
    }

    /// The verification rule set.
    pub fn verification_rules(&self) -> &VerificationRuleSet {
        &self.verification_rules
    }

    /// Sign an outbound JSON message.
    ///
    /// Candidate credentials are resolved in fixed order: `explicit`, then
    /// the envelope's `sign_keys`, then its `sign_infos`, then — only when
    /// all of those were empty and the signing rule set actually matched the
    /// context — the key pairs carried by the matched rules. An empty
    /// candidate list follows the highest matching rule's action (the
    /// policy default when nothing matches): sending unsigned is not an
    /// error, but a required signature without credentials is.
    pub fn sign(
        &self,
        envelope: &mut MessageEnvelope,
        explicit: &[SignerCredential],
    ) -> Result<SignOutcome> {
        let candidates = self.resolve_candidates(
            &envelope.context,
            &envelope.sign_keys,
            &envelope.sign_infos,
            explicit,
        );
        if candidates.is_empty() {
            return self.unsigned_outcome(&envelope.context);
        }

        for candidate in &candidates {
            candidate.key_pair.validate()?;
        }

        envelope.ensure_context_field();
        let canonical = canonical_bytes(envelope)?;
        let signatures = {
            let target = SignTarget::Json(envelope);
            self.build_signatures(&canonical, &target, &candidates)?
        };

        let count = signatures.len();
        envelope.signatures.extend(signatures);
        tracing::debug!(
            identification = %envelope.identification,
            context = %envelope.context,
            count,
            "message signed"
        );
        Ok(SignOutcome::Signed(count))
    }

    /// Sign an outbound binary message.
    ///
    /// Identical control flow to [`SignaturePolicy::sign`], with
    /// canonicalization skipped: the binary payload is hashed directly.
    pub fn sign_binary(
        &self,
        envelope: &mut BinaryMessageEnvelope,
        explicit: &[SignerCredential],
    ) -> Result<SignOutcome> {
        let candidates = self.resolve_candidates(
            &envelope.context,
            &envelope.sign_keys,
            &envelope.sign_infos,
            explicit,
        );
        if candidates.is_empty() {
            return self.unsigned_outcome(&envelope.context);
        }

        for candidate in &candidates {
            candidate.key_pair.validate()?;
        }

        let signatures = {
            let target = SignTarget::Binary(envelope);
            self.build_signatures(&envelope.payload, &target, &candidates)?
        };

        let count = signatures.len();
        envelope.signatures.extend(signatures);
        Ok(SignOutcome::Signed(count))
    }

    /// Verify an inbound JSON message, updating every signature's status.
    pub fn verify(&self, envelope: &mut MessageEnvelope) -> Result<VerifyOutcome> {
        if envelope.signatures.is_empty() {
            return self.unsigned_inbound_outcome(&envelope.identification);
        }

        let rule = self.verification_rules.highest(&envelope.context);
        match rule.action {
            VerificationAction::AcceptUnverified => {
                mark_all(&mut envelope.signatures, SignatureStatus::Unverified);
                Ok(VerifyOutcome::Accepted)
            }
            VerificationAction::Drop => {
                mark_all(&mut envelope.signatures, SignatureStatus::DropMessage);
                Ok(VerifyOutcome::Dropped)
            }
            VerificationAction::Reject => {
                mark_all(&mut envelope.signatures, SignatureStatus::RejectMessage);
                Ok(VerifyOutcome::Rejected)
            }
            VerificationAction::VerifyAny | VerificationAction::VerifyAll => {
                envelope.ensure_context_field();
                let canonical = canonical_bytes(envelope)?;
                let identification = envelope.identification.clone();
                self.verify_signatures(
                    &canonical,
                    &mut envelope.signatures,
                    rule.action,
                    &identification,
                )
            }
        }
    }

    /// Verify an inbound binary message.
    ///
    /// Mirrors [`SignaturePolicy::verify`] with canonicalization skipped.
    pub fn verify_binary(&self, envelope: &mut BinaryMessageEnvelope) -> Result<VerifyOutcome> {
        if envelope.signatures.is_empty() {
            return self.unsigned_inbound_outcome(&envelope.identification);
        }

        let rule = self.verification_rules.highest(&envelope.context);
        match rule.action {
            VerificationAction::AcceptUnverified => {
                mark_all(&mut envelope.signatures, SignatureStatus::Unverified);
                Ok(VerifyOutcome::Accepted)
            }
            VerificationAction::Drop => {
                mark_all(&mut envelope.signatures, SignatureStatus::DropMessage);
                Ok(VerifyOutcome::Dropped)
            }
            VerificationAction::Reject => {
                mark_all(&mut envelope.signatures, SignatureStatus::RejectMessage);
                Ok(VerifyOutcome::Rejected)
            }
            VerificationAction::VerifyAny | VerificationAction::VerifyAll => {
                let payload = envelope.payload.clone();
                let identification = envelope.identification.clone();
                self.verify_signatures(
                    &payload,
                    &mut envelope.signatures,
                    rule.action,
                    &identification,
                )
            }
        }
    }

    fn unsigned_inbound_outcome(&self, identification: &str) -> Result<VerifyOutcome> {
        if self.default_verification_action == VerificationAction::AcceptUnverified {
            Ok(VerifyOutcome::Accepted)
        } else {
            Err(PolicyError::NoSignatures {
                identification: identification.to_string(),
            })
        }
    }

    fn unsigned_outcome(&self, context: &MessageContext) -> Result<SignOutcome> {
        let rule = self.signing_rules.highest(context);
        match rule.action {
            SigningAction::ForwardUnsigned => Ok(SignOutcome::Unsigned),
            SigningAction::Drop => Ok(SignOutcome::Dropped),
            SigningAction::Reject => Ok(SignOutcome::Rejected),
            SigningAction::Sign => Err(PolicyError::MissingSigningCredentials {
                context: context.to_string(),
            }),
        }
    }

    fn resolve_candidates(
        &self,
        context: &MessageContext,
        sign_keys: &[KeyHint],
        sign_infos: &[SignerInfoHint],
        explicit: &[SignerCredential],
    ) -> Vec<SignerCredential> {
        let mut candidates: Vec<SignerCredential> = explicit.to_vec();
        candidates.extend(sign_keys.iter().map(SignerCredential::from));
        candidates.extend(sign_infos.iter().map(SignerCredential::from));

        // Rule-derived keys apply only when nothing else produced a
        // candidate, and only on an actual rule match: the bare policy
        // default never signs.
        if candidates.is_empty() {
            for rule in self.signing_rules.matching(context) {
                if rule.action != SigningAction::Sign {
                    continue;
                }
                if let Some(key_pair) = rule.key_pair.clone() {
                    candidates.push(SignerCredential {
                        key_pair,
                        name: None,
                        description: None,
                        timestamp: None,
                        annotator: rule.annotator.clone(),
                    });
                }
            }
        }
        candidates
    }

    fn build_signatures(
        &self,
        input: &[u8],
        target: &SignTarget<'_>,
        candidates: &[SignerCredential],
    ) -> Result<Vec<Signature>> {
        let mut signatures = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let algorithm = candidate.key_pair.algorithm.clone();
            let digest = engine::hash(input, &algorithm);
            let private = candidate.key_pair.private_key_bytes()?;
            let der = engine::sign_digest(&digest, &private, &algorithm)?;

            let mut signature =
                Signature::new(candidate.key_pair.public_key_hex(), der, algorithm);
            let annotator = candidate.annotator.as_deref();
            signature.name = candidate
                .name
                .clone()
                .or_else(|| annotator.and_then(|a| a.signer_name(target)));
            signature.description = candidate
                .description
                .clone()
                .or_else(|| annotator.and_then(|a| a.description(target)));
            signature.timestamp = candidate
                .timestamp
                .or_else(|| annotator.and_then(|a| a.timestamp(target)));
            signatures.push(signature);
        }
        Ok(signatures)
    }

    fn verify_signatures(
        &self,
        input: &[u8],
        signatures: &mut [Signature],
        action: VerificationAction,
        identification: &str,
    ) -> Result<VerifyOutcome> {
        let verify_any = action == VerificationAction::VerifyAny;
        let mut first_failure: Option<String> = None;
        let mut all_valid = true;

        for (index, signature) in signatures.iter_mut().enumerate() {
            match check_signature(input, signature) {
                Ok(true) => {
                    signature.status = SignatureStatus::ValidSignature;
                    if verify_any {
                        // One valid signature suffices; the rest stay
                        // unverified.
                        return Ok(VerifyOutcome::Accepted);
                    }
                }
                Ok(false) => {
                    signature.status = SignatureStatus::InvalidSignature;
                    all_valid = false;
                    if first_failure.is_none() {
                        first_failure = Some(format!("signature {index} did not verify"));
                    }
                }
                Err(e) => {
                    signature.status = SignatureStatus::InvalidSignature;
                    all_valid = false;
                    if first_failure.is_none() {
                        first_failure = Some(e.to_string());
                    }
                }
            }
        }

        if all_valid && !verify_any {
            Ok(VerifyOutcome::Accepted)
        } else {
            Err(PolicyError::VerificationFailed {
                identification: identification.to_string(),
                reason: first_failure
                    .unwrap_or_else(|| "no signature could be verified".to_string()),
            })
        }
    }
}

fn mark_all(signatures: &mut [Signature], status: SignatureStatus) {
    for signature in signatures {
        signature.status = status;
    }
}

/// Check one signature against the hashing input. Key reconstruction and
/// crypto failures surface as errors for the caller to convert; they never
/// unwind through the message pipeline.
fn check_signature(input: &[u8], signature: &Signature) -> gridlink_crypto::Result<bool> {
    let public_key = hex::decode(&signature.key_id).map_err(|source| CryptoError::InvalidHex {
        field: "key_id",
        source,
    })?;
    let digest = engine::hash(input, &signature.algorithm);
    engine::verify_digest(&digest, &signature.value, &public_key, &signature.algorithm)
}
