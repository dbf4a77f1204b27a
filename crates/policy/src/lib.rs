//! GridLink Policy - the signature policy engine.
//!
//! Decides, per message context, whether a message must be signed before it
//! is sent or verified after it is received, and performs the actual
//! signing/verification.
//!
//! # Core Components
//!
//! - **Rule sets**: priority-ordered, context-scoped signing and
//!   verification rules with wildcard matching and "highest priority wins"
//!   lookup
//! - **SignaturePolicy**: composes the two rule sets, default actions/keys,
//!   a validity window, and the crypto engine
//! - **Annotators**: pluggable per-message signer-name / description /
//!   timestamp generators attached to signing rules
//!
//! Drop/Reject verification results are successful policy *decisions*; the
//! caller (the networking node) enforces them. Only malformed signatures,
//! unusable key material and crypto failures are errors.

pub mod annotator;
pub mod config;
pub mod error;
pub mod policy;
pub mod rules;

pub use annotator::{SignTarget, SignatureAnnotator, StaticAnnotator};
pub use config::{KeyPairConfig, PolicyConfig, SigningRuleConfig, VerificationRuleConfig};
pub use error::{PolicyError, Result};
pub use policy::{SignOutcome, SignaturePolicy, SignerCredential, VerifyOutcome};
pub use rules::{
    ContextPattern, SigningAction, SigningRule, SigningRuleSet, VerificationAction,
    VerificationRule, VerificationRuleSet,
};
