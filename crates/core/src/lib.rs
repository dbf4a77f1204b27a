//! Core functionality for the GridLink OCPP networking stack.
//!
//! This crate provides the fundamental types shared across the GridLink
//! ecosystem: node identities, network paths, message envelopes with their
//! signature lists, daemon configuration, and logging bootstrap.

pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod types;

pub use config::{NodeConfig, RoutingConfig};
pub use error::{CoreError, Result};
pub use message::{
    BinaryMessageEnvelope, KeyHint, MessageContext, MessageEnvelope, Signature, SignatureStatus,
    SignerInfoHint, CONTEXT_FIELD,
};
pub use types::{NetworkPath, NodeIdentity};
