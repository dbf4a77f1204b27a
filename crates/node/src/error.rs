//! Error types for the networking node.

use gridlink_policy::PolicyError;
use gridlink_routing::RoutingError;
use thiserror::Error;

/// Errors aborting the pipeline for a single message.
///
/// Each variant is fatal for the message it occurred on and for nothing
/// else; the node keeps processing subsequent messages.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Signing or verification failed
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// No binding for the destination
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// The resolved transport binding refused the message
    #[error("Transport error: {0}")]
    Transport(String),

    /// The cancellation signal fired between pipeline steps
    #[error("Processing of message {identification} was cancelled")]
    Cancelled { identification: String },
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
