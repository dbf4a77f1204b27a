//! Error types for message routing.

use gridlink_core::NodeIdentity;
use thiserror::Error;

/// Errors from routing table lookups.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No binding is registered (or still fresh) for the destination
    #[error("No route to destination {destination}")]
    NoRoute { destination: NodeIdentity },
}

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;
