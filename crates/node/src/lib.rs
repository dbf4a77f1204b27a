//! GridLink Node - the networking-node orchestrator.
//!
//! Ties the security policy, the forwarding decision engine and the routing
//! table into one per-message pipeline, plus the connection lifecycle
//! (attach/detach of peer transport bindings) and an origination API for
//! messages this node sends itself.

pub mod error;
pub mod node;

pub use error::{NodeError, Result};
pub use node::{NetworkingNode, PeerLink, PipelineOutcome};
