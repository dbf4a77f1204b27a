//! GridLink Routing - destination bindings and forwarding decisions.
//!
//! Two concerns live here:
//!
//! - **Routing table**: maps logical node identities to transport bindings,
//!   last-writer-wins, with optional binding aging
//! - **Decision engine**: per-context application hooks that can forward,
//!   reject, drop or replace a verified relayed message

pub mod error;
pub mod forwarding;
pub mod table;

pub use error::{Result, RoutingError};
pub use forwarding::{DecisionEngine, DecisionHook, ForwardingDecision, ForwardingOutcome};
pub use table::RoutingTable;
