//! Node identities and hop tracking.
//!
//! Every participant in the charging network (charging station, local
//! controller, CSMS) is addressed by an opaque [`NodeIdentity`]. Messages
//! carry a [`NetworkPath`] recording the hops they traversed, which answers
//! "who do I reply to" and detects forwarding loops.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a participant in the charging network.
///
/// Used as the routing key and as the source/destination of every message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Create an identity from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered, append-only sequence of hops a message has traversed.
///
/// Grows by exactly one entry per hop. The last entry is the adjacent
/// upstream node, i.e. the peer a response must be sent back to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkPath {
    hops: Vec<NodeIdentity>,
}

impl NetworkPath {
    /// An empty path (message has not been relayed yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// A path starting at the given origin node.
    pub fn from_origin(origin: NodeIdentity) -> Self {
        Self { hops: vec![origin] }
    }

    /// Append one hop. Paths only ever grow.
    pub fn push(&mut self, hop: NodeIdentity) {
        self.hops.push(hop);
    }

    /// The node that originated the message, if the path is non-empty.
    pub fn origin(&self) -> Option<&NodeIdentity> {
        self.hops.first()
    }

    /// The adjacent upstream node (the hop to reply to).
    pub fn last(&self) -> Option<&NodeIdentity> {
        self.hops.last()
    }

    /// Whether the given node already appears in the path (loop detection).
    pub fn contains(&self, node: &NodeIdentity) -> bool {
        self.hops.iter().any(|hop| hop == node)
    }

    /// Number of recorded hops.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Whether the path is empty.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// The recorded hops, oldest first.
    pub fn hops(&self) -> &[NodeIdentity] {
        &self.hops
    }
}
