//! Destination-to-binding routing table.
//!
//! Maps a logical node identity to whatever the transport layer uses to
//! reach it (a channel sender, a connection handle). The table is generic
//! over the binding type so tests can route over plain values.
//!
//! Registration is last-writer-wins: a node that reconnects through a new
//! transport silently supersedes its previous binding, which is exactly the
//! behavior a flapping charging station needs.

use crate::error::{Result, RoutingError};
use gridlink_core::NodeIdentity;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One registered binding together with its registration time.
#[derive(Debug, Clone)]
struct RoutingEntry<B> {
    binding: B,
    priority: u8,
    registered_at: Instant,
}

/// Concurrent routing table.
///
/// Lookup clones the binding out under the lock; bindings are expected to be
/// cheap handles (channel senders, `Arc`s).
pub struct RoutingTable<B> {
    entries: Mutex<HashMap<NodeIdentity, RoutingEntry<B>>>,
    /// Bindings older than this are treated as absent; `None` disables aging
    max_binding_age: Option<Duration>,
}

impl<B: Clone> RoutingTable<B> {
    /// Create an empty table with binding aging disabled.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_binding_age: None,
        }
    }

    /// Enable binding aging: entries older than `age` stop resolving and are
    /// removed by [`RoutingTable::reap`].
    pub fn with_max_binding_age(mut self, age: Duration) -> Self {
        self.max_binding_age = Some(age);
        self
    }

    /// Register or replace the binding for a destination.
    ///
    /// Replacement is unconditional regardless of the priorities involved;
    /// a reconnecting node always gets its latest binding. Returns the
    /// superseded binding when the destination was already registered.
    pub fn set(&self, destination: NodeIdentity, binding: B, priority: u8) -> Option<B> {
        let mut entries = self.entries.lock().expect("routing table lock poisoned");
        let previous = entries.insert(
            destination.clone(),
            RoutingEntry {
                binding,
                priority,
                registered_at: Instant::now(),
            },
        );
        if previous.is_some() {
            tracing::debug!(%destination, "routing binding superseded");
        }
        previous.map(|entry| entry.binding)
    }

    /// Resolve the binding for a destination.
    ///
    /// Stale entries fail the lookup as if absent; they linger in the map
    /// until the next [`RoutingTable::reap`].
    pub fn resolve(&self, destination: &NodeIdentity) -> Result<B> {
        let entries = self.entries.lock().expect("routing table lock poisoned");
        entries
            .get(destination)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.binding.clone())
            .ok_or_else(|| RoutingError::NoRoute {
                destination: destination.clone(),
            })
    }

    /// Remove the binding for a destination, returning it if present.
    pub fn remove(&self, destination: &NodeIdentity) -> Option<B> {
        let mut entries = self.entries.lock().expect("routing table lock poisoned");
        entries.remove(destination).map(|entry| entry.binding)
    }

    /// Drop every stale entry; returns how many were removed.
    ///
    /// A no-op when binding aging is disabled.
    pub fn reap(&self) -> usize {
        let Some(max_age) = self.max_binding_age else {
            return 0;
        };
        let mut entries = self.entries.lock().expect("routing table lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| entry.registered_at.elapsed() <= max_age);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "reaped stale routing bindings");
        }
        removed
    }

    /// Registered priority of a destination's binding, fresh or stale.
    pub fn priority_of(&self, destination: &NodeIdentity) -> Option<u8> {
        let entries = self.entries.lock().expect("routing table lock poisoned");
        entries.get(destination).map(|entry| entry.priority)
    }

    /// Whether a fresh binding exists for the destination.
    pub fn contains(&self, destination: &NodeIdentity) -> bool {
        self.resolve(destination).is_ok()
    }

    /// Number of registered entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("routing table lock poisoned")
            .len()
    }

    /// Whether the table holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &RoutingEntry<B>) -> bool {
        self.max_binding_age
            .map_or(true, |max_age| entry.registered_at.elapsed() <= max_age)
    }
}

impl<B: Clone> Default for RoutingTable<B> {
    fn default() -> Self {
        Self::new()
    }
}
