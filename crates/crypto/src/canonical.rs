//! Canonical message form used as the hashing input.
//!
//! The canonical form is a deterministic byte representation of a message
//! with its signature list removed. serde_json keeps object keys in sorted
//! (BTreeMap) order, so the output is stable under property reordering
//! introduced by transport-level parsing. Signing and verification use the
//! exact same function, so a sign-then-verify round trip over an unmodified
//! message always succeeds.

use crate::error::Result;
use gridlink_core::MessageEnvelope;
use serde::Serialize;
use serde_json::{Map, Value};

/// Produce the canonical byte form of a JSON message envelope.
///
/// Covers identification, context and payload. Routing headers (source,
/// destination, network path) mutate at every hop and are excluded, as is
/// the signature list. The context tag is included both as a top-level
/// canonical field and, when the payload is an object, inside the payload
/// (callers inject it via `MessageEnvelope::ensure_context_field` before
/// signing).
pub fn canonical_bytes(envelope: &MessageEnvelope) -> Result<Vec<u8>> {
    let mut root = Map::new();
    root.insert(
        "identification".to_string(),
        Value::String(envelope.identification.clone()),
    );
    root.insert(
        "context".to_string(),
        Value::String(envelope.context.as_str().to_string()),
    );
    root.insert("payload".to_string(), envelope.payload.clone());

    let bytes = serde_json::to_vec(&Value::Object(root))?;
    Ok(bytes)
}

/// Canonical byte form of an arbitrary serializable value.
///
/// Round-trips through `serde_json::Value` so that object keys come out in
/// sorted order regardless of struct field order.
pub fn canonical_bytes_of<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let bytes = serde_json::to_vec(&value)?;
    Ok(bytes)
}
