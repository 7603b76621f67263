//! Decode overseer JSON into typed actions
//!
//! The overseer is a language model: any element of its `actions` array
//! can be missing fields, carry an unknown `type`, or not be an object at
//! all. A bad element is logged and skipped; its siblings still decode.

use super::PendingAction;
use crate::core::error::{Result, WardenError};
use serde_json::Value;
use tracing::warn;

/// Decode one element of an `actions` array
///
/// Pure and side-effect free; the failure carries the discriminant when
/// one was present so logs stay readable.
pub fn decode(value: &Value) -> Result<PendingAction> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| WardenError::DecodeAction("missing `type` discriminant".into()))?;

    serde_json::from_value(value.clone())
        .map_err(|err| WardenError::DecodeAction(format!("{kind}: {err}")))
}

/// Decode a whole batch, skipping elements that fail
pub fn decode_batch(values: &[Value]) -> Vec<PendingAction> {
    values
        .iter()
        .filter_map(|value| match decode(value) {
            Ok(action) => Some(action),
            Err(err) => {
                warn!(%err, "skipping undecodable action");
                None
            }
        })
        .collect()
}
