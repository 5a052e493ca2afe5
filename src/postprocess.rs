// src/postprocess.rs
//! Shaping raw endpoint rows into caller-facing results.
//!
//! Three passes over the row list: unwrap the `[{result: {...}}, …]`
//! envelope some backends emit, decide whether the rows carry anything
//! worth showing, and redact columns the caller's role must not see.

use serde_json::Value;

use crate::roles::{Role, REDACTION_SENTINEL};

/// Rows after unwrapping and redaction, with the meaningful-data verdict.
#[derive(Debug, Clone)]
pub struct ProcessedRows {
    pub rows: Vec<Value>,
    pub meaningful: bool,
}

/// Run all three passes in order.
pub fn process(rows: Vec<Value>, role: Role) -> ProcessedRows {
    let mut rows = unwrap_envelope(rows);
    let meaningful = has_meaningful_data(&rows);
    redact(&mut rows, role);
    ProcessedRows { rows, meaningful }
}

// ============================================================================
// Envelope
// ============================================================================

/// Flatten `[{result: {...}}, …]` into the inner rows when the first
/// element carries a `result` key. Rows without the key pass through.
pub fn unwrap_envelope(rows: Vec<Value>) -> Vec<Value> {
    let enveloped = rows
        .first()
        .map_or(false, |row| row.get("result").is_some());
    if !enveloped {
        return rows;
    }
    rows.into_iter()
        .map(|row| match row {
            Value::Object(mut fields) => match fields.remove("result") {
                Some(inner) => inner,
                None => Value::Object(fields),
            },
            other => other,
        })
        .collect()
}

// ============================================================================
// Meaningful data
// ============================================================================

fn is_identifier_key(key: &str) -> bool {
    key == "id" || key.ends_with("_id") || key == "label" || key == "name"
}

/// A result set is meaningful when some row has a non-null value outside
/// the identifier and label fields. Rows made up solely of identifier and
/// label fields count as meaningful when any of those values is non-null.
pub fn has_meaningful_data(rows: &[Value]) -> bool {
    if rows.is_empty() {
        return false;
    }
    let mut saw_substantive_field = false;
    for row in rows {
        let Value::Object(fields) = row else {
            if !row.is_null() {
                return true;
            }
            continue;
        };
        for (key, value) in fields {
            if is_identifier_key(key) {
                continue;
            }
            saw_substantive_field = true;
            if !value.is_null() {
                return true;
            }
        }
    }
    if !saw_substantive_field {
        return rows.iter().any(|row| match row {
            Value::Object(fields) => fields.values().any(|value| !value.is_null()),
            other => !other.is_null(),
        });
    }
    false
}

// ============================================================================
// Redaction
// ============================================================================

/// Replace values of columns hidden from `role` with the sentinel. Row
/// shape is preserved: keys stay, values change.
pub fn redact(rows: &mut [Value], role: Role) {
    let hidden = role.hidden_columns();
    if hidden.is_empty() {
        return;
    }
    for row in rows {
        if let Value::Object(fields) = row {
            for (key, value) in fields.iter_mut() {
                if hidden.contains(&key.as_str()) {
                    *value = Value::String(REDACTION_SENTINEL.to_string());
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
