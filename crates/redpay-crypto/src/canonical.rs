//! Deterministic field list used as the HMAC input.
//!
//! A payload becomes `key1value1key2value2...` where keys are sorted
//! byte-wise, `null` fields and the `signature` field are dropped, and each
//! value is its compact JSON text (strings keep their quotes, nested objects
//! are rendered whole with sorted keys).
//!
//! Sorting is done here rather than left to `serde_json::Map`, whose
//! iteration order follows insertion once `preserve_order` is enabled
//! anywhere in the dependency graph.

use serde::Serialize;
use serde_json::Value;

use crate::error::CryptoError;

/// Reserved field carrying the signature. Never part of its own input.
pub const SIGNATURE_FIELD: &str = "signature";

/// Sorted `(field, value)` pairs of a payload.
pub fn canonical_fields<T: Serialize + ?Sized>(
    payload: &T,
) -> Result<Vec<(String, String)>, CryptoError> {
    let value = serde_json::to_value(payload)?;
    let Value::Object(fields) = value else {
        return Err(CryptoError::UnsupportedPayload(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    };

    let mut pairs = fields
        .into_iter()
        .filter(|(key, value)| key != SIGNATURE_FIELD && !value.is_null())
        .map(|(key, value)| -> Result<_, CryptoError> {
            let mut rendered = String::new();
            write_canonical(&value, &mut rendered)?;
            Ok((key, rendered))
        })
        .collect::<Result<Vec<_>, _>>()?;
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}

/// Concatenated canonical string of a payload.
pub fn base_string<T: Serialize + ?Sized>(payload: &T) -> Result<String, CryptoError> {
    let fields = canonical_fields(payload)?;
    let mut out = String::with_capacity(fields.iter().map(|(k, v)| k.len() + v.len()).sum());
    for (key, value) in &fields {
        out.push_str(key);
        out.push_str(value);
    }
    Ok(out)
}

/// Compact JSON with object keys sorted at every depth.
fn write_canonical(value: &Value, out: &mut String) -> Result<(), CryptoError> {
    match value {
        Value::Object(fields) => {
            let mut entries: Vec<(&String, &Value)> = fields.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (idx, (key, nested)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(nested, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
