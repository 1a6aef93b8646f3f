//! Domain records exchanged between repositories, REST clients and services.
//!
//! # Responsibility
//! - Define the row shapes each program reads and writes.
//! - Keep name-pattern rules (split lines, publishing names, DOIs) in one place.
//!
//! # Invariants
//! - Models carry no database handles; they are plain owned data.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub mod doi;
pub mod line;
pub mod stock;

/// Renders a loosely typed JSON scalar as text.
///
/// The records service mixes strings and numbers for the same field, so
/// callers normalize through this helper. `null` maps to `None`.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

/// Reads a JSON scalar as an integer, accepting numeric strings.
pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn de_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{value_to_i64, value_to_text};
    use serde_json::json;

    #[test]
    fn scalar_values_render_as_text() {
        assert_eq!(value_to_text(&json!("abc")).as_deref(), Some("abc"));
        assert_eq!(value_to_text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(value_to_text(&json!(null)), None);
    }

    #[test]
    fn numeric_strings_parse_as_integers() {
        assert_eq!(value_to_i64(&json!(" 17 ")), Some(17));
        assert_eq!(value_to_i64(&json!(17)), Some(17));
        assert_eq!(value_to_i64(&json!("x17")), None);
    }
}
