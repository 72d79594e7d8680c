//! Lenient field deserialisers for reference artifacts.
//!
//! The artifacts are produced by a separate pipeline and are loosely typed:
//! numbers arrive as JSON numbers, numeric strings or `null`, and codes arrive
//! as either strings or integers. Each helper here states one defaulting rule
//! and every record schema opts into it with `deserialize_with`.
//! Anything that does not resolve to a finite number becomes `0`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn number_to_text(n: &serde_json::Number) -> String {
    if n.is_f64() {
        // Integral floats like `4601.0` render as `4601`.
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => number_to_text(n),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Number, numeric string or null → `f64`; unparseable → `0.0`.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64).unwrap_or(0.0))
}

/// Like [`number`] but keeps absence distinct from zero.
pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// Calendar year stored as a number or string.
pub fn year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_to_f64)
        .map(|y| y.round() as i32)
        .unwrap_or(0))
}

/// String or integer code → trimmed `String`.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_to_text).unwrap_or_default())
}

/// Optional display text; blank strings collapse to `None`.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .map(value_to_text)
        .filter(|s| !s.is_empty()))
}

/// Coerce an arbitrary caller-supplied amount to a finite number (0 otherwise).
pub fn coerce_amount(raw: Option<f64>) -> f64 {
    raw.filter(|v| v.is_finite()).unwrap_or(0.0)
}
