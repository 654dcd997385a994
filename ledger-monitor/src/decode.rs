//! Ordered-fallback field access over loosely typed JSON payloads.
//!
//! Server payloads are not consistent about field names (`fee` vs `fee_amount`,
//! `converted_amount` vs `to_amount`). Each decoded field declares its priority list once
//! here instead of repeating fallback chains at every call site.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown for absent or empty values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Priority list for the conversion fee.
pub const FEE_FIELDS: &[&str] = &["fee", "fee_amount"];

/// Priority list for the converted amount, before falling back to `amount * rate`.
pub const CONVERTED_AMOUNT_FIELDS: &[&str] = &["converted_amount", "to_amount"];

/// Priority list for a server latency in milliseconds.
pub const LATENCY_FIELDS: &[&str] = &["latency", "latency_ms"];

/// First field in `fields` holding a JSON number.
pub fn first_number(raw: &Value, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .find_map(|field| raw.get(field).and_then(Value::as_f64))
}

/// First field in `fields` holding a non-empty JSON string.
pub fn first_string(raw: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        raw.get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Render a JSON value as display text.
///
/// Strings are taken verbatim, `null` renders as `null`, everything else renders as
/// compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Loose truthiness: `null`, `false`, `0` and `""` are false, everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Display text for `field`, or `None` when absent, null, `false` or an empty string.
pub fn optional_text(raw: &Value, field: &str) -> Option<String> {
    match raw.get(field) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value_to_text(value)),
    }
}

/// Display text for `field`, or [`NOT_AVAILABLE`] when absent, null, `false` or empty.
pub fn display_field(raw: &Value, field: &str) -> String {
    optional_text(raw, field).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Result of a currency conversion request, fully populated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct ConversionQuote {
    pub rate: f64,
    pub fee: f64,
    pub converted_amount: f64,
}

impl ConversionQuote {
    /// Decode a conversion response for `amount` units of the source currency.
    ///
    /// Field priority:
    /// - `rate`: `rate`, else 0
    /// - `fee`: [`FEE_FIELDS`], else 0
    /// - `converted_amount`: [`CONVERTED_AMOUNT_FIELDS`], else `amount * rate`, else 0
    pub fn decode(raw: &Value, amount: f64) -> Self {
        let rate = first_number(raw, &["rate"]);
        let fee = first_number(raw, FEE_FIELDS).unwrap_or(0.0);
        let converted_amount = first_number(raw, CONVERTED_AMOUNT_FIELDS)
            .or_else(|| rate.map(|rate| amount * rate))
            .unwrap_or(0.0);

        Self {
            rate: rate.unwrap_or(0.0),
            fee,
            converted_amount,
        }
    }
}
