//! Normalisation of raw subsystem status payloads into [`StatusReport`]s.
//!
//! Status endpoints answer with `{status, message?, latency?, version?, lastChecked?,
//! details?}` but any field may be missing or carry the wrong type. [`normalize`] always
//! produces a fully shaped report.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::debug;

use crate::decode::value_to_text;

/// Tri-state health of one monitored subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    #[default]
    Ok,
    Warning,
    Error,
}

impl StatusState {
    /// Derive the state from a raw `status` field.
    ///
    /// `"warning"` is a warning, `"error"` and `false` are errors, anything else
    /// (including an absent field) is ok.
    pub fn from_raw(status: Option<&Value>) -> Self {
        match status {
            Some(Value::String(s)) if s == "warning" => StatusState::Warning,
            Some(Value::String(s)) if s == "error" => StatusState::Error,
            Some(Value::Bool(false)) => StatusState::Error,
            _ => StatusState::Ok,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusState::Ok => "ok",
            StatusState::Warning => "warning",
            StatusState::Error => "error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StatusState::Ok)
    }
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalised, immutable view of one status poll for one subsystem `key`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatusReport {
    pub key: SmolStr,
    pub state: StatusState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub last_checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<IndexMap<String, String>>,
}

impl StatusReport {
    /// Error-state report synthesised when a fetch fails before a payload is available.
    pub fn failure(key: impl Into<SmolStr>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: StatusState::Error,
            message: Some(message.into()),
            latency_ms: None,
            version: None,
            last_checked_at: Utc::now(),
            details: None,
        }
    }
}

/// Normalise `raw` into a [`StatusReport`] for `key`, stamping missing check times with
/// the current time.
pub fn normalize(raw: &Value, key: &str) -> StatusReport {
    normalize_at(raw, key, Utc::now())
}

/// Normalise `raw` into a [`StatusReport`] for `key`, using `now` when `lastChecked` is
/// absent or unparseable.
///
/// Non-object input is treated as an empty object.
pub fn normalize_at(raw: &Value, key: &str, now: DateTime<Utc>) -> StatusReport {
    let status = raw.get("status");
    if status.is_none() {
        debug!(key, "status payload has no status field, reporting ok");
    }

    StatusReport {
        key: SmolStr::new(key),
        state: StatusState::from_raw(status),
        message: raw.get("message").and_then(Value::as_str).map(str::to_string),
        latency_ms: raw.get("latency").and_then(Value::as_f64),
        version: raw.get("version").and_then(Value::as_str).map(str::to_string),
        last_checked_at: raw
            .get("lastChecked")
            .and_then(parse_timestamp)
            .unwrap_or(now),
        details: raw.get("details").and_then(Value::as_object).map(|details| {
            details
                .iter()
                .map(|(name, value)| (name.clone(), value_to_text(value)))
                .collect()
        }),
    }
}

/// Parse a timestamp given as an RFC 3339 string, a naive ISO-8601 string (assumed UTC),
/// or epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|time| time.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                        .iter()
                        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                        .map(|naive| naive.and_utc())
                })
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
