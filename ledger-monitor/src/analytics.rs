//! Transaction analytics payloads: parsing with defaults, source fallback and caching.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use chrono::{Days, NaiveDate, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AnalyticsError;

/// Reporting window used when the payload does not state one.
pub const DEFAULT_DAYS: u32 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Aggregate for one date, type or status.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Bucket {
    pub count: u64,
    pub total_amount: f64,
}

impl Bucket {
    fn decode(raw: &Value) -> Self {
        Self {
            count: raw
                .get("count")
                .and_then(|count| count.as_u64().or_else(|| count.as_f64().map(|f| f.max(0.0) as u64)))
                .unwrap_or(0),
            total_amount: raw
                .get("total_amount")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalyticsSnapshot {
    pub days: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_count: u64,
    pub total_amount: f64,
    pub by_date: BTreeMap<NaiveDate, Bucket>,
    pub by_type: IndexMap<String, Bucket>,
    pub by_status: IndexMap<String, Bucket>,
    pub raw_entries: Vec<Value>,
}

impl AnalyticsSnapshot {
    /// Empty snapshot covering the [`DEFAULT_DAYS`] days ending `today`.
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            days: DEFAULT_DAYS,
            period_start: today
                .checked_sub_days(Days::new(DEFAULT_DAYS.into()))
                .unwrap_or(today),
            period_end: today,
            total_count: 0,
            total_amount: 0.0,
            by_date: BTreeMap::new(),
            by_type: IndexMap::new(),
            by_status: IndexMap::new(),
            raw_entries: Vec::new(),
        }
    }

    /// Parse a JSON analytics payload, filling every missing field with its default.
    pub fn parse(text: &str) -> Result<Self, AnalyticsError> {
        Self::parse_at(text, Utc::now().date_naive())
    }

    pub fn parse_at(text: &str, today: NaiveDate) -> Result<Self, AnalyticsError> {
        let raw = serde_json::from_str::<Value>(text)?;
        if !raw.is_object() {
            return Err(AnalyticsError::NotAnObject);
        }
        Ok(Self::from_value(&raw, today))
    }

    pub fn from_value(raw: &Value, today: NaiveDate) -> Self {
        let days = raw
            .get("days")
            .and_then(Value::as_u64)
            .filter(|days| *days > 0)
            .and_then(|days| u32::try_from(days).ok())
            .unwrap_or(DEFAULT_DAYS);

        let date = |field: &str| {
            raw.get(field)
                .and_then(Value::as_str)
                .and_then(|date| NaiveDate::parse_from_str(date, DATE_FORMAT).ok())
        };
        let period_end = date("end_date").unwrap_or(today);
        let period_start = date("start_date").unwrap_or_else(|| {
            period_end
                .checked_sub_days(Days::new(days.into()))
                .unwrap_or(period_end)
        });

        let buckets = |field: &str| -> IndexMap<String, Bucket> {
            raw.get(field)
                .and_then(Value::as_object)
                .map(|map| {
                    map.iter()
                        .map(|(key, bucket)| (key.clone(), Bucket::decode(bucket)))
                        .collect()
                })
                .unwrap_or_default()
        };

        let by_date = buckets("by_date")
            .into_iter()
            .filter_map(|(key, bucket)| match NaiveDate::parse_from_str(&key, DATE_FORMAT) {
                Ok(date) => Some((date, bucket)),
                Err(error) => {
                    debug!(key = %key, %error, "skipping analytics date bucket");
                    None
                }
            })
            .collect::<BTreeMap<_, _>>();

        let total_count = raw
            .get("total_transactions")
            .and_then(Value::as_u64)
            .filter(|total| *total > 0)
            .unwrap_or_else(|| saturating_count(by_date.values()));
        let total_amount = raw
            .get("total_amount")
            .and_then(Value::as_f64)
            .filter(|total| *total != 0.0)
            .unwrap_or_else(|| by_date.values().map(|bucket| bucket.total_amount).sum());

        Self {
            days,
            period_start,
            period_end,
            total_count,
            total_amount,
            by_date,
            by_type: buckets("by_type"),
            by_status: buckets("by_status"),
            raw_entries: raw
                .get("raw_data")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Transactions in a `completed` state.
    pub fn completed_count(&self) -> u64 {
        self.status_count(|status| status == "completed")
    }

    /// Transactions still `pending` or `processing`.
    pub fn pending_count(&self) -> u64 {
        self.status_count(|status| status == "pending" || status == "processing")
    }

    fn status_count(&self, matches: impl Fn(&str) -> bool) -> u64 {
        saturating_count(
            self.by_status
                .iter()
                .filter(|(status, _)| matches(&status.to_lowercase()))
                .map(|(_, bucket)| bucket),
        )
    }
}

/// Sum of bucket counts, clamped at `u64::MAX`.
pub fn saturating_count<'a>(buckets: impl IntoIterator<Item = &'a Bucket>) -> u64 {
    buckets
        .into_iter()
        .fold(0u64, |total, bucket| total.saturating_add(bucket.count))
}

/// Place an analytics payload may be found, in the order they should be tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsCandidate {
    /// Payload supplied explicitly by configuration.
    Embedded(String),
    /// Older per-chart payload.
    Legacy { chart: String, payload: String },
    /// Arbitrary text that may hold a payload. Only tried if it looks like a JSON object.
    FreeText(String),
}

impl AnalyticsCandidate {
    fn describe(&self) -> &str {
        match self {
            AnalyticsCandidate::Embedded(_) => "embedded",
            AnalyticsCandidate::Legacy { chart, .. } => chart,
            AnalyticsCandidate::FreeText(_) => "free text",
        }
    }

    fn parse(&self, today: NaiveDate) -> Option<Result<AnalyticsSnapshot, AnalyticsError>> {
        match self {
            AnalyticsCandidate::Embedded(text) => {
                if !text.trim_start().starts_with('{') {
                    warn!("embedded analytics payload does not start with '{{'");
                }
                Some(AnalyticsSnapshot::parse_at(text, today))
            }
            AnalyticsCandidate::Legacy { payload, .. } => {
                Some(AnalyticsSnapshot::parse_at(payload, today))
            }
            AnalyticsCandidate::FreeText(text) => {
                let text = text.trim();
                text.starts_with('{')
                    .then(|| AnalyticsSnapshot::parse_at(text, today))
            }
        }
    }
}

/// Per-chart payload files from older deployments, in priority order.
pub const LEGACY_CHART_FILES: [&str; 3] = [
    "transactionsByDateChart.json",
    "transactionsByTypeChart.json",
    "transactionsByStatusChart.json",
];

/// Candidates found at `path`.
///
/// A file is an embedded payload. A directory may hold `analytics.json`, any of the
/// [`LEGACY_CHART_FILES`], and an `analytics.txt` tried as free text, in that order.
pub fn analytics_candidates(path: &Path) -> Vec<AnalyticsCandidate> {
    let read = |path: &Path| match std::fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(error) => {
            debug!(path = %path.display(), %error, "analytics source unavailable");
            None
        }
    };

    if !path.is_dir() {
        return read(path)
            .map(AnalyticsCandidate::Embedded)
            .into_iter()
            .collect();
    }

    let embedded = read(&path.join("analytics.json")).map(AnalyticsCandidate::Embedded);
    let legacy = LEGACY_CHART_FILES.iter().filter_map(|file| {
        read(&path.join(file)).map(|payload| AnalyticsCandidate::Legacy {
            chart: file.trim_end_matches(".json").to_string(),
            payload,
        })
    });
    let free_text = read(&path.join("analytics.txt")).map(AnalyticsCandidate::FreeText);

    embedded.into_iter().chain(legacy).chain(free_text).collect()
}

/// First candidate that parses, or the empty snapshot ending `today`. Never fails.
pub fn load_analytics(candidates: &[AnalyticsCandidate], today: NaiveDate) -> AnalyticsSnapshot {
    for candidate in candidates {
        match candidate.parse(today) {
            Some(Ok(snapshot)) => {
                info!(source = candidate.describe(), "loaded analytics");
                return snapshot;
            }
            Some(Err(error)) => {
                warn!(source = candidate.describe(), %error, "unusable analytics payload");
            }
            None => {}
        }
    }

    warn!("no valid analytics data found, using empty snapshot");
    AnalyticsSnapshot::empty(today)
}

/// Analytics loaded once and kept until an explicit refresh.
#[derive(Debug, Default)]
pub struct AnalyticsCache {
    cached: RwLock<Option<Arc<AnalyticsSnapshot>>>,
}

impl AnalyticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot, loading it with `load` on first use.
    pub fn get_or_load(&self, load: impl FnOnce() -> AnalyticsSnapshot) -> Arc<AnalyticsSnapshot> {
        if let Some(snapshot) = self.cached.read().as_ref() {
            return Arc::clone(snapshot);
        }

        let mut cached = self.cached.write();
        Arc::clone(cached.get_or_insert_with(|| Arc::new(load())))
    }

    pub fn get(&self) -> Option<Arc<AnalyticsSnapshot>> {
        self.cached.read().clone()
    }

    /// Drop the cached snapshot so the next read loads it again.
    pub fn refresh(&self) {
        self.cached.write().take();
    }
}
