//! High-availability cluster dashboard: typed decoding of the `/api/v1/ha/*` payloads,
//! badge rules and admin actions.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    client::ActionOutcome,
    decode::{LATENCY_FIELDS, NOT_AVAILABLE, first_number, first_string, is_truthy, optional_text, value_to_text},
    error::FetchError,
    status::{StatusState, parse_timestamp},
};

pub const HA_STATUS_PATH: &str = "/api/v1/ha/status";
pub const HA_NODE_PATH: &str = "/api/v1/ha/node";
pub const HA_SERVERS_PATH: &str = "/api/v1/ha/database/servers";
pub const HA_CLUSTER_NODES_PATH: &str = "/api/v1/ha/cluster/nodes";
pub const HA_METRICS_PATH: &str = "/api/v1/ha/metrics";

pub const FAILOVER_PATH: &str = "/api/v1/ha/database/failover";
pub const ROUTING_POLICY_PATH: &str = "/api/v1/ha/database/routing-policy";
pub const BACKUP_PATH: &str = "/api/v1/ha/database/backup";
pub const RESET_PATH: &str = "/api/v1/ha/reset";

pub const NO_METRICS: &str = "No metrics available";
pub const NO_LEADER: &str = "No leader";
const UNKNOWN: &str = "unknown";

/// Accept an HA payload only if the server flagged it as successful.
pub fn ensure_success(raw: Value) -> Result<Value, FetchError> {
    if raw.get("success").is_some_and(is_truthy) {
        Ok(raw)
    } else {
        Err(FetchError::Rejected {
            message: first_string(&raw, &["message", "error"])
                .unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

/// Render whole seconds as `1d 2h 3m 4s`, dropping leading zero units only.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let seconds = seconds % 60;

    let mut uptime = String::new();
    if days > 0 {
        uptime.push_str(&format!("{days}d "));
    }
    if hours > 0 || days > 0 {
        uptime.push_str(&format!("{hours}h "));
    }
    if minutes > 0 || hours > 0 || days > 0 {
        uptime.push_str(&format!("{minutes}m "));
    }
    uptime.push_str(&format!("{seconds}s"));
    uptime
}

/// Render a timestamp value for display, falling back to its raw text.
pub fn format_timestamp(value: &Value) -> String {
    match parse_timestamp(value) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => value_to_text(value),
    }
}

pub fn database_state(status: &str) -> StatusState {
    match status {
        "healthy" => StatusState::Ok,
        "degraded" => StatusState::Warning,
        _ => StatusState::Error,
    }
}

pub fn cluster_state(state: &str) -> StatusState {
    match state {
        "stable" => StatusState::Ok,
        "election" | "initializing" => StatusState::Warning,
        _ => StatusState::Error,
    }
}

pub fn server_state(status: &str) -> StatusState {
    match status {
        "online" => StatusState::Ok,
        "degraded" => StatusState::Warning,
        _ => StatusState::Error,
    }
}

pub fn node_health_state(health: &str) -> StatusState {
    match health {
        "healthy" => StatusState::Ok,
        "degraded" => StatusState::Warning,
        _ => StatusState::Error,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human label for a metric key: underscores become spaces and every word is capitalised.
pub fn metric_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len());
    let mut at_boundary = true;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_alphanumeric();
        if is_word && at_boundary {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        at_boundary = !is_word;
    }
    label
}

/// Last-known state of one dashboard panel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    pub fn from_result(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(error) => Loadable::Failed(error.user_message()),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HaStatus {
    pub ha_enabled: bool,
    pub database_status: String,
    pub cluster_state: String,
}

impl HaStatus {
    pub fn decode(raw: &Value) -> Self {
        let nested = |pointer: &str| {
            raw.pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string()
        };

        Self {
            ha_enabled: raw.get("ha_enabled").is_some_and(is_truthy),
            database_status: nested("/database/status"),
            cluster_state: nested("/cluster/state"),
        }
    }

    pub fn ha_label(&self) -> &'static str {
        if self.ha_enabled { "Enabled" } else { "Disabled" }
    }

    pub fn ha_state(&self) -> StatusState {
        if self.ha_enabled {
            StatusState::Ok
        } else {
            StatusState::Warning
        }
    }

    pub fn database_state(&self) -> StatusState {
        database_state(&self.database_status)
    }

    pub fn cluster_label(&self) -> String {
        capitalize(&self.cluster_state)
    }

    pub fn cluster_state(&self) -> StatusState {
        cluster_state(&self.cluster_state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LeaderInfo {
    pub id: Option<String>,
    pub address: Option<String>,
    pub term: Option<String>,
    pub commit_index: Option<String>,
}

impl LeaderInfo {
    pub fn decode(raw: &Value) -> Self {
        Self {
            id: optional_text(raw, "id"),
            address: optional_text(raw, "address"),
            term: optional_text(raw, "term"),
            commit_index: optional_text(raw, "commit_index"),
        }
    }
}

/// Display-ready leader fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderSummary {
    pub id: String,
    pub address: String,
    pub term: String,
    pub commit_index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeInfo {
    pub node_id: Option<String>,
    pub hostname: Option<String>,
    pub region: Option<String>,
    pub uptime_secs: Option<u64>,
    pub role: Option<String>,
    pub port: Option<String>,
    pub is_leader: bool,
    pub leader: Option<LeaderInfo>,
}

impl NodeInfo {
    pub fn decode(raw: &Value) -> Self {
        Self {
            node_id: optional_text(raw, "node_id"),
            hostname: optional_text(raw, "hostname"),
            region: optional_text(raw, "region"),
            uptime_secs: raw
                .get("uptime")
                .and_then(Value::as_f64)
                .filter(|uptime| *uptime >= 1.0)
                .map(|uptime| uptime as u64),
            role: optional_text(raw, "role"),
            port: optional_text(raw, "port"),
            is_leader: raw.get("is_leader").is_some_and(is_truthy),
            leader: raw
                .get("leader")
                .filter(|leader| is_truthy(leader))
                .map(LeaderInfo::decode),
        }
    }

    pub fn uptime_text(&self) -> String {
        self.uptime_secs
            .map(format_uptime)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Leader as seen from this node: itself, the reported leader, or nobody.
    pub fn leader_summary(&self) -> LeaderSummary {
        let or = |value: &Option<String>, fallback: &str| {
            value.clone().unwrap_or_else(|| fallback.to_string())
        };

        if self.is_leader {
            LeaderSummary {
                id: or(&self.node_id, NOT_AVAILABLE),
                address: format!(
                    "{}:{}",
                    or(&self.hostname, NOT_AVAILABLE),
                    or(&self.port, NOT_AVAILABLE)
                ),
                term: NOT_AVAILABLE.to_string(),
                commit_index: NOT_AVAILABLE.to_string(),
            }
        } else if let Some(leader) = &self.leader {
            LeaderSummary {
                id: or(&leader.id, "Unknown"),
                address: or(&leader.address, "Unknown"),
                term: or(&leader.term, NOT_AVAILABLE),
                commit_index: or(&leader.commit_index, NOT_AVAILABLE),
            }
        } else {
            LeaderSummary {
                id: NO_LEADER.to_string(),
                address: NOT_AVAILABLE.to_string(),
                term: NOT_AVAILABLE.to_string(),
                commit_index: NOT_AVAILABLE.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseServer {
    pub id: Option<String>,
    pub role: Option<String>,
    pub host: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
    pub connections: String,
    pub latency_ms: Option<f64>,
    pub replication_lag: Option<String>,
}

impl DatabaseServer {
    pub fn decode(raw: &Value) -> Self {
        Self {
            id: optional_text(raw, "id"),
            role: optional_text(raw, "role"),
            host: optional_text(raw, "host"),
            region: optional_text(raw, "region"),
            status: optional_text(raw, "status"),
            connections: optional_text(raw, "connections").unwrap_or_else(|| "0".to_string()),
            latency_ms: first_number(raw, LATENCY_FIELDS).filter(|latency| *latency != 0.0),
            replication_lag: optional_text(raw, "replication_lag").filter(|lag| lag != "0"),
        }
    }

    /// Decode the `servers` array of a servers payload.
    pub fn decode_list(raw: &Value) -> Vec<Self> {
        raw.get("servers")
            .and_then(Value::as_array)
            .map(|servers| servers.iter().map(Self::decode).collect())
            .unwrap_or_default()
    }

    pub fn is_primary(&self) -> bool {
        self.role.as_deref() == Some("primary")
    }

    pub fn role_label(&self) -> &str {
        self.role.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn state(&self) -> StatusState {
        server_state(self.status_label())
    }

    pub fn latency_text(&self) -> String {
        self.latency_ms
            .map(|latency| format!("{latency} ms"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterNode {
    pub id: Option<String>,
    pub address: Option<String>,
    pub health: Option<String>,
    pub last_seen: Option<String>,
}

impl ClusterNode {
    pub fn decode(raw: &Value) -> Self {
        Self {
            id: optional_text(raw, "id"),
            address: optional_text(raw, "address"),
            health: optional_text(raw, "health"),
            last_seen: raw
                .get("last_seen")
                .filter(|seen| is_truthy(seen))
                .map(format_timestamp),
        }
    }

    /// Decode the `nodes` array of a cluster nodes payload.
    pub fn decode_list(raw: &Value) -> Vec<Self> {
        raw.get("nodes")
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().map(Self::decode).collect())
            .unwrap_or_default()
    }

    pub fn health_label(&self) -> &str {
        self.health.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn state(&self) -> StatusState {
        node_health_state(self.health_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    App,
    Database,
    Cluster,
}

impl MetricKind {
    fn format(&self, key: &str, value: &Value) -> String {
        match self {
            MetricKind::App if key == "uptime" && value.is_number() => {
                format_uptime(value.as_f64().unwrap_or_default().max(0.0) as u64)
            }
            MetricKind::App if key.contains("timestamp") && is_truthy(value) => {
                format_timestamp(value)
            }
            MetricKind::Database if key.contains("latency") && value.is_number() => {
                format!("{value} ms")
            }
            MetricKind::Database if key.contains("lag") && value.is_number() => {
                format!("{value} sec")
            }
            MetricKind::Cluster if key == "is_leader" => match is_truthy(value) {
                true => "Yes".to_string(),
                false => "No".to_string(),
            },
            _ => match value {
                Value::Null => String::new(),
                other => value_to_text(other),
            },
        }
    }
}

/// One metrics table: labelled, formatted entries in server order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct MetricGroup {
    pub entries: IndexMap<String, String>,
    pub message: Option<String>,
}

impl MetricGroup {
    pub fn decode(raw: Option<&Value>, kind: MetricKind) -> Self {
        let Some(Value::Object(map)) = raw else {
            return Self::default();
        };

        Self {
            entries: map
                .iter()
                .filter(|(key, _)| key.as_str() != "message")
                .map(|(key, value)| (metric_label(key), kind.format(key, value)))
                .collect(),
            message: map
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(str::to_string),
        }
    }

    /// Placeholder shown in place of an empty table.
    pub fn empty_text(&self) -> &str {
        self.message.as_deref().unwrap_or(NO_METRICS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct HaMetrics {
    pub app: MetricGroup,
    pub database: MetricGroup,
    pub cluster: MetricGroup,
}

impl HaMetrics {
    pub fn decode(raw: &Value) -> Self {
        Self {
            app: MetricGroup::decode(raw.get("app_metrics"), MetricKind::App),
            database: MetricGroup::decode(raw.get("db_metrics"), MetricKind::Database),
            cluster: MetricGroup::decode(raw.get("cluster_metrics"), MetricKind::Cluster),
        }
    }
}

/// Every panel of the HA dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HaDashboard {
    pub status: Loadable<HaStatus>,
    pub node: Loadable<NodeInfo>,
    pub servers: Loadable<Vec<DatabaseServer>>,
    pub cluster_nodes: Loadable<Vec<ClusterNode>>,
    pub metrics: Loadable<HaMetrics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    PrimaryOnly,
    PrimaryWriteReplicaRead,
    LeastLoaded,
    ClosestRegion,
    RandomReplica,
}

impl RoutingPolicy {
    pub const ALL: [RoutingPolicy; 5] = [
        RoutingPolicy::PrimaryOnly,
        RoutingPolicy::PrimaryWriteReplicaRead,
        RoutingPolicy::LeastLoaded,
        RoutingPolicy::ClosestRegion,
        RoutingPolicy::RandomReplica,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingPolicy::PrimaryOnly => "primary_only",
            RoutingPolicy::PrimaryWriteReplicaRead => "primary_write_replica_read",
            RoutingPolicy::LeastLoaded => "least_loaded",
            RoutingPolicy::ClosestRegion => "closest_region",
            RoutingPolicy::RandomReplica => "random_replica",
        }
    }

    /// Next policy in [`RoutingPolicy::ALL`], wrapping around.
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|policy| policy == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown routing policy: {0}")]
pub struct UnknownRoutingPolicy(pub String);

impl FromStr for RoutingPolicy {
    type Err = UnknownRoutingPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| UnknownRoutingPolicy(s.to_string()))
    }
}

/// State-changing request against the HA cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    Failover,
    UpdateRoutingPolicy(RoutingPolicy),
    Backup,
    Reset,
}

impl AdminAction {
    pub fn path(&self) -> &'static str {
        match self {
            AdminAction::Failover => FAILOVER_PATH,
            AdminAction::UpdateRoutingPolicy(_) => ROUTING_POLICY_PATH,
            AdminAction::Backup => BACKUP_PATH,
            AdminAction::Reset => RESET_PATH,
        }
    }

    pub fn body(&self) -> Option<Value> {
        match self {
            AdminAction::UpdateRoutingPolicy(policy) => Some(json!({ "policy": policy })),
            _ => None,
        }
    }

    /// Turn the outcome of this action into a success or failure message for the user.
    pub fn summarize(&self, result: &Result<ActionOutcome, FetchError>) -> Result<String, String> {
        match result {
            Ok(outcome) if outcome.success => Ok(match self {
                AdminAction::Failover => format!(
                    "Failover successful! New primary: {}",
                    outcome.new_primary().unwrap_or(NOT_AVAILABLE)
                ),
                AdminAction::UpdateRoutingPolicy(policy) => format!("Policy updated to {policy}"),
                AdminAction::Backup => match outcome.timestamp() {
                    Some(timestamp) => format!(
                        "Backup initiated successfully. Timestamp: {}",
                        format_timestamp(&Value::String(timestamp.to_string()))
                    ),
                    None => "Backup initiated successfully".to_string(),
                },
                AdminAction::Reset => "HA infrastructure reset successfully".to_string(),
            }),
            Ok(outcome) => {
                let message = outcome.message_or_default();
                Err(match self {
                    AdminAction::Failover => format!("Failover failed: {message}"),
                    AdminAction::UpdateRoutingPolicy(_) => {
                        format!("Failed to update policy: {message}")
                    }
                    AdminAction::Backup => format!("Backup failed: {message}"),
                    AdminAction::Reset => format!("Reset failed: {message}"),
                })
            }
            Err(error) => {
                let message = error.user_message();
                Err(match self {
                    AdminAction::Failover => format!("Error initiating failover: {message}"),
                    AdminAction::UpdateRoutingPolicy(_) => {
                        format!("Error updating routing policy: {message}")
                    }
                    AdminAction::Backup => format!("Error initiating backup: {message}"),
                    AdminAction::Reset => format!("Error resetting infrastructure: {message}"),
                })
            }
        }
    }
}
