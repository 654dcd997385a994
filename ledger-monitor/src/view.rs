//! Renderer-agnostic view models.
//!
//! Everything a renderer needs to draw is computed here so that the terminal front end only
//! lays out text. Empty data always produces an explicit placeholder.

use serde::Serialize;

use crate::{
    analytics::{AnalyticsSnapshot, Bucket},
    decode::NOT_AVAILABLE,
    ha::{ClusterNode, DatabaseServer, HaStatus, Loadable, MetricGroup},
    status::{StatusReport, StatusState},
};

pub const NO_DATE_DATA: &str = "No transaction data for the selected period";
pub const NO_TYPE_DATA: &str = "No transaction type data available";
pub const NO_STATUS_DATA: &str = "No transaction status data available";
pub const NO_SERVERS: &str = "No database servers found";
pub const NO_CLUSTER_NODES: &str = "No cluster nodes found";

/// Icon and short label for one of the three visual states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub state: StatusState,
    pub icon: &'static str,
    pub label: &'static str,
}

impl Indicator {
    pub fn for_state(state: StatusState) -> Self {
        let (icon, label) = match state {
            StatusState::Ok => ("✔", "Connected"),
            StatusState::Warning => ("⚠", "Degraded"),
            StatusState::Error => ("✖", "Disconnected"),
        };
        Self { state, icon, label }
    }
}

impl From<&StatusReport> for Indicator {
    fn from(report: &StatusReport) -> Self {
        Self::for_state(report.state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
}

impl DetailRow {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Detail lines for a report: message, latency, version, last checked, then every
/// `details` entry in server order. Absent fields are omitted.
pub fn detail_rows(report: &StatusReport) -> Vec<DetailRow> {
    let mut rows = Vec::new();

    if let Some(message) = report.message.as_deref().filter(|m| !m.is_empty()) {
        rows.push(DetailRow::new("Message", message));
    }
    if let Some(latency) = report.latency_ms {
        rows.push(DetailRow::new("Latency", format!("{latency}ms")));
    }
    if let Some(version) = report.version.as_deref().filter(|v| !v.is_empty()) {
        rows.push(DetailRow::new("Version", version));
    }
    rows.push(DetailRow::new(
        "Last Checked",
        report.last_checked_at.format("%H:%M:%S UTC").to_string(),
    ));
    if let Some(details) = &report.details {
        rows.extend(
            details
                .iter()
                .map(|(label, value)| DetailRow::new(label.as_str(), value.as_str())),
        );
    }

    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub count: u64,
    pub total_amount: f64,
}

/// One analytics chart, or the placeholder shown in its place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartView {
    NoData { message: &'static str },
    Series { points: Vec<ChartPoint> },
}

impl ChartView {
    fn from_points(points: Vec<ChartPoint>, empty: &'static str) -> Self {
        if points.is_empty() {
            ChartView::NoData { message: empty }
        } else {
            ChartView::Series { points }
        }
    }

    pub fn total_count(&self) -> u64 {
        match self {
            ChartView::NoData { .. } => 0,
            ChartView::Series { points } => points
                .iter()
                .fold(0u64, |total, point| total.saturating_add(point.count)),
        }
    }
}

fn point(label: String, bucket: &Bucket) -> ChartPoint {
    ChartPoint {
        label,
        count: bucket.count,
        total_amount: bucket.total_amount,
    }
}

/// Label with the first letter upper-cased and the rest lower-cased.
pub fn category_label(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Transactions per day, oldest first, labelled `MM/DD`.
pub fn date_chart(snapshot: &AnalyticsSnapshot) -> ChartView {
    let points = snapshot
        .by_date
        .iter()
        .map(|(date, bucket)| point(date.format("%m/%d").to_string(), bucket))
        .collect();
    ChartView::from_points(points, NO_DATE_DATA)
}

pub fn type_chart(snapshot: &AnalyticsSnapshot) -> ChartView {
    let points = snapshot
        .by_type
        .iter()
        .map(|(kind, bucket)| point(category_label(kind), bucket))
        .collect();
    ChartView::from_points(points, NO_TYPE_DATA)
}

pub fn status_chart(snapshot: &AnalyticsSnapshot) -> ChartView {
    let points = snapshot
        .by_status
        .iter()
        .map(|(status, bucket)| point(category_label(status), bucket))
        .collect();
    ChartView::from_points(points, NO_STATUS_DATA)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub state: StatusState,
}

/// HA, database and cluster badges, in that order.
pub fn ha_badges(status: &HaStatus) -> [Badge; 3] {
    [
        Badge {
            label: status.ha_label().to_string(),
            state: status.ha_state(),
        },
        Badge {
            label: status.database_status.clone(),
            state: status.database_state(),
        },
        Badge {
            label: status.cluster_label(),
            state: status.cluster_state(),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    pub badge: Option<StatusState>,
    pub highlight: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            badge: None,
            highlight: false,
        }
    }

    fn or_na(text: Option<&str>) -> Self {
        Self::text(text.unwrap_or(NOT_AVAILABLE))
    }

    fn badge(text: impl Into<String>, state: StatusState) -> Self {
        Self {
            text: text.into(),
            badge: Some(state),
            highlight: false,
        }
    }
}

/// A table, or the single line shown in its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TableView {
    Placeholder { message: String, failed: bool },
    Rows {
        header: &'static [&'static str],
        rows: Vec<Vec<Cell>>,
    },
}

impl TableView {
    fn from_loadable<T>(
        panel: &Loadable<Vec<T>>,
        subject: &str,
        empty: &str,
        header: &'static [&'static str],
        row: impl Fn(&T) -> Vec<Cell>,
    ) -> Self {
        match panel {
            Loadable::Loading => TableView::Placeholder {
                message: format!("Loading {subject}..."),
                failed: false,
            },
            Loadable::Failed(error) => TableView::Placeholder {
                message: format!("Failed to load {subject}: {error}"),
                failed: true,
            },
            Loadable::Ready(items) if items.is_empty() => TableView::Placeholder {
                message: empty.to_string(),
                failed: false,
            },
            Loadable::Ready(items) => TableView::Rows {
                header,
                rows: items.iter().map(row).collect(),
            },
        }
    }
}

pub const SERVER_HEADER: &[&str] = &[
    "ID", "Role", "Host", "Region", "Status", "Connections", "Latency", "Replication Lag",
];

pub const CLUSTER_NODE_HEADER: &[&str] = &["ID", "Address", "Health", "Last Seen"];

pub const METRIC_HEADER: &[&str] = &["Metric", "Value"];

pub fn server_table(servers: &Loadable<Vec<DatabaseServer>>) -> TableView {
    TableView::from_loadable(servers, "database servers", NO_SERVERS, SERVER_HEADER, |server| {
        vec![
            Cell::or_na(server.id.as_deref()),
            Cell {
                text: server.role_label().to_string(),
                badge: None,
                highlight: server.is_primary(),
            },
            Cell::or_na(server.host.as_deref()),
            Cell::or_na(server.region.as_deref()),
            Cell::badge(server.status_label(), server.state()),
            Cell::text(server.connections.as_str()),
            Cell::text(server.latency_text()),
            Cell::or_na(server.replication_lag.as_deref()),
        ]
    })
}

pub fn cluster_node_table(nodes: &Loadable<Vec<ClusterNode>>) -> TableView {
    TableView::from_loadable(
        nodes,
        "cluster nodes",
        NO_CLUSTER_NODES,
        CLUSTER_NODE_HEADER,
        |node| {
            vec![
                Cell::or_na(node.id.as_deref()),
                Cell::or_na(node.address.as_deref()),
                Cell::badge(node.health_label(), node.state()),
                Cell::or_na(node.last_seen.as_deref()),
            ]
        },
    )
}

pub fn metric_table(group: &MetricGroup) -> TableView {
    if group.entries.is_empty() {
        return TableView::Placeholder {
            message: group.empty_text().to_string(),
            failed: false,
        };
    }

    TableView::Rows {
        header: METRIC_HEADER,
        rows: group
            .entries
            .iter()
            .map(|(label, value)| vec![Cell::text(label.as_str()), Cell::text(value.as_str())])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::normalize_at;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_indicator_labels() {
        struct TestCase {
            input: StatusState,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: ok
                input: StatusState::Ok,
                expected: "Connected",
            },
            TestCase {
                // TC1: warning
                input: StatusState::Warning,
                expected: "Degraded",
            },
            TestCase {
                // TC2: error
                input: StatusState::Error,
                expected: "Disconnected",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = Indicator::for_state(test.input).label;
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_detail_rows_fixed_order() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap();
        let report = normalize_at(
            &json!({
                "details": {"network": "mainnet", "peers": 8},
                "version": "1.4.2",
                "latency": 120,
                "message": "Synced",
                "status": "ok"
            }),
            "blockchain",
            now,
        );

        let actual = detail_rows(&report)
            .into_iter()
            .map(|row| (row.label, row.value))
            .collect::<Vec<_>>();

        assert_eq!(
            actual,
            vec![
                ("Message".to_string(), "Synced".to_string()),
                ("Latency".to_string(), "120ms".to_string()),
                ("Version".to_string(), "1.4.2".to_string()),
                ("Last Checked".to_string(), "09:05:00 UTC".to_string()),
                ("network".to_string(), "mainnet".to_string()),
                ("peers".to_string(), "8".to_string()),
            ]
        );
    }

    #[test]
    fn test_detail_rows_omit_absent_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap();
        let report = normalize_at(&json!({}), "api", now);
        let labels = detail_rows(&report)
            .into_iter()
            .map(|row| row.label)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["Last Checked".to_string()]);
    }

    #[test]
    fn test_empty_mappings_render_placeholders() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let snapshot = AnalyticsSnapshot::empty(today);

        assert_eq!(date_chart(&snapshot), ChartView::NoData { message: NO_DATE_DATA });
        assert_eq!(type_chart(&snapshot), ChartView::NoData { message: NO_TYPE_DATA });
        assert_eq!(status_chart(&snapshot), ChartView::NoData { message: NO_STATUS_DATA });
    }

    #[test]
    fn test_charts_are_independent() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let snapshot = AnalyticsSnapshot::parse_at(
            r#"{
                "by_date": {"2024-05-09": {"count": 1, "total_amount": 5.0}, "2024-04-30": {"count": 2, "total_amount": 7.5}},
                "by_type": {},
                "by_status": {"COMPLETED": {"count": 3, "total_amount": 12.5}}
            }"#,
            today,
        )
        .unwrap();

        let ChartView::Series { points } = date_chart(&snapshot) else {
            panic!("expected date series");
        };
        assert_eq!(
            points.iter().map(|p| p.label.as_str()).collect::<Vec<_>>(),
            vec!["04/30", "05/09"]
        );
        assert_eq!(points[0].count, 2);

        assert_eq!(type_chart(&snapshot), ChartView::NoData { message: NO_TYPE_DATA });

        let ChartView::Series { points } = status_chart(&snapshot) else {
            panic!("expected status series");
        };
        assert_eq!(points[0].label, "Completed");
        assert_eq!(status_chart(&snapshot).total_count(), 3);
    }

    #[test]
    fn test_chart_total_count_saturates() {
        let point = |label: &str, count: u64| ChartPoint {
            label: label.to_string(),
            count,
            total_amount: 0.0,
        };
        let view = ChartView::Series {
            points: vec![point("a", u64::MAX), point("b", 2)],
        };
        assert_eq!(view.total_count(), u64::MAX);
    }

    #[test]
    fn test_server_table_states() {
        assert_eq!(
            server_table(&Loadable::Loading),
            TableView::Placeholder {
                message: "Loading database servers...".to_string(),
                failed: false
            }
        );
        assert_eq!(
            server_table(&Loadable::Ready(vec![])),
            TableView::Placeholder {
                message: NO_SERVERS.to_string(),
                failed: false
            }
        );
        assert_eq!(
            cluster_node_table(&Loadable::Failed("Service unavailable".to_string())),
            TableView::Placeholder {
                message: "Failed to load cluster nodes: Service unavailable".to_string(),
                failed: true
            }
        );

        let servers = DatabaseServer::decode_list(&json!({
            "servers": [{"id": "db-1", "role": "primary", "status": "degraded", "connections": 4}]
        }));
        let TableView::Rows { header, rows } = server_table(&Loadable::Ready(servers)) else {
            panic!("expected rows");
        };
        assert_eq!(header.len(), rows[0].len());
        assert!(rows[0][1].highlight);
        assert_eq!(rows[0][4].badge, Some(StatusState::Warning));
        assert_eq!(rows[0][2].text, NOT_AVAILABLE);
        assert_eq!(rows[0][5].text, "4");
    }

    #[test]
    fn test_metric_table_placeholder() {
        let empty = MetricGroup {
            message: Some("HA is disabled".to_string()),
            ..Default::default()
        };
        assert_eq!(
            metric_table(&empty),
            TableView::Placeholder {
                message: "HA is disabled".to_string(),
                failed: false
            }
        );
    }

    #[test]
    fn test_ha_badges() {
        let status = HaStatus::decode(&json!({
            "ha_enabled": false,
            "database": {"status": "healthy"},
            "cluster": {"state": "stable"}
        }));
        let [ha, database, cluster] = ha_badges(&status);
        assert_eq!((ha.label.as_str(), ha.state), ("Disabled", StatusState::Warning));
        assert_eq!((database.label.as_str(), database.state), ("healthy", StatusState::Ok));
        assert_eq!((cluster.label.as_str(), cluster.state), ("Stable", StatusState::Ok));
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("SWIFT"), "Swift");
        assert_eq!(category_label("ach"), "Ach");
        assert_eq!(category_label(""), "");
    }
}
