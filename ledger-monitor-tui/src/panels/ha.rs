//! High-availability panel: status badges, node and leader summary, server / cluster / metric
//! tables.

use ledger_monitor::{
    HaDashboard, Loadable,
    decode::NOT_AVAILABLE,
    ha::{HaMetrics, HaStatus, NodeInfo},
    view::{TableView, cluster_node_table, ha_badges, metric_table, server_table},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Wrap},
};

use super::{
    C_ACCENT, C_BRIGHT, C_DIM, field_spans, panel_block, placeholder_line, state_color,
};

pub fn render_ha_panel(f: &mut Frame, area: Rect, ha: &HaDashboard) {
    let block = panel_block("High Availability");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(8),
        ])
        .split(inner);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[2]);

    f.render_widget(
        Paragraph::new(overview_lines(&ha.status, &ha.node)).wrap(Wrap { trim: true }),
        rows[0],
    );
    render_table_view(f, rows[1], "Database Servers", &server_table(&ha.servers));
    render_table_view(f, bottom[0], "Cluster Nodes", &cluster_node_table(&ha.cluster_nodes));
    render_metrics(f, bottom[1], &ha.metrics);
}

fn overview_lines(status: &Loadable<HaStatus>, node: &Loadable<NodeInfo>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match status {
        Loadable::Loading => lines.push(placeholder_line("Loading HA status...", false)),
        Loadable::Failed(error) => lines.push(placeholder_line(
            &format!("Failed to load HA status: {error}"),
            true,
        )),
        Loadable::Ready(status) => {
            let [ha, database, cluster] = ha_badges(status);
            let mut spans = field_spans("HA", &ha.label, state_color(ha.state));
            spans.push(Span::raw("   "));
            spans.extend(field_spans("Database", &database.label, state_color(database.state)));
            spans.push(Span::raw("   "));
            spans.extend(field_spans("Cluster", &cluster.label, state_color(cluster.state)));
            lines.push(Line::from(spans));
        }
    }

    match node {
        Loadable::Loading => lines.push(placeholder_line("Loading node info...", false)),
        Loadable::Failed(error) => lines.push(placeholder_line(
            &format!("Failed to load node info: {error}"),
            true,
        )),
        Loadable::Ready(node) => {
            let or_na = |value: &Option<String>| {
                value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
            };

            let mut spans = field_spans("Node", &or_na(&node.node_id), C_BRIGHT);
            spans.push(Span::raw("  "));
            spans.extend(field_spans("Host", &or_na(&node.hostname), C_BRIGHT));
            spans.push(Span::raw("  "));
            spans.extend(field_spans("Region", &or_na(&node.region), C_BRIGHT));
            spans.push(Span::raw("  "));
            spans.extend(field_spans("Uptime", &node.uptime_text(), C_BRIGHT));
            lines.push(Line::from(spans));

            let leader = node.leader_summary();
            let mut spans = field_spans("Leader", &leader.id, C_ACCENT);
            spans.push(Span::raw("  "));
            spans.extend(field_spans("Address", &leader.address, C_BRIGHT));
            spans.push(Span::raw("  "));
            spans.extend(field_spans("Term", &leader.term, C_BRIGHT));
            spans.push(Span::raw("  "));
            spans.extend(field_spans("Commit", &leader.commit_index, C_BRIGHT));
            lines.push(Line::from(spans));
        }
    }

    lines
}

/// Draw a [`TableView`] under a dim sub-heading.
pub fn render_table_view(f: &mut Frame, area: Rect, title: &str, view: &TableView) {
    let heading = Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
    ));
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);
    f.render_widget(Paragraph::new(heading), parts[0]);

    match view {
        TableView::Placeholder { message, failed } => {
            f.render_widget(
                Paragraph::new(placeholder_line(message, *failed)).wrap(Wrap { trim: true }),
                parts[1],
            );
        }
        TableView::Rows { header, rows } => {
            let header_row = Row::new(header.iter().map(|name| {
                Cell::from(Span::styled(
                    *name,
                    Style::default().fg(C_DIM).add_modifier(Modifier::BOLD),
                ))
            }));

            let body = rows.iter().map(|row| {
                Row::new(row.iter().map(|cell| {
                    let style = match (cell.badge, cell.highlight) {
                        (Some(state), _) => Style::default().fg(state_color(state)),
                        (None, true) => Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                        (None, false) => Style::default().fg(C_BRIGHT),
                    };
                    Cell::from(Span::styled(cell.text.clone(), style))
                }))
            });

            let widths = vec![Constraint::Fill(1); header.len()];
            f.render_widget(Table::new(body, widths).header(header_row), parts[1]);
        }
    }
}

fn render_metrics(f: &mut Frame, area: Rect, metrics: &Loadable<HaMetrics>) {
    let metrics = match metrics {
        Loadable::Ready(metrics) => metrics,
        Loadable::Loading => {
            let view = TableView::Placeholder {
                message: "Loading metrics...".to_string(),
                failed: false,
            };
            return render_table_view(f, area, "Metrics", &view);
        }
        Loadable::Failed(error) => {
            let view = TableView::Placeholder {
                message: format!("Failed to load metrics: {error}"),
                failed: true,
            };
            return render_table_view(f, area, "Metrics", &view);
        }
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    for (column, (title, group)) in columns.iter().zip([
        ("App", &metrics.app),
        ("Database", &metrics.database),
        ("Cluster", &metrics.cluster),
    ]) {
        render_table_view(f, *column, title, &metric_table(group));
    }
}
