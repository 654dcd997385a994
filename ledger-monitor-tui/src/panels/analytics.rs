use ledger_monitor::{
    AnalyticsSnapshot,
    view::{ChartView, date_chart, status_chart, type_chart},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Paragraph, Wrap},
};

use super::{C_ACCENT, C_BRIGHT, C_DIM, C_OK, C_WARN, field_spans, panel_block, placeholder_line};

const BAR_GAP: u16 = 1;
const MAX_BAR_WIDTH: u16 = 9;

/// Period summary above the three transaction charts.
pub fn render_analytics_panel(f: &mut Frame, area: Rect, snapshot: &AnalyticsSnapshot) {
    let block = panel_block("Analytics");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(inner);

    let period = format!(
        "{} - {}",
        snapshot.period_start.format("%Y-%m-%d"),
        snapshot.period_end.format("%Y-%m-%d")
    );
    let mut spans = field_spans("Period", &period, C_BRIGHT);
    for (label, value, color) in [
        ("Transactions", snapshot.total_count.to_string(), C_BRIGHT),
        ("Amount", format!("{:.2}", snapshot.total_amount), C_BRIGHT),
        ("Completed", snapshot.completed_count().to_string(), C_OK),
        ("Pending", snapshot.pending_count().to_string(), C_WARN),
    ] {
        spans.push(" | ".into());
        spans.extend(field_spans(label, &value, color));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), rows[0]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(rows[1]);

    render_chart(f, charts[0], "By Date", &date_chart(snapshot), C_ACCENT);
    render_chart(f, charts[1], "By Type", &type_chart(snapshot), C_OK);
    render_chart(f, charts[2], "By Status", &status_chart(snapshot), C_WARN);
}

/// Bar chart of transaction counts, or its placeholder message.
pub fn render_chart(f: &mut Frame, area: Rect, title: &str, view: &ChartView, color: Color) {
    let block = panel_block(title);

    let points = match view {
        ChartView::NoData { message } => {
            f.render_widget(
                Paragraph::new(placeholder_line(message, false))
                    .wrap(Wrap { trim: true })
                    .block(block),
                area,
            );
            return;
        }
        ChartView::Series { points } => points,
    };

    let inner_width = usize::from(block.inner(area).width);
    let gap = usize::from(BAR_GAP);
    // Bars past the right edge are not drawn.
    let visible = points.len().min((inner_width + gap) / (1 + gap)).max(1);
    let bar_width = (inner_width / visible)
        .saturating_sub(gap)
        .clamp(1, usize::from(MAX_BAR_WIDTH)) as u16;

    let bars = points
        .iter()
        .take(visible)
        .map(|point| {
            Bar::default()
                .value(point.count)
                .label(Line::from(point.label.clone()))
                .text_value(point.count.to_string())
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect::<Vec<_>>();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(BAR_GAP)
        .label_style(Style::default().fg(C_DIM));
    f.render_widget(chart, area);
}
