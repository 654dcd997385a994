use ledger_monitor::{
    CONNECTIVITY_ENDPOINTS, DashboardState,
    view::{Indicator, detail_rows},
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::{C_BRIGHT, C_DIM, panel_block, state_color};

/// One indicator per subsystem followed by its detail rows.
pub fn render_connectivity_panel(f: &mut Frame, area: Rect, state: &DashboardState) {
    let block = panel_block("Connectivity");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    for endpoint in CONNECTIVITY_ENDPOINTS {
        let Some(report) = state.report(endpoint.key) else {
            lines.push(Line::from(vec![
                Span::styled("… ", Style::default().fg(C_DIM)),
                Span::styled(endpoint.title, Style::default().fg(C_BRIGHT)),
                Span::styled("  Checking...", Style::default().fg(C_DIM)),
            ]));
            continue;
        };

        let indicator = Indicator::from(report);
        let color = state_color(indicator.state);
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", indicator.icon), Style::default().fg(color)),
            Span::styled(
                endpoint.title,
                Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", indicator.label),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]));

        lines.extend(detail_rows(report).into_iter().map(|row| {
            Line::from(vec![
                Span::styled(format!("   {}: ", row.label), Style::default().fg(C_DIM)),
                Span::styled(row.value, Style::default().fg(C_BRIGHT)),
            ])
        }));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
