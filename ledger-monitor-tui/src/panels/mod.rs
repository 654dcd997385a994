//! Ratatui panels for the ledger dashboard.

use ledger_monitor::{DashboardSnapshot, StatusState};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::app::App;

pub mod analytics;
pub mod connectivity;
pub mod ha;
pub mod status_bar;

// Palette
pub const C_OK: Color = Color::Rgb(100, 220, 100);
pub const C_WARN: Color = Color::Rgb(220, 190, 90);
pub const C_ERR: Color = Color::Rgb(220, 100, 100);
pub const C_DIM: Color = Color::Rgb(120, 120, 120);
pub const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
pub const C_ACCENT: Color = Color::Rgb(100, 180, 220);

pub fn state_color(state: StatusState) -> Color {
    match state {
        StatusState::Ok => C_OK,
        StatusState::Warning => C_WARN,
        StatusState::Error => C_ERR,
    }
}

/// Bordered panel with a padded upper-case title.
pub fn panel_block(title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title.to_uppercase()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_DIM))
}

/// Single dim or red line standing in for missing data.
pub fn placeholder_line(message: &str, failed: bool) -> Line<'static> {
    let color = if failed { C_ERR } else { C_DIM };
    Line::from(Span::styled(message.to_string(), Style::default().fg(color)))
}

/// `label: value` with the value in `color`.
pub fn field_spans(label: &str, value: &str, color: Color) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("{label}: "), Style::default().fg(C_DIM)),
        Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]
}

/// Draw the whole dashboard.
pub fn render_dashboard(f: &mut Frame, snapshot: &DashboardSnapshot, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(4),
        ])
        .split(f.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(top[0]);

    connectivity::render_connectivity_panel(f, left[0], &snapshot.state);
    status_bar::render_notifications_panel(f, left[1], &snapshot.state.notifications);
    ha::render_ha_panel(f, top[1], &snapshot.state.ha);
    analytics::render_analytics_panel(f, rows[1], &snapshot.analytics);
    status_bar::render_status_bar(f, rows[2], snapshot, app);
}
