use std::collections::VecDeque;

use ledger_monitor::{DashboardSnapshot, Notification, NotificationLevel};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::{C_ACCENT, C_BRIGHT, C_DIM, C_ERR, C_OK, C_WARN, panel_block, placeholder_line};
use crate::app::{App, KEY_HELP};

pub fn level_color(level: NotificationLevel) -> Color {
    match level {
        NotificationLevel::Info => C_ACCENT,
        NotificationLevel::Success => C_OK,
        NotificationLevel::Danger => C_ERR,
    }
}

fn notification_line(notification: &Notification) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            notification.at.format("%H:%M:%S ").to_string(),
            Style::default().fg(C_DIM),
        ),
        Span::styled(
            notification.message.clone(),
            Style::default().fg(level_color(notification.level)),
        ),
    ])
}

/// Most recent notifications, newest first.
pub fn render_notifications_panel(
    f: &mut Frame,
    area: Rect,
    notifications: &VecDeque<Notification>,
) {
    let block = panel_block("Notifications");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = if notifications.is_empty() {
        vec![placeholder_line("No notifications", false)]
    } else {
        notifications
            .iter()
            .rev()
            .take(usize::from(inner.height))
            .map(notification_line)
            .collect()
    };

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

/// Polling state, pending confirmation or the last notification, and the key help.
pub fn render_status_bar(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, app: &App) {
    let block = panel_block("Status");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let polling = snapshot.polling;
    let (refresh, refresh_color) = if polling.paused {
        ("AUTO-REFRESH PAUSED".to_string(), C_WARN)
    } else if polling.running {
        (
            format!("AUTO-REFRESH {}s", polling.interval.as_secs()),
            C_OK,
        )
    } else {
        ("AUTO-REFRESH OFF".to_string(), C_DIM)
    };

    let mut first = vec![
        Span::styled(
            refresh,
            Style::default()
                .fg(refresh_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  cycles {}  policy {}  ", polling.cycles, app.selected_policy),
            Style::default().fg(C_DIM),
        ),
    ];
    match app.prompt() {
        Some(prompt) => first.push(Span::styled(
            prompt,
            Style::default().fg(C_WARN).add_modifier(Modifier::BOLD),
        )),
        None => {
            if let Some(last) = snapshot.state.notifications.back() {
                first.extend(notification_line(last).spans);
            }
        }
    }

    let lines = vec![
        Line::from(first),
        Line::from(Span::styled(KEY_HELP, Style::default().fg(C_BRIGHT))),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::NaiveDate;
    use crossterm::event::KeyCode;
    use ledger_monitor::{AnalyticsSnapshot, DashboardState, PollingStatus};

    use super::*;
    use crate::panels::test_util::render_text;

    fn snapshot(paused: bool) -> DashboardSnapshot {
        let mut state = DashboardState::default();
        state.notify(NotificationLevel::Danger, "Error fetching metrics: Service error");
        state.notify(NotificationLevel::Success, "All data refreshed successfully");

        DashboardSnapshot {
            state,
            analytics: Arc::new(AnalyticsSnapshot::empty(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )),
            polling: PollingStatus {
                running: !paused,
                paused,
                cycles: 4,
                interval: Duration::from_secs(30),
            },
        }
    }

    #[test]
    fn test_render_status_bar() {
        let mut confirming = App::new();
        confirming.handle_key(KeyCode::Char('f'));

        struct TestCase {
            snapshot: DashboardSnapshot,
            app: App,
            expected: &'static [&'static str],
        }

        let tests = vec![
            TestCase {
                // TC0: running, last notification shown
                snapshot: snapshot(false),
                app: App::new(),
                expected: &[
                    "AUTO-REFRESH 30s",
                    "cycles 4",
                    "policy primary_only",
                    "All data refreshed successfully",
                ],
            },
            TestCase {
                // TC1: paused
                snapshot: snapshot(true),
                app: App::new(),
                expected: &["AUTO-REFRESH PAUSED"],
            },
            TestCase {
                // TC2: confirmation prompt replaces the notification
                snapshot: snapshot(false),
                app: confirming,
                expected: &["Initiate manual failover to a replica? (y/n)"],
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let text = render_text(160, 4, |f| {
                let area = f.area();
                render_status_bar(f, area, &test.snapshot, &test.app)
            });
            for expected in test.expected {
                assert!(text.contains(expected), "TC{} failed: {expected} missing", index);
            }
        }
    }

    #[test]
    fn test_notifications_newest_first() {
        let state = snapshot(false).state;
        let text = render_text(80, 6, |f| {
            let area = f.area();
            render_notifications_panel(f, area, &state.notifications)
        });

        let newest = text.find("All data refreshed successfully").unwrap();
        let oldest = text.find("Error fetching metrics").unwrap();
        assert!(newest < oldest);
    }

    #[test]
    fn test_no_notifications_placeholder() {
        let text = render_text(40, 4, |f| {
            let area = f.area();
            render_notifications_panel(f, area, &VecDeque::new())
        });
        assert!(text.contains("No notifications"));
    }
}
