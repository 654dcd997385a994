//! Key handling for the interactive dashboard, independent of the terminal.

use crossterm::event::KeyCode;
use ledger_monitor::{AdminAction, RoutingPolicy};

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePause,
    RefreshAll,
    RefreshAnalytics,
    Run(AdminAction),
    None,
}

/// Keys shown in the status bar.
pub const KEY_HELP: &str =
    "q quit | p pause | r refresh | a analytics | f failover | b backup | x reset | o policy | u apply";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    /// Routing policy applied by `u`
    pub selected_policy: RoutingPolicy,
    /// Destructive action waiting for `y`/`n`
    pub pending: Option<AdminAction>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            selected_policy: RoutingPolicy::PrimaryOnly,
            pending: None,
        }
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Command {
        if let Some(action) = self.pending.take() {
            return match code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Command::Run(action),
                _ => Command::None,
            };
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            KeyCode::Char('p') => Command::TogglePause,
            KeyCode::Char('r') => Command::RefreshAll,
            KeyCode::Char('a') => Command::RefreshAnalytics,
            KeyCode::Char('b') => Command::Run(AdminAction::Backup),
            KeyCode::Char('f') => self.confirm(AdminAction::Failover),
            KeyCode::Char('x') => self.confirm(AdminAction::Reset),
            KeyCode::Char('o') => {
                self.selected_policy = self.selected_policy.next();
                Command::None
            }
            KeyCode::Char('u') => {
                Command::Run(AdminAction::UpdateRoutingPolicy(self.selected_policy))
            }
            _ => Command::None,
        }
    }

    fn confirm(&mut self, action: AdminAction) -> Command {
        self.pending = Some(action);
        Command::None
    }

    /// Question shown while an action awaits confirmation.
    pub fn prompt(&self) -> Option<&'static str> {
        match self.pending.as_ref()? {
            AdminAction::Failover => Some("Initiate manual failover to a replica? (y/n)"),
            AdminAction::Reset => Some("Reset the entire HA infrastructure? (y/n)"),
            _ => None,
        }
    }
}
