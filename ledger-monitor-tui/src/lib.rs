/// Ledger Monitor TUI - Shared Library
///
/// Rendering and key handling shared by the terminal binaries:
/// - ledger-dashboard: interactive connectivity / HA / analytics dashboard
/// - ledger-probe: one poll cycle printed as JSON
pub mod app;
pub mod logging;
pub mod panels;

pub use app::{App, Command, KEY_HELP};
pub use panels::render_dashboard;
