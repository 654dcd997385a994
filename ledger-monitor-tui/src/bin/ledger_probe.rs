/// Ledger Probe
///
/// Runs a single poll cycle against the configured API and prints the resulting dashboard
/// state as JSON on stdout. Exits with status 2 when any subsystem reports an error.
use std::{error::Error, process::ExitCode};

use ledger_monitor::{DashboardConfig, DashboardController, StatusState};
use ledger_monitor_tui::logging::init_stderr_logging;
use serde_json::json;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    init_stderr_logging();

    let controller = DashboardController::new(DashboardConfig::from_env()?)?;
    controller.refresh_all().await;

    let snapshot = controller.snapshot();
    let output = json!({
        "connectivity": snapshot.state.connectivity,
        "ha": snapshot.state.ha,
        "notifications": snapshot.state.notifications,
        "analytics": snapshot.analytics.as_ref(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    let failing = snapshot
        .state
        .connectivity
        .values()
        .filter(|report| report.state == StatusState::Error)
        .map(|report| report.key.as_str())
        .collect::<Vec<_>>();

    if failing.is_empty() {
        info!("all subsystems reachable");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(?failing, "subsystems reporting errors");
        Ok(ExitCode::from(2))
    }
}
