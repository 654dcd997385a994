/// Ledger Dashboard
///
/// Interactive terminal view of platform connectivity, HA cluster state and transaction
/// analytics. Configured through the `LEDGER_*` environment variables; logs go to
/// `LEDGER_LOG_FILE` so the alternate screen stays clean.
use std::{error::Error, io, sync::Arc, time::Duration};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ledger_monitor::{DashboardConfig, DashboardController, NotificationLevel};
use ledger_monitor_tui::{App, Command, logging::init_file_logging, render_dashboard};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = DashboardConfig::from_env()?;
    init_file_logging(config.log_file.as_deref())?;
    info!(api_url = %config.api_url, "starting ledger dashboard");

    let controller = Arc::new(DashboardController::new(config)?);
    controller.start();

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &controller);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    controller.dispose();
    info!("ledger dashboard stopped");
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &Arc<DashboardController>,
) -> Result<(), Box<dyn Error>> {
    let mut app = App::new();

    loop {
        let snapshot = controller.snapshot();
        terminal.draw(|f| render_dashboard(f, &snapshot, &app))?;

        if !event::poll(TICK_RATE)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key.code) {
            Command::Quit => break,
            Command::TogglePause => controller.toggle_pause(),
            Command::RefreshAll => {
                controller.notify(NotificationLevel::Info, "Refreshing all data...");
                let controller = Arc::clone(controller);
                tokio::spawn(async move { controller.refresh_all().await });
            }
            Command::RefreshAnalytics => {
                controller.refresh_analytics();
                controller.notify(NotificationLevel::Info, "Analytics reloaded");
            }
            Command::Run(action) => {
                let controller = Arc::clone(controller);
                tokio::spawn(async move {
                    controller.run_action(action).await;
                });
            }
            Command::None => {}
        }
    }

    Ok(())
}
