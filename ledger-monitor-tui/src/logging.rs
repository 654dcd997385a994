use std::{
    fs::OpenOptions,
    io,
    path::Path,
    sync::Mutex,
};

use tracing_subscriber::EnvFilter;

/// `RUST_LOG`, defaulting to `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialise logging for the alternate-screen dashboard: append to `log_file`, or discard
/// everything when none is configured.
pub fn init_file_logging(log_file: Option<&Path>) -> io::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::sink).init(),
    }
    Ok(())
}

/// Initialise logging to stderr, keeping stdout for program output.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .compact()
        .init();
}
