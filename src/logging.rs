use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOG_FILE: &str = "relaybot.log";

fn filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    // serenity logs every gateway heartbeat at info
    match "serenity=warn".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber: stdout always, plus a log file under `log_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive in `main`.
pub fn init(log_dir: Option<&Path>) -> std::io::Result<Option<WorkerGuard>> {
    let stdout = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter());

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry().with(stdout).init();
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(stdout)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(filter()),
        )
        .init();

    Ok(Some(guard))
}
