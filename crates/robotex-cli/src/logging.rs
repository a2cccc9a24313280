use std::{path::Path, str::FromStr};

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Installs the global subscriber: plain text on stdout and, when `log_file` is set, JSON
/// lines in that file. Records from the `log` facade are forwarded as well.
///
/// The returned guard flushes the file on drop and must be kept alive.
pub fn setup(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = tracing::Level::from_str(log_level)
        .map_err(|_| anyhow!("Invalid log level: {}", log_level))?;
    let filter = LevelFilter::from_level(level);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::Layer::default()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = fmt::Layer::default().without_time().with_filter(filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Unable to set global tracing subscriber")?;

    if let Some(path) = log_file {
        tracing::info!("Saving logs to {}", path.display());
    }
    Ok(guard)
}
