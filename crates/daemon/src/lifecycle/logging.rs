// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon log output.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::{Config, LifecycleError};

/// Install the global subscriber, appending to `config.log_path`.
///
/// The returned guard flushes buffered lines when dropped, so the embedding
/// process must hold it for as long as the daemon runs.
pub fn setup_logging(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    let dir = config.log_path.parent().unwrap_or(&config.state_dir);
    std::fs::create_dir_all(dir)?;
    let file_name = config
        .log_path
        .file_name()
        .ok_or_else(|| LifecycleError::Logging("log path has no file name".to_string()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(crate::env::log_filter())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;
    Ok(guard)
}
