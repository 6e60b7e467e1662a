// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve state directory: QC_STATE_DIR > XDG_STATE_HOME/qc > ~/.local/state/qc
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("QC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("qc"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/qc"))
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    duration_ms("QC_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Dashboard auto-refresh interval (`QC_POLL_INTERVAL_MS`, default 5s).
/// Zero disables the poller.
pub fn poll_interval() -> Duration {
    duration_ms("QC_POLL_INTERVAL_MS").unwrap_or(Duration::from_secs(5))
}

/// Shutdown drain timeout (default 5s, configurable via `QC_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    duration_ms("QC_DRAIN_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Log filter directive (`QC_LOG`, default `info`).
pub fn log_filter() -> String {
    std::env::var("QC_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
