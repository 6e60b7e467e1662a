// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, serving, shutdown.

mod logging;
mod schedule;
mod settings;
mod startup;

#[cfg(test)]
mod test_helpers;

pub use logging::setup_logging;
pub use settings::{HousekeepingSettings, Settings, WorkerEntry};
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use qc_engine::{Backends, ControlPlane, PlaneConfig};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::listener::{ListenCtx, Listener};
use crate::poller::Poller;
use schedule::ScheduledHousekeeping;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/qc)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to persisted worker configuration
    pub workers_path: PathBuf,
    /// Path to the optional settings file
    pub settings_path: PathBuf,
    /// Dashboard auto-refresh interval; zero disables the poller
    pub poll_interval: Duration,
    pub settings: Settings,
}

impl Config {
    /// Load configuration from the resolved state directory.
    pub fn load() -> Result<Self, LifecycleError> {
        Self::for_state_dir(crate::env::state_dir()?)
    }

    /// Derive every path from `state_dir` and read `qc.toml` if present.
    pub fn for_state_dir(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let settings_path = state_dir.join("qc.toml");
        let settings = Settings::load(&settings_path)?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            workers_path: state_dir.join("workers.toml"),
            settings_path,
            poll_interval: crate::env::poll_interval(),
            settings,
            state_dir,
        })
    }

    pub fn plane_config(&self) -> PlaneConfig {
        self.settings.plane_config()
    }
}

/// Daemon state during operation.
pub struct DaemonState<B: Backends> {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub plane: Arc<ControlPlane<B>>,
    /// When daemon started
    pub start_time: Instant,
    shutdown_signal: Arc<Notify>,
    cancel: CancellationToken,
}

/// Result of daemon startup: the daemon state and the bound socket.
pub struct StartupResult<B: Backends> {
    pub daemon: DaemonState<B>,
    pub listener: UnixListener,
}

impl<B: Backends> DaemonState<B> {
    /// Signal that stops [`DaemonState::run`], as a `Shutdown` request does.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown_signal)
    }

    /// Serve requests and run background tasks until shutdown is signalled,
    /// then drain the tasks and clean up.
    pub async fn run(mut self, listener: UnixListener) -> Result<(), LifecycleError> {
        let mut tasks = JoinSet::new();
        let ctx = Arc::new(ListenCtx::new(Arc::clone(&self.plane), self.shutdown_handle()));
        tasks.spawn(Listener::new(listener, ctx).run(self.cancel.clone()));

        if !self.config.poll_interval.is_zero() {
            let poller = Poller::new(Arc::clone(&self.plane), self.config.poll_interval);
            tasks.spawn(poller.run(self.cancel.clone()));
        }

        let housekeeping = &self.config.settings.housekeeping;
        if housekeeping.interval_secs > 0 {
            let task = ScheduledHousekeeping::new(
                Arc::clone(&self.plane),
                Duration::from_secs(housekeeping.interval_secs),
                housekeeping.config.clone(),
            );
            tasks.spawn(task.run(self.cancel.clone()));
        }

        info!(socket = %self.config.socket_path.display(), "daemon ready");
        self.shutdown_signal.notified().await;

        self.cancel.cancel();
        let drained = tokio::time::timeout(crate::env::drain_timeout(), async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("background tasks did not stop within the drain timeout");
            tasks.abort_all();
        }
        self.shutdown()
    }

    /// Remove the socket and PID file. The lock is released when the state
    /// is dropped.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");
        self.cancel.cancel();

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!(uptime_secs = self.start_time.elapsed().as_secs(), "Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Invalid settings in {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to set up logging: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
