// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use qc_adapters::{ConfigPingProbe, DiskProbe, HealthProbe, MemoryProbe, QueuePingProbe};
use qc_engine::{Backends, ControlPlane, PlaneDeps};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Config, DaemonState, LifecycleError, StartupResult};

/// Start the daemon against the given backends.
///
/// Built-in health probes (queue backend ping, config store ping, memory and
/// disk usage) are added to any probes already in `deps`.
pub async fn startup<B: Backends>(
    config: &Config,
    deps: PlaneDeps<B>,
    clock: B::Clock,
) -> Result<StartupResult<B>, LifecycleError> {
    match startup_inner(config, deps, clock).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // A failed lock means the files belong to the running daemon
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner<B: Backends>(
    config: &Config,
    mut deps: PlaneDeps<B>,
    clock: B::Clock,
) -> Result<StartupResult<B>, LifecycleError> {
    // 1. Create state directory (needed for socket, lock, etc.)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Open without truncating so a running daemon's PID survives a failed lock.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Assemble the control plane
    let stats = &config.settings.stats;
    let builtin: [Arc<dyn HealthProbe>; 4] = [
        Arc::new(QueuePingProbe::new(Arc::clone(&deps.queue))),
        Arc::new(ConfigPingProbe::new(Arc::clone(&deps.config_store))),
        Arc::new(MemoryProbe::new(stats.memory_warn_percent)),
        Arc::new(DiskProbe::new(config.state_dir.clone(), stats.disk_warn_percent)),
    ];
    deps.probes = builtin.into_iter().chain(std::mem::take(&mut deps.probes)).collect();
    let plane_config = config.plane_config();
    info!(
        queues = plane_config.queues.len(),
        workers = plane_config.workers.len(),
        probes = deps.probes.len(),
        "control plane configured",
    );
    let plane = Arc::new(ControlPlane::new(plane_config, deps, clock));

    // 4. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(pid = std::process::id(), state_dir = %config.state_dir.display(), "daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            plane,
            start_time: Instant::now(),
            shutdown_signal: Arc::new(Notify::new()),
            cancel: CancellationToken::new(),
        },
        listener,
    })
}

/// Remove partial state left by a failed startup.
fn cleanup_on_failure(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
    let _ = std::fs::remove_file(&config.lock_path);
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
