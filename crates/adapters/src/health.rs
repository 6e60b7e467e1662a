// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health probes evaluated alongside each stats snapshot.

use async_trait::async_trait;
use parking_lot::Mutex;
use qc_core::HealthStatus;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::{Disks, System};

use crate::{BackendError, ConfigStore, QueueBackend};

/// What a probe observed. An `Err` from [`HealthProbe::probe`] means the
/// check itself could not run and is reported unhealthy by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReading {
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl ProbeReading {
    pub fn healthy() -> Self {
        Self { status: HealthStatus::Healthy, message: None }
    }

    /// Degraded at or above `warn_percent`, healthy below it.
    pub fn usage(label: &str, used_percent: f64, warn_percent: f64) -> Self {
        let message = Some(format!("{label} {used_percent:.1}% used"));
        let status =
            if used_percent >= warn_percent { HealthStatus::Degraded } else { HealthStatus::Healthy };
        Self { status, message }
    }
}

#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn probe(&self) -> Result<ProbeReading, BackendError>;
}

fn percent(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64 * 100.0)
}

/// Host memory usage. The `System` handle is reused across probes.
pub struct MemoryProbe {
    sys: Mutex<System>,
    warn_percent: f64,
}

impl MemoryProbe {
    pub fn new(warn_percent: f64) -> Self {
        Self { sys: Mutex::new(System::new()), warn_percent }
    }
}

#[async_trait]
impl HealthProbe for MemoryProbe {
    fn name(&self) -> &str {
        "memory"
    }

    async fn probe(&self) -> Result<ProbeReading, BackendError> {
        let mut sys = self.sys.lock();
        sys.refresh_memory();
        let used = percent(sys.used_memory(), sys.total_memory())
            .ok_or_else(|| BackendError::InvalidData("total memory reported as zero".into()))?;
        Ok(ProbeReading::usage("memory", used, self.warn_percent))
    }
}

/// Usage of the filesystem holding `path` (the storage root or state dir).
pub struct DiskProbe {
    path: PathBuf,
    warn_percent: f64,
}

impl DiskProbe {
    pub fn new(path: impl Into<PathBuf>, warn_percent: f64) -> Self {
        Self { path: path.into(), warn_percent }
    }

    /// (used, total) bytes of the disk whose mount point is the longest
    /// prefix of `path`.
    fn usage_for(path: &Path) -> Option<(u64, u64)> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .iter()
            .filter(|d| path.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .map(|d| (d.total_space().saturating_sub(d.available_space()), d.total_space()))
    }
}

#[async_trait]
impl HealthProbe for DiskProbe {
    fn name(&self) -> &str {
        "disk"
    }

    async fn probe(&self) -> Result<ProbeReading, BackendError> {
        let path = self.path.clone();
        let usage = tokio::task::spawn_blocking(move || Self::usage_for(&path))
            .await
            .map_err(|e| BackendError::unavailable("disk", format!("blocking task failed: {e}")))?;
        let (used, total) = usage.ok_or_else(|| {
            BackendError::InvalidData(format!("no disk mounted for {}", self.path.display()))
        })?;
        let used = percent(used, total)
            .ok_or_else(|| BackendError::InvalidData("disk size reported as zero".into()))?;
        Ok(ProbeReading::usage("disk", used, self.warn_percent))
    }
}

/// Reachability of the queue backend's store.
pub struct QueuePingProbe<Q: QueueBackend> {
    queue: Arc<Q>,
}

impl<Q: QueueBackend> QueuePingProbe<Q> {
    pub fn new(queue: Arc<Q>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl<Q: QueueBackend> HealthProbe for QueuePingProbe<Q> {
    fn name(&self) -> &str {
        "database"
    }

    async fn probe(&self) -> Result<ProbeReading, BackendError> {
        self.queue.ping().await.map(|()| ProbeReading::healthy())
    }
}

/// Reachability of the worker config store.
pub struct ConfigPingProbe<S: ConfigStore> {
    store: Arc<S>,
}

impl<S: ConfigStore> ConfigPingProbe<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ConfigStore> HealthProbe for ConfigPingProbe<S> {
    fn name(&self) -> &str {
        "config"
    }

    async fn probe(&self) -> Result<ProbeReading, BackendError> {
        self.store.ping().await.map(|()| ProbeReading::healthy())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{HealthProbe, ProbeReading};
    use crate::BackendError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use qc_core::HealthStatus;
    use std::sync::Arc;

    #[derive(Clone)]
    enum Scripted {
        Reading(ProbeReading),
        Fail(String),
    }

    /// Probe returning a scripted reading.
    #[derive(Clone)]
    pub struct FakeProbe {
        name: String,
        next: Arc<Mutex<Scripted>>,
    }

    impl FakeProbe {
        pub fn healthy(name: &str) -> Self {
            Self {
                name: name.to_string(),
                next: Arc::new(Mutex::new(Scripted::Reading(ProbeReading::healthy()))),
            }
        }

        pub fn set(&self, status: HealthStatus, message: &str) {
            *self.next.lock() =
                Scripted::Reading(ProbeReading { status, message: Some(message.to_string()) });
        }

        pub fn fail(&self, message: &str) {
            *self.next.lock() = Scripted::Fail(message.to_string());
        }
    }

    #[async_trait]
    impl HealthProbe for FakeProbe {
        fn name(&self) -> &str {
            &self.name
        }

        async fn probe(&self) -> Result<ProbeReading, BackendError> {
            match self.next.lock().clone() {
                Scripted::Reading(reading) => Ok(reading),
                Scripted::Fail(message) => Err(BackendError::unavailable("probe", message)),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProbe;

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
