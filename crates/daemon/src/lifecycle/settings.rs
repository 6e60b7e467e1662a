// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `qc.toml` settings file.
//!
//! ```toml
//! [breaker]
//! failure_threshold = 3
//! reset_timeout_ms = 30000
//!
//! [[queue]]
//! name = "process-image"
//! display_name = "Image Processing"
//!
//! [[worker]]
//! id = "image-processing"
//! concurrency = 4
//!
//! [housekeeping]
//! interval_secs = 3600
//! dry_run = false
//! ```

use std::path::Path;

use qc_core::{HousekeepingConfig, QueueDescriptor, WorkerConfigPatch, WorkerConfiguration, WorkerId};
use qc_engine::{BreakerConfig, LifecycleConfig, PlaneConfig, StatsConfig};
use serde::Deserialize;

use super::LifecycleError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub breaker: BreakerConfig,
    #[serde(rename = "queue")]
    pub queues: Vec<QueueDescriptor>,
    /// Known worker types. Omitted fields take the worker defaults.
    #[serde(rename = "worker")]
    pub workers: Vec<WorkerEntry>,
    pub stats: StatsConfig,
    pub lifecycle: LifecycleConfig,
    pub housekeeping: HousekeepingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkerEntry {
    pub id: WorkerId,
    #[serde(flatten)]
    pub overrides: WorkerConfigPatch,
}

impl WorkerEntry {
    pub fn config(&self) -> WorkerConfiguration {
        self.overrides.apply(WorkerConfiguration::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HousekeepingSettings {
    /// Seconds between scheduled runs; 0 disables the schedule.
    pub interval_secs: u64,
    /// Configuration for scheduled runs.
    #[serde(flatten)]
    pub config: HousekeepingConfig,
}

impl Settings {
    /// Read `path`, or defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text)
            .map_err(|source| LifecycleError::Settings { path: path.to_path_buf(), source })
    }

    pub fn plane_config(&self) -> PlaneConfig {
        PlaneConfig {
            queues: self.queues.clone(),
            workers: self.workers.iter().map(|w| (w.id.clone(), w.config())).collect(),
            breaker: self.breaker,
            stats: self.stats.clone(),
            lifecycle: self.lifecycle,
        }
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
