// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identity, lifecycle state, heartbeat status and per-type configuration.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Worker-type identifier (e.g. `"image-processing"`, `"email"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for WorkerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Borrow<str> for WorkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Observed state of the worker pool.
///
/// `Starting` and `Stopping` are the windows between issuing a command and the
/// heartbeat confirming it; they are never collapsed into a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

crate::string_enum! {
    LifecycleState {
        Stopped => "stopped",
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
    }
}

impl LifecycleState {
    /// True while a command is waiting for heartbeat confirmation.
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }
}

/// Command sent to the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerAction {
    Start,
    Stop,
    Restart,
}

crate::string_enum! {
    WorkerAction {
        Start => "start",
        Stop => "stop",
        Restart => "restart",
    }
}

/// Heartbeat-derived pool status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub is_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_ms: Option<u64>,
    pub total_workers: u32,
    pub active_workers: u32,
}

impl WorkerStatus {
    /// Whether the heartbeat is recent enough to trust `is_running`.
    pub fn is_fresh(&self, now_ms: u64, max_age_ms: u64) -> bool {
        self.last_heartbeat_ms.is_some_and(|hb| now_ms.saturating_sub(hb) <= max_age_ms)
    }

    /// The pool counts as running only with a fresh heartbeat saying so.
    pub fn confirms_running(&self, now_ms: u64, max_age_ms: u64) -> bool {
        self.is_running && self.is_fresh(now_ms, max_age_ms)
    }
}

/// Configuration for one worker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfiguration {
    pub enabled: bool,
    pub max_retries: u32,
    pub concurrency: u32,
}

impl Default for WorkerConfiguration {
    fn default() -> Self {
        Self { enabled: true, max_retries: 3, concurrency: 1 }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigViolation {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

impl WorkerConfiguration {
    pub fn validate(&self) -> Result<(), ConfigViolation> {
        if self.concurrency == 0 {
            return Err(ConfigViolation::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
}

impl WorkerConfigPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self { enabled: Some(enabled), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.max_retries.is_none() && self.concurrency.is_none()
    }

    pub fn apply(&self, base: WorkerConfiguration) -> WorkerConfiguration {
        WorkerConfiguration {
            enabled: self.enabled.unwrap_or(base.enabled),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            concurrency: self.concurrency.unwrap_or(base.concurrency),
        }
    }
}

/// A configuration value as persisted, with its last-write-wins stamp.
///
/// Ordering between two writes of the same worker is decided by `revision`;
/// `updated_at_ms` is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWorkerConfig {
    #[serde(flatten)]
    pub config: WorkerConfiguration,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl StoredWorkerConfig {
    pub fn initial(config: WorkerConfiguration) -> Self {
        Self { config, revision: 0, updated_at_ms: 0 }
    }

    /// True if `self` should replace `current` under last-write-wins.
    pub fn supersedes(&self, current: &StoredWorkerConfig) -> bool {
        (self.revision, self.updated_at_ms) > (current.revision, current.updated_at_ms)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
