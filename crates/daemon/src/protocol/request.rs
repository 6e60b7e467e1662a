// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use qc_core::{HousekeepingConfig, JobId, JobState, WorkerConfigPatch, WorkerId};
use serde::{Deserialize, Serialize};

/// Request from a client (HTTP gateway, operator tooling) to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Request daemon shutdown
    Shutdown,

    /// Dashboard snapshot; `refresh` bypasses the cache
    QueueStats {
        #[serde(default)]
        refresh: bool,
    },

    /// Queue backend circuit status
    BreakerStatus,

    /// One page of jobs, newest first
    QueueJobs {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        queue: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<JobState>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },

    /// Full job record with payloads
    JobDetail { id: JobId },

    /// Move every failed job of a queue back to pending
    QueueReprocess { queue: String },

    /// Remove failed jobs, and optionally pending, active and completed ones
    QueueEmpty {
        queue: String,
        #[serde(default = "default_true")]
        keep_completed: bool,
        #[serde(default)]
        include_pending: bool,
        #[serde(default)]
        include_active: bool,
    },

    WorkerStart,
    WorkerStop,
    WorkerRestart,

    /// Current lifecycle state and the latest heartbeat
    WorkerState,

    /// Effective configuration of every known worker type
    WorkerConfigs,

    WorkerSetEnabled { worker: WorkerId, enabled: bool },

    WorkerUpdate { worker: WorkerId, patch: WorkerConfigPatch },

    /// Report what a housekeeping run would clean (always a dry run)
    HousekeepingAnalyze {
        #[serde(default)]
        config: HousekeepingConfig,
    },

    /// Run housekeeping; deletes only when `config.dry_run` is false
    HousekeepingRun {
        #[serde(default)]
        config: HousekeepingConfig,
    },
}

fn default_true() -> bool {
    true
}

impl Request {
    /// Read-only requests, logged at debug level since clients poll them.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Request::Ping
                | Request::QueueStats { .. }
                | Request::BreakerStatus
                | Request::QueueJobs { .. }
                | Request::JobDetail { .. }
                | Request::WorkerState
                | Request::WorkerConfigs
                | Request::HousekeepingAnalyze { .. }
        )
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
