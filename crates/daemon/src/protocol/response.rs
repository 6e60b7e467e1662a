// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use qc_core::{
    BreakerStatus, DashboardSnapshot, HousekeepingRunResult, JobPage, JobRecord, LifecycleState,
    WorkerConfiguration, WorkerId, WorkerStatus,
};
use qc_engine::{CommandOutcome, EngineError, RemediationAck};
use serde::{Deserialize, Serialize};

/// Response from daemon to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    /// Version handshake response
    Hello { version: String },

    ShuttingDown,

    Stats { snapshot: Box<DashboardSnapshot> },

    Breaker { status: BreakerStatus },

    Jobs { page: JobPage },

    Job { job: Box<JobRecord> },

    /// Backend acknowledged a reprocess or empty request
    Remediated { ack: RemediationAck },

    WorkerCommand { outcome: CommandOutcome },

    WorkerLifecycle { state: LifecycleState, status: WorkerStatus },

    WorkerConfigs { workers: BTreeMap<WorkerId, WorkerConfiguration> },

    WorkerConfig { worker: WorkerId, config: WorkerConfiguration },

    Housekeeping { result: Box<HousekeepingRunResult> },

    /// The queue backend circuit is open; retry after the cooldown
    Maintenance { retry_after_ms: u64 },

    /// Error response
    Error { message: String },
}

impl From<EngineError> for Response {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::CircuitOpen { retry_after_ms } => Response::Maintenance { retry_after_ms },
            other => Response::Error { message: other.to_string() },
        }
    }
}
