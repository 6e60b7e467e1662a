// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use qc_adapters::BackendError;
use qc_core::{ConfigViolation, WorkerAction};
use thiserror::Error;

/// Errors surfaced by control plane operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backend was not called because the breaker is cooling down.
    #[error("circuit open, retry in {retry_after_ms}ms")]
    CircuitOpen { retry_after_ms: u64 },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("worker not found: {0}")]
    WorkerNotFound(String),

    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("worker pool rejected {action}: {message}")]
    CommandRejected { action: WorkerAction, message: String },

    #[error("invalid worker configuration: {0}")]
    InvalidConfig(#[from] ConfigViolation),
}

impl EngineError {
    /// Whether callers should present a maintenance state instead of an
    /// operation failure.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}
