// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qc-core: data model shared by the queue control plane crates

pub mod macros;

pub mod circuit;
pub mod clock;
pub mod health;
pub mod housekeeping;
pub mod job;
pub mod queue;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use circuit::{BreakerStatus, CircuitState};
pub use clock::{hours_ms, Clock, FakeClock, SystemClock};
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use housekeeping::{
    CatalogRecord, FileCandidate, FindingType, HousekeepingConfig, HousekeepingError,
    HousekeepingFinding, HousekeepingRunResult, RecordStatus, TypeResult,
};
pub use job::{JobFilter, JobId, JobPage, JobRecord, JobState, PageRequest};
pub use queue::{DashboardSnapshot, QueueCounts, QueueDescriptor, QueueSnapshot, QueueStats};
pub use worker::{
    ConfigViolation, LifecycleState, StoredWorkerConfig, WorkerAction, WorkerConfigPatch,
    WorkerConfiguration, WorkerId, WorkerStatus,
};

/// A string did not name any variant of a [`string_enum!`] type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}
