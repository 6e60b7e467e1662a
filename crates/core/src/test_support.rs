// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::path::PathBuf;

use crate::housekeeping::{CatalogRecord, FileCandidate, RecordStatus};
use crate::job::{JobId, JobRecord, JobState};

crate::builder! {
    pub struct JobRecordBuilder => JobRecord {
        into {
            id: JobId = "job-1",
            queue: String = "default",
        }
        set {
            state: JobState = JobState::Pending,
            priority: i32 = 0,
            created_on_ms: u64 = 1_000_000,
            input: serde_json::Value = serde_json::Value::Null,
            output: serde_json::Value = serde_json::Value::Null,
            started_on_ms: Option<u64> = None,
            completed_on_ms: Option<u64> = None,
            duration_ms: Option<u64> = None,
        }
    }
}

crate::builder! {
    pub struct FileCandidateBuilder => FileCandidate {
        into {
            name: String = "file.bin",
            path: PathBuf = "/media/file.bin",
        }
        set {
            size_bytes: u64 = 1024,
            created_at_ms: u64 = 0,
            exists: bool = true,
        }
        option {
            record: CatalogRecord = None,
        }
    }
}

/// `count` jobs in `state` on `queue`, ids `{queue}-{state}-{i}`.
pub fn jobs_in_state(queue: &str, state: JobState, count: usize) -> Vec<JobRecord> {
    (0..count)
        .map(|i| {
            JobRecord::builder()
                .id(format!("{queue}-{state}-{i}"))
                .queue(queue)
                .state(state)
                .created_on_ms(1_000_000 + i as u64)
                .build()
        })
        .collect()
}

/// A catalog record in `status` since `status_at_ms`.
pub fn record(id: &str, status: RecordStatus, status_at_ms: u64) -> CatalogRecord {
    CatalogRecord { id: id.to_string(), status, status_at_ms: Some(status_at_ms) }
}

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core value types.
pub mod strategies {
    use crate::job::JobState;
    use crate::worker::{WorkerConfigPatch, WorkerConfiguration};
    use proptest::prelude::*;

    pub fn arb_job_state() -> impl Strategy<Value = JobState> {
        prop::sample::select(JobState::ALL.to_vec())
    }

    pub fn arb_worker_config() -> impl Strategy<Value = WorkerConfiguration> {
        (any::<bool>(), 0u32..20, 1u32..64).prop_map(|(enabled, max_retries, concurrency)| {
            WorkerConfiguration { enabled, max_retries, concurrency }
        })
    }

    pub fn arb_patch() -> impl Strategy<Value = WorkerConfigPatch> {
        (any::<Option<bool>>(), prop::option::of(0u32..20), prop::option::of(1u32..64)).prop_map(
            |(enabled, max_retries, concurrency)| WorkerConfigPatch {
                enabled,
                max_retries,
                concurrency,
            },
        )
    }
}
