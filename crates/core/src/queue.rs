// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue descriptors, per-queue counts and the dashboard snapshot.

use serde::{Deserialize, Serialize};

use crate::health::HealthReport;
use crate::job::{JobRecord, JobState};
use crate::worker::WorkerStatus;

/// A queue the control plane knows about, as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

impl QueueDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { display_name: name.clone(), name, description: String::new() }
    }

    pub fn titled(mut self, display_name: impl Into<String>, description: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self.description = description.into();
        self
    }
}

/// Job counts for one queue. `retry` jobs are counted as pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: u64,
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
    pub total: u64,
}

impl QueueCounts {
    pub fn new(pending: u64, active: u64, completed: u64, failed: u64) -> Self {
        Self { pending, active, completed, failed, total: pending + active + completed + failed }
    }

    /// Count a stream of job states.
    pub fn tally<I: IntoIterator<Item = JobState>>(states: I) -> Self {
        let (mut pending, mut active, mut completed, mut failed) = (0, 0, 0, 0);
        for state in states {
            match state {
                JobState::Pending | JobState::Retry => pending += 1,
                JobState::Active => active += 1,
                JobState::Completed => completed += 1,
                JobState::Failed => failed += 1,
            }
        }
        Self::new(pending, active, completed, failed)
    }

    pub fn get(&self, state: JobState) -> u64 {
        match state {
            JobState::Pending | JobState::Retry => self.pending,
            JobState::Active => self.active,
            JobState::Completed => self.completed,
            JobState::Failed => self.failed,
        }
    }
}

/// Counts for a named queue as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub name: String,
    pub counts: QueueCounts,
}

/// Per-queue entry of a dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub counts: QueueCounts,
}

impl QueueSnapshot {
    pub fn from_descriptor(desc: &QueueDescriptor, counts: QueueCounts) -> Self {
        let display_name =
            if desc.display_name.is_empty() { &desc.name } else { &desc.display_name };
        Self {
            name: desc.name.clone(),
            display_name: display_name.clone(),
            description: desc.description.clone(),
            counts,
        }
    }
}

/// Everything the dashboard shows from one poll. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub queues: Vec<QueueSnapshot>,
    /// Newest first.
    pub recent_jobs: Vec<JobRecord>,
    /// `None` when the heartbeat could not be read.
    pub worker_status: Option<WorkerStatus>,
    pub health: HealthReport,
    pub taken_at_ms: u64,
    /// Cache generation this snapshot was produced for.
    pub generation: u64,
}

impl DashboardSnapshot {
    pub fn queue(&self, name: &str) -> Option<&QueueSnapshot> {
        self.queues.iter().find(|q| q.name == name)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
