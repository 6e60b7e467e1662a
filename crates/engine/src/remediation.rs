// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator remediation on named queues: reprocess failed jobs, empty a
//! queue, and browse jobs.
//!
//! Mutations are fire-and-confirm: they return once the backend acknowledged
//! the request. Completed jobs are an audit trail and are only removed when
//! the caller explicitly turns `keep_completed` off.

use qc_adapters::QueueBackend;
use qc_core::{Clock, JobFilter, JobId, JobPage, JobRecord, JobState, PageRequest, QueueDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{CircuitBreaker, EngineError, StatsCache};

/// Which jobs `empty` removes. Failed jobs are always removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyOptions {
    pub keep_completed: bool,
    pub include_pending: bool,
    pub include_active: bool,
}

impl Default for EmptyOptions {
    fn default() -> Self {
        Self { keep_completed: true, include_pending: false, include_active: false }
    }
}

impl EmptyOptions {
    /// Job states to remove, always including `Failed`.
    pub fn states(&self) -> Vec<JobState> {
        let mut states = vec![JobState::Failed];
        if self.include_pending {
            states.extend([JobState::Pending, JobState::Retry]);
        }
        if self.include_active {
            states.push(JobState::Active);
        }
        if !self.keep_completed {
            states.push(JobState::Completed);
        }
        states
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationAction {
    Reprocess,
    Empty,
}

/// Backend acknowledgement of a remediation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationAck {
    pub queue: String,
    pub action: RemediationAction,
    /// Jobs the backend accepted for the mutation.
    pub affected: u64,
}

pub struct QueueRemediationOps<Q: QueueBackend, C: Clock> {
    queues: Vec<QueueDescriptor>,
    queue: Arc<Q>,
    breaker: Arc<CircuitBreaker<C>>,
    cache: Arc<StatsCache>,
}

impl<Q: QueueBackend, C: Clock> QueueRemediationOps<Q, C> {
    pub fn new(
        queues: Vec<QueueDescriptor>,
        queue: Arc<Q>,
        breaker: Arc<CircuitBreaker<C>>,
        cache: Arc<StatsCache>,
    ) -> Self {
        Self { queues, queue, breaker, cache }
    }

    fn known(&self, name: &str) -> Result<(), EngineError> {
        if self.queues.iter().any(|q| q.name == name) {
            Ok(())
        } else {
            Err(EngineError::QueueNotFound(name.to_string()))
        }
    }

    /// Move every failed job of `queue` back to pending, keeping payloads.
    /// Zero failed jobs is a successful no-op.
    pub async fn reprocess(&self, queue: &str) -> Result<RemediationAck, EngineError> {
        self.known(queue)?;
        let backend = &self.queue;
        let affected = self.breaker.execute(|| backend.requeue_failed(queue)).await?;
        self.cache.invalidate();
        tracing::info!(queue, affected, "reprocess requested");
        Ok(RemediationAck { queue: queue.to_string(), action: RemediationAction::Reprocess, affected })
    }

    pub async fn empty(
        &self,
        queue: &str,
        options: EmptyOptions,
    ) -> Result<RemediationAck, EngineError> {
        self.known(queue)?;
        let states = options.states();
        let backend = &self.queue;
        let affected = self.breaker.execute(|| backend.remove_jobs(queue, &states)).await?;
        self.cache.invalidate();
        tracing::info!(
            queue,
            affected,
            keep_completed = options.keep_completed,
            states = ?states,
            "empty requested",
        );
        Ok(RemediationAck { queue: queue.to_string(), action: RemediationAction::Empty, affected })
    }

    /// One page of jobs, newest first.
    pub async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: PageRequest,
    ) -> Result<JobPage, EngineError> {
        if let Some(queue) = &filter.queue {
            self.known(queue)?;
        }
        let backend = &self.queue;
        self.breaker.execute(|| backend.list_jobs(filter, page)).await
    }

    /// Full record including input and output payloads.
    pub async fn job_detail(&self, id: &JobId) -> Result<JobRecord, EngineError> {
        let backend = &self.queue;
        self.breaker
            .execute(|| backend.get_job(id))
            .await?
            .ok_or_else(|| EngineError::JobNotFound(id.to_string()))
    }
}

#[cfg(test)]
#[path = "remediation_tests.rs"]
mod tests;
