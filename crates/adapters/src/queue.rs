// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue backend: the system of record for job state.

use async_trait::async_trait;
use qc_core::{JobFilter, JobId, JobPage, JobRecord, JobState, PageRequest, QueueStats};

use crate::BackendError;

/// Adapter for the queue backend.
///
/// Mutations are fire-and-confirm: they return once the backend acknowledged
/// the request, with the number of jobs it accepted, not once those jobs have
/// finished transitioning.
#[async_trait]
pub trait QueueBackend: Send + Sync + 'static {
    /// Counts for each named queue. Queues unknown to the backend report zeros.
    async fn get_stats(&self, queues: &[String]) -> Result<Vec<QueueStats>, BackendError>;

    /// Jobs matching `filter`, newest first.
    async fn list_jobs(&self, filter: &JobFilter, page: PageRequest)
        -> Result<JobPage, BackendError>;

    async fn get_job(&self, id: &JobId) -> Result<Option<JobRecord>, BackendError>;

    /// Re-enqueue every failed job of `queue`, keeping payloads.
    async fn requeue_failed(&self, queue: &str) -> Result<u64, BackendError>;

    /// Remove jobs of `queue` in any of `states`.
    async fn remove_jobs(&self, queue: &str, states: &[JobState]) -> Result<u64, BackendError>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> Result<(), BackendError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::QueueBackend;
    use crate::BackendError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use qc_core::{
        JobFilter, JobId, JobPage, JobRecord, JobState, PageRequest, QueueCounts, QueueStats,
    };
    use std::sync::Arc;

    /// Recorded queue backend call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum QueueCall {
        GetStats { queues: Vec<String> },
        ListJobs { filter: JobFilter, page: PageRequest },
        GetJob { id: JobId },
        RequeueFailed { queue: String, count: u64 },
        RemoveJobs { queue: String, states: Vec<JobState>, count: u64 },
        Ping,
    }

    #[derive(Default)]
    struct FakeQueueState {
        jobs: Vec<JobRecord>,
        calls: Vec<QueueCall>,
        unavailable: bool,
        fail_next: u32,
    }

    /// In-memory queue backend for testing.
    #[derive(Clone, Default)]
    pub struct FakeQueueBackend {
        inner: Arc<Mutex<FakeQueueState>>,
    }

    impl FakeQueueBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_jobs(jobs: impl IntoIterator<Item = JobRecord>) -> Self {
            let backend = Self::new();
            backend.push_jobs(jobs);
            backend
        }

        pub fn push_jobs(&self, jobs: impl IntoIterator<Item = JobRecord>) {
            self.inner.lock().jobs.extend(jobs);
        }

        pub fn jobs(&self) -> Vec<JobRecord> {
            self.inner.lock().jobs.clone()
        }

        pub fn count(&self, queue: &str, state: JobState) -> usize {
            self.inner.lock().jobs.iter().filter(|j| j.queue == queue && j.state == state).count()
        }

        pub fn calls(&self) -> Vec<QueueCall> {
            self.inner.lock().calls.clone()
        }

        /// Number of data-bearing calls (everything except `Ping`).
        pub fn fetch_count(&self) -> usize {
            self.inner.lock().calls.iter().filter(|c| !matches!(c, QueueCall::Ping)).count()
        }

        /// Every call fails until reset.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.inner.lock().unavailable = unavailable;
        }

        /// The next `n` calls fail.
        pub fn fail_next(&self, n: u32) {
            self.inner.lock().fail_next = n;
        }

        fn check(state: &mut FakeQueueState) -> Result<(), BackendError> {
            if state.unavailable {
                return Err(BackendError::unavailable("queue", "connection refused"));
            }
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(BackendError::unavailable("queue", "injected failure"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueueBackend for FakeQueueBackend {
        async fn get_stats(&self, queues: &[String]) -> Result<Vec<QueueStats>, BackendError> {
            let mut state = self.inner.lock();
            state.calls.push(QueueCall::GetStats { queues: queues.to_vec() });
            Self::check(&mut state)?;
            Ok(queues
                .iter()
                .map(|name| QueueStats {
                    name: name.clone(),
                    counts: QueueCounts::tally(
                        state.jobs.iter().filter(|j| &j.queue == name).map(|j| j.state),
                    ),
                })
                .collect())
        }

        async fn list_jobs(
            &self,
            filter: &JobFilter,
            page: PageRequest,
        ) -> Result<JobPage, BackendError> {
            let mut state = self.inner.lock();
            state.calls.push(QueueCall::ListJobs { filter: filter.clone(), page });
            Self::check(&mut state)?;
            let mut matching: Vec<JobRecord> =
                state.jobs.iter().filter(|j| filter.matches(j)).cloned().collect();
            matching.sort_by(|a, b| b.created_on_ms.cmp(&a.created_on_ms));
            let total = matching.len() as u64;
            let jobs = matching.into_iter().skip(page.offset()).take(page.limit as usize).collect();
            Ok(JobPage { jobs, total, page: page.page, limit: page.limit })
        }

        async fn get_job(&self, id: &JobId) -> Result<Option<JobRecord>, BackendError> {
            let mut state = self.inner.lock();
            state.calls.push(QueueCall::GetJob { id: id.clone() });
            Self::check(&mut state)?;
            Ok(state.jobs.iter().find(|j| &j.id == id).cloned())
        }

        async fn requeue_failed(&self, queue: &str) -> Result<u64, BackendError> {
            let mut state = self.inner.lock();
            if let Err(e) = Self::check(&mut state) {
                state.calls.push(QueueCall::RequeueFailed { queue: queue.to_string(), count: 0 });
                return Err(e);
            }
            let mut count = 0;
            for job in state.jobs.iter_mut().filter(|j| j.queue == queue) {
                if job.state == JobState::Failed {
                    job.state = JobState::Pending;
                    job.output = serde_json::Value::Null;
                    count += 1;
                }
            }
            state.calls.push(QueueCall::RequeueFailed { queue: queue.to_string(), count });
            Ok(count)
        }

        async fn remove_jobs(&self, queue: &str, states: &[JobState]) -> Result<u64, BackendError> {
            let mut state = self.inner.lock();
            if let Err(e) = Self::check(&mut state) {
                state.calls.push(QueueCall::RemoveJobs {
                    queue: queue.to_string(),
                    states: states.to_vec(),
                    count: 0,
                });
                return Err(e);
            }
            let before = state.jobs.len();
            state.jobs.retain(|j| !(j.queue == queue && states.contains(&j.state)));
            let count = (before - state.jobs.len()) as u64;
            state.calls.push(QueueCall::RemoveJobs {
                queue: queue.to_string(),
                states: states.to_vec(),
                count,
            });
            Ok(count)
        }

        async fn ping(&self) -> Result<(), BackendError> {
            let mut state = self.inner.lock();
            state.calls.push(QueueCall::Ping);
            Self::check(&mut state)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeQueueBackend, QueueCall};

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
