// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard snapshots: queue counts, recent jobs, worker heartbeat and
//! health checks gathered in one pass.
//!
//! Queue counts and the recent-job window come from the queue backend in one
//! breaker-guarded call. The heartbeat and every health probe are settled
//! independently: a failed probe degrades the report instead of failing the
//! snapshot.

use futures_util::future::join_all;
use parking_lot::Mutex;
use qc_adapters::{HealthProbe, QueueBackend, WorkerBackend};
use qc_core::{
    Clock, DashboardSnapshot, HealthCheck, HealthReport, HealthStatus, JobFilter, PageRequest,
    QueueCounts, QueueDescriptor, QueueSnapshot,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{CircuitBreaker, EngineError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Size of the newest-first job window in each snapshot.
    pub recent_jobs: u32,
    pub memory_warn_percent: f64,
    pub disk_warn_percent: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { recent_jobs: 10, memory_warn_percent: 90.0, disk_warn_percent: 90.0 }
    }
}

#[derive(Default)]
struct CacheSlot {
    generation: u64,
    snapshot: Option<Arc<DashboardSnapshot>>,
}

/// Latest snapshot, invalidated by every mutating operation.
///
/// Each invalidation bumps the generation. A snapshot is only served or
/// stored for the generation it was fetched under, so a fetch that raced an
/// invalidation cannot repopulate the cache with pre-mutation data.
#[derive(Default)]
pub struct StatsCache {
    slot: Mutex<CacheSlot>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.slot.lock().generation
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.snapshot = None;
        tracing::debug!(generation = slot.generation, "stats cache invalidated");
    }

    pub fn get(&self) -> Option<Arc<DashboardSnapshot>> {
        let slot = self.slot.lock();
        slot.snapshot.as_ref().filter(|s| s.generation == slot.generation).cloned()
    }

    /// Store `snapshot` if no invalidation happened since it was started.
    pub fn store(&self, snapshot: Arc<DashboardSnapshot>) -> bool {
        let mut slot = self.slot.lock();
        if snapshot.generation != slot.generation {
            return false;
        }
        slot.snapshot = Some(snapshot);
        true
    }
}

pub struct QueueStatsAggregator<Q: QueueBackend, W: WorkerBackend, C: Clock> {
    queues: Vec<QueueDescriptor>,
    queue: Arc<Q>,
    workers: Arc<W>,
    probes: Vec<Arc<dyn HealthProbe>>,
    breaker: Arc<CircuitBreaker<C>>,
    cache: Arc<StatsCache>,
    config: StatsConfig,
    clock: C,
}

impl<Q, W, C> QueueStatsAggregator<Q, W, C>
where
    Q: QueueBackend,
    W: WorkerBackend,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queues: Vec<QueueDescriptor>,
        queue: Arc<Q>,
        workers: Arc<W>,
        probes: Vec<Arc<dyn HealthProbe>>,
        breaker: Arc<CircuitBreaker<C>>,
        cache: Arc<StatsCache>,
        config: StatsConfig,
        clock: C,
    ) -> Self {
        Self { queues, queue, workers, probes, breaker, cache, config, clock }
    }

    pub fn queues(&self) -> &[QueueDescriptor] {
        &self.queues
    }

    pub fn cache(&self) -> &Arc<StatsCache> {
        &self.cache
    }

    /// The cached snapshot if still valid, else a fresh one.
    pub async fn snapshot(&self) -> Result<Arc<DashboardSnapshot>, EngineError> {
        match self.cache.get() {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh().await,
        }
    }

    /// Fetch a new snapshot from the backends, bypassing the cache.
    pub async fn refresh(&self) -> Result<Arc<DashboardSnapshot>, EngineError> {
        let generation = self.cache.generation();
        let names: Vec<String> = self.queues.iter().map(|q| q.name.clone()).collect();
        let window = PageRequest::new(Some(1), Some(self.config.recent_jobs));
        let everything = JobFilter::default();

        let (queue, names_ref, filter) = (&self.queue, &names, &everything);
        let queue_fetch = self.breaker.execute(move || async move {
            tokio::try_join!(queue.get_stats(names_ref), queue.list_jobs(filter, window))
        });
        let heartbeat = self.timed(self.workers.heartbeat());
        let probes = join_all(self.probes.iter().map(|p| self.run_probe(p.as_ref())));

        let (queue_fetch, (heartbeat, heartbeat_ms), mut checks) =
            tokio::join!(queue_fetch, heartbeat, probes);
        let (stats, recent) = queue_fetch?;

        let worker_status = match heartbeat {
            Ok(status) => {
                checks.push(HealthCheck::new("workers", HealthStatus::Healthy, heartbeat_ms));
                Some(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "worker heartbeat unavailable");
                checks.push(
                    HealthCheck::new("workers", HealthStatus::Unhealthy, heartbeat_ms)
                        .with_message(e.to_string()),
                );
                None
            }
        };

        let queues = self
            .queues
            .iter()
            .map(|desc| {
                let counts = stats
                    .iter()
                    .find(|s| s.name == desc.name)
                    .map(|s| s.counts)
                    .unwrap_or_else(QueueCounts::default);
                QueueSnapshot::from_descriptor(desc, counts)
            })
            .collect();

        let snapshot = Arc::new(DashboardSnapshot {
            queues,
            recent_jobs: recent.jobs,
            worker_status,
            health: HealthReport::from_checks(checks),
            taken_at_ms: self.clock.epoch_ms(),
            generation,
        });
        if !self.cache.store(Arc::clone(&snapshot)) {
            tracing::debug!(generation, "snapshot raced an invalidation, not cached");
        }
        Ok(snapshot)
    }

    async fn timed<T>(&self, fut: impl std::future::Future<Output = T>) -> (T, u64) {
        let start = self.clock.now();
        let out = fut.await;
        (out, self.clock.now().saturating_duration_since(start).as_millis() as u64)
    }

    async fn run_probe(&self, probe: &dyn HealthProbe) -> HealthCheck {
        let (reading, latency_ms) = self.timed(probe.probe()).await;
        match reading {
            Ok(reading) => {
                let check = HealthCheck::new(probe.name(), reading.status, latency_ms);
                match reading.message {
                    Some(message) => check.with_message(message),
                    None => check,
                }
            }
            Err(e) => {
                tracing::warn!(check = probe.name(), error = %e, "health check failed");
                HealthCheck::new(probe.name(), HealthStatus::Unhealthy, latency_ms)
                    .with_message(e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
