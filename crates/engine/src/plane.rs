// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control plane: every component wired to one set of backends.
//!
//! Constructed once at startup and shared by reference. The stats cache and
//! the queue breaker are shared between components so that any mutation
//! invalidates the next snapshot and every queue call sees the same circuit.

use qc_adapters::{ConfigStore, HealthProbe, QueueBackend, StorageBackend, WorkerBackend};
use qc_core::{Clock, QueueDescriptor, WorkerConfiguration, WorkerId};
use std::sync::Arc;

use crate::{
    BreakerConfig, CircuitBreaker, HousekeepingEngine, LifecycleConfig, QueueRemediationOps,
    QueueStatsAggregator, StatsCache, StatsConfig, WorkerConfigRegistry, WorkerLifecycleController,
};

/// The concrete backend types a control plane runs against.
pub trait Backends: Send + Sync + 'static {
    type Queue: QueueBackend;
    type Workers: WorkerBackend;
    type Config: ConfigStore;
    type Storage: StorageBackend;
    type Clock: Clock;
}

pub struct PlaneDeps<B: Backends> {
    pub queue: Arc<B::Queue>,
    pub workers: Arc<B::Workers>,
    pub config_store: Arc<B::Config>,
    pub storage: Arc<B::Storage>,
    pub probes: Vec<Arc<dyn HealthProbe>>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaneConfig {
    pub queues: Vec<QueueDescriptor>,
    /// Known worker types and their default configuration.
    pub workers: Vec<(WorkerId, WorkerConfiguration)>,
    pub breaker: BreakerConfig,
    pub stats: StatsConfig,
    pub lifecycle: LifecycleConfig,
}

pub struct ControlPlane<B: Backends> {
    stats: QueueStatsAggregator<B::Queue, B::Workers, B::Clock>,
    lifecycle: WorkerLifecycleController<B::Workers, B::Clock>,
    registry: WorkerConfigRegistry<B::Config, B::Clock>,
    remediation: QueueRemediationOps<B::Queue, B::Clock>,
    housekeeping: HousekeepingEngine<B::Storage, B::Clock>,
    breaker: Arc<CircuitBreaker<B::Clock>>,
    cache: Arc<StatsCache>,
}

impl<B: Backends> ControlPlane<B> {
    pub fn new(config: PlaneConfig, deps: PlaneDeps<B>, clock: B::Clock) -> Self {
        let breaker = Arc::new(CircuitBreaker::new("queue", config.breaker, clock.clone()));
        let cache = Arc::new(StatsCache::new());
        Self {
            stats: QueueStatsAggregator::new(
                config.queues.clone(),
                Arc::clone(&deps.queue),
                Arc::clone(&deps.workers),
                deps.probes,
                Arc::clone(&breaker),
                Arc::clone(&cache),
                config.stats,
                clock.clone(),
            ),
            lifecycle: WorkerLifecycleController::new(
                deps.workers,
                Arc::clone(&cache),
                config.lifecycle,
                clock.clone(),
            ),
            registry: WorkerConfigRegistry::new(deps.config_store, config.workers, clock.clone()),
            remediation: QueueRemediationOps::new(
                config.queues,
                deps.queue,
                Arc::clone(&breaker),
                Arc::clone(&cache),
            ),
            housekeeping: HousekeepingEngine::new(deps.storage, clock),
            breaker,
            cache,
        }
    }

    pub fn stats(&self) -> &QueueStatsAggregator<B::Queue, B::Workers, B::Clock> {
        &self.stats
    }

    pub fn lifecycle(&self) -> &WorkerLifecycleController<B::Workers, B::Clock> {
        &self.lifecycle
    }

    pub fn registry(&self) -> &WorkerConfigRegistry<B::Config, B::Clock> {
        &self.registry
    }

    pub fn remediation(&self) -> &QueueRemediationOps<B::Queue, B::Clock> {
        &self.remediation
    }

    pub fn housekeeping(&self) -> &HousekeepingEngine<B::Storage, B::Clock> {
        &self.housekeeping
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker<B::Clock>> {
        &self.breaker
    }

    pub fn cache(&self) -> &Arc<StatsCache> {
        &self.cache
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{Backends, ControlPlane, PlaneConfig, PlaneDeps};
    use qc_adapters::{
        FakeProbe, FakeQueueBackend, FakeStorageBackend, FakeWorkerBackend, HealthProbe,
        MemoryConfigStore,
    };
    use qc_core::{FakeClock, QueueDescriptor, WorkerConfiguration, WorkerId};
    use std::sync::Arc;

    /// Backend set made of in-memory fakes.
    pub struct FakeBackends;

    impl Backends for FakeBackends {
        type Queue = FakeQueueBackend;
        type Workers = FakeWorkerBackend;
        type Config = MemoryConfigStore;
        type Storage = FakeStorageBackend;
        type Clock = FakeClock;
    }

    /// A control plane over fakes, with handles to drive them.
    pub struct FakePlane {
        pub plane: Arc<ControlPlane<FakeBackends>>,
        pub queue: Arc<FakeQueueBackend>,
        pub workers: Arc<FakeWorkerBackend>,
        pub config_store: Arc<MemoryConfigStore>,
        pub storage: Arc<FakeStorageBackend>,
        pub database: FakeProbe,
        pub clock: FakeClock,
    }

    impl FakePlane {
        /// Queues `process-image`, `email` and `cleanup`; worker types
        /// `image-processing`, `email`, `cleanup` and `delete-media`.
        pub fn new() -> Self {
            Self::with_config(PlaneConfig {
                queues: ["process-image", "email", "cleanup"]
                    .into_iter()
                    .map(QueueDescriptor::new)
                    .collect(),
                workers: ["image-processing", "email", "cleanup", "delete-media"]
                    .into_iter()
                    .map(|id| (WorkerId::from(id), WorkerConfiguration::default()))
                    .collect(),
                ..PlaneConfig::default()
            })
        }

        pub fn with_config(config: PlaneConfig) -> Self {
            let clock = FakeClock::new();
            let queue = Arc::new(FakeQueueBackend::new());
            let workers = Arc::new(FakeWorkerBackend::running(clock.clone()));
            let config_store = Arc::new(MemoryConfigStore::new());
            let storage = Arc::new(FakeStorageBackend::new());
            let database = FakeProbe::healthy("database");
            let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(database.clone())];
            let plane = Arc::new(ControlPlane::new(
                config,
                PlaneDeps {
                    queue: Arc::clone(&queue),
                    workers: Arc::clone(&workers),
                    config_store: Arc::clone(&config_store),
                    storage: Arc::clone(&storage),
                    probes,
                },
                clock.clone(),
            ));
            Self { plane, queue, workers, config_store, storage, database, clock }
        }
    }

    impl Default for FakePlane {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBackends, FakePlane};

#[cfg(test)]
#[path = "plane_tests.rs"]
mod tests;
