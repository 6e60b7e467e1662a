// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use qc_adapters::{FakeQueueBackend, FakeStorageBackend, FakeWorkerBackend, MemoryConfigStore};
use qc_core::{FakeClock, QueueDescriptor};
use qc_engine::{FakeBackends, PlaneDeps};

use super::{Config, Settings, WorkerEntry};

pub(super) struct Fakes {
    pub queue: Arc<FakeQueueBackend>,
    pub workers: Arc<FakeWorkerBackend>,
    pub clock: FakeClock,
}

pub(super) fn fake_deps() -> (PlaneDeps<FakeBackends>, Fakes) {
    let clock = FakeClock::new();
    let queue = Arc::new(FakeQueueBackend::new());
    let workers = Arc::new(FakeWorkerBackend::running(clock.clone()));
    let deps = PlaneDeps {
        queue: Arc::clone(&queue),
        workers: Arc::clone(&workers),
        config_store: Arc::new(MemoryConfigStore::new()),
        storage: Arc::new(FakeStorageBackend::new()),
        probes: Vec::new(),
    };
    (deps, Fakes { queue, workers, clock })
}

/// Config rooted at `dir` with two queues, one worker and no poller.
pub(super) fn test_config(dir: &Path) -> Config {
    let mut config = Config::for_state_dir(dir.to_path_buf()).unwrap();
    config.poll_interval = Duration::ZERO;
    config.settings = Settings {
        queues: vec![QueueDescriptor::new("process-image"), QueueDescriptor::new("email")],
        workers: vec![WorkerEntry { id: "email".into(), overrides: Default::default() }],
        ..Settings::default()
    };
    config
}
