// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for daemon specs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use qc_adapters::{
    FakeQueueBackend, FakeWorkerBackend, LocalStorage, MemoryCatalog, TomlConfigStore,
};
use qc_core::FakeClock;
use qc_daemon::protocol::{read_response, write_request};
use qc_daemon::{startup, Config, LifecycleError, StartupResult};
use qc_engine::{Backends, PlaneDeps};
use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub use qc_core::test_support::{jobs_in_state, record};
pub use qc_core::{
    CircuitState, FindingType, HousekeepingConfig, JobState, LifecycleState, RecordStatus,
    WorkerAction, WorkerId,
};
pub use qc_daemon::{Request, Response};
pub use qc_engine::CommandOutcome;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings used by most specs: two queues and two worker types.
pub const SETTINGS: &str = r#"
[breaker]
failure_threshold = 3
reset_timeout_ms = 30000

[[queue]]
name = "process-image"
display_name = "Image Processing"

[[queue]]
name = "email"

[[worker]]
id = "image-processing"
concurrency = 4

[[worker]]
id = "email"
"#;

pub struct SpecBackends;

impl Backends for SpecBackends {
    type Queue = FakeQueueBackend;
    type Workers = FakeWorkerBackend;
    type Config = TomlConfigStore;
    type Storage = LocalStorage<MemoryCatalog>;
    type Clock = FakeClock;
}

/// A state directory and a media root that outlive individual daemons.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new(settings: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("state")).unwrap();
        std::fs::create_dir_all(dir.path().join("media")).unwrap();
        std::fs::write(dir.path().join("state/qc.toml"), settings).unwrap();
        Self { dir }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    /// Write a media file under the media root and return its full path.
    pub fn media_file(&self, rel_path: &str, bytes: usize) -> PathBuf {
        let path = self.media_dir().join(rel_path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, vec![b'x'; bytes]).unwrap();
        path
    }

    /// Start a daemon over fresh in-memory backends.
    pub async fn start(&self) -> Daemon {
        self.start_with_catalog(MemoryCatalog::new()).await
    }

    pub async fn start_with_catalog(&self, catalog: MemoryCatalog) -> Daemon {
        let mut config = Config::for_state_dir(self.state_dir()).unwrap();
        config.poll_interval = Duration::ZERO;

        let clock = FakeClock::new();
        let queue = Arc::new(FakeQueueBackend::new());
        let workers = Arc::new(FakeWorkerBackend::running(clock.clone()));
        let deps = PlaneDeps::<SpecBackends> {
            queue: Arc::clone(&queue),
            workers: Arc::clone(&workers),
            config_store: Arc::new(TomlConfigStore::new(&config.workers_path)),
            storage: Arc::new(LocalStorage::new(self.media_dir(), Arc::new(catalog))),
            probes: Vec::new(),
        };

        let StartupResult { daemon, listener } =
            startup(&config, deps, clock.clone()).await.unwrap();
        let shutdown = daemon.shutdown_handle();
        let task = tokio::spawn(daemon.run(listener));
        Daemon { config, queue, workers, clock, shutdown, task }
    }
}

/// A running daemon and handles to the fakes behind it.
pub struct Daemon {
    pub config: Config,
    pub queue: Arc<FakeQueueBackend>,
    pub workers: Arc<FakeWorkerBackend>,
    pub clock: FakeClock,
    shutdown: Arc<Notify>,
    task: JoinHandle<Result<(), LifecycleError>>,
}

impl Daemon {
    /// Send one request on a fresh connection.
    pub async fn send(&self, request: Request) -> Response {
        let stream = UnixStream::connect(&self.config.socket_path).await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        write_request(&mut writer, &request, IO_TIMEOUT).await.unwrap();
        read_response(&mut reader, IO_TIMEOUT).await.unwrap()
    }

    /// Ask the daemon to shut down over the socket and wait for it to exit.
    pub async fn stop(self) {
        assert_eq!(self.send(Request::Shutdown).await, Response::ShuttingDown);
        self.wait().await;
    }

    /// Stop without going through the socket.
    pub async fn kill(self) {
        self.shutdown.notify_one();
        self.wait().await;
    }

    async fn wait(self) {
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("daemon did not exit")
            .unwrap()
            .unwrap();
    }
}
