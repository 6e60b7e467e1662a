// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool backend: accepts lifecycle commands and reports heartbeats.

use async_trait::async_trait;
use qc_core::{WorkerAction, WorkerStatus};

use crate::BackendError;

/// Adapter for the external worker pool.
///
/// The control plane never owns worker processes; it sends commands and
/// trusts only the heartbeat for the resulting state.
#[async_trait]
pub trait WorkerBackend: Send + Sync + 'static {
    async fn send_command(&self, action: WorkerAction) -> Result<(), BackendError>;

    async fn heartbeat(&self) -> Result<WorkerStatus, BackendError>;

    /// Whether `Restart` is executed by the pool as one atomic command.
    fn supports_atomic_restart(&self) -> bool {
        false
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::WorkerBackend;
    use crate::BackendError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use qc_core::{Clock, FakeClock, WorkerAction, WorkerStatus};
    use std::sync::Arc;

    struct FakeWorkerState {
        running: bool,
        responsive: bool,
        last_heartbeat_ms: Option<u64>,
        total_workers: u32,
        active_workers: u32,
        commands: Vec<WorkerAction>,
        reject: Option<String>,
        unavailable: bool,
        atomic_restart: bool,
    }

    /// Fake worker pool for testing.
    ///
    /// A responsive pool applies commands immediately and heartbeats at the
    /// fake clock's current time while running. An unresponsive pool records
    /// commands but its heartbeat never changes.
    #[derive(Clone)]
    pub struct FakeWorkerBackend {
        inner: Arc<Mutex<FakeWorkerState>>,
        clock: FakeClock,
    }

    impl FakeWorkerBackend {
        pub fn new(clock: FakeClock) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeWorkerState {
                    running: false,
                    responsive: true,
                    last_heartbeat_ms: None,
                    total_workers: 4,
                    active_workers: 0,
                    commands: Vec::new(),
                    reject: None,
                    unavailable: false,
                    atomic_restart: false,
                })),
                clock,
            }
        }

        /// A pool that is already up.
        pub fn running(clock: FakeClock) -> Self {
            let backend = Self::new(clock);
            backend.set_running(true);
            backend
        }

        pub fn set_running(&self, running: bool) {
            let mut state = self.inner.lock();
            state.running = running;
            if running {
                state.last_heartbeat_ms = Some(self.clock.epoch_ms());
            }
        }

        pub fn set_responsive(&self, responsive: bool) {
            self.inner.lock().responsive = responsive;
        }

        pub fn set_active_workers(&self, active: u32) {
            self.inner.lock().active_workers = active;
        }

        pub fn reject_commands(&self, message: Option<&str>) {
            self.inner.lock().reject = message.map(str::to_string);
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            self.inner.lock().unavailable = unavailable;
        }

        pub fn set_atomic_restart(&self, atomic: bool) {
            self.inner.lock().atomic_restart = atomic;
        }

        pub fn commands(&self) -> Vec<WorkerAction> {
            self.inner.lock().commands.clone()
        }
    }

    #[async_trait]
    impl WorkerBackend for FakeWorkerBackend {
        async fn send_command(&self, action: WorkerAction) -> Result<(), BackendError> {
            let mut state = self.inner.lock();
            if state.unavailable {
                return Err(BackendError::unavailable("workers", "connection refused"));
            }
            if let Some(message) = &state.reject {
                return Err(BackendError::rejected("workers", message.clone()));
            }
            state.commands.push(action);
            if state.responsive {
                state.running = !matches!(action, WorkerAction::Stop);
                if state.running {
                    state.last_heartbeat_ms = Some(self.clock.epoch_ms());
                }
            }
            Ok(())
        }

        async fn heartbeat(&self) -> Result<WorkerStatus, BackendError> {
            let mut state = self.inner.lock();
            if state.unavailable {
                return Err(BackendError::unavailable("workers", "connection refused"));
            }
            if state.running && state.responsive {
                state.last_heartbeat_ms = Some(self.clock.epoch_ms());
            }
            Ok(WorkerStatus {
                is_running: state.running,
                last_heartbeat_ms: state.last_heartbeat_ms,
                total_workers: state.total_workers,
                active_workers: if state.running { state.active_workers } else { 0 },
            })
        }

        fn supports_atomic_restart(&self) -> bool {
            self.inner.lock().atomic_restart
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorkerBackend;
