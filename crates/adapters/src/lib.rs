// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qc-adapters: boundaries to the queue backend, worker pool, config store,
//! media storage and host health probes

mod error;

pub mod config;
pub mod health;
pub mod queue;
pub mod storage;
pub mod worker;

pub use config::{ConfigStore, MemoryConfigStore, TomlConfigStore};
pub use error::BackendError;
pub use health::{ConfigPingProbe, DiskProbe, HealthProbe, MemoryProbe, ProbeReading, QueuePingProbe};
pub use queue::QueueBackend;
pub use storage::{
    CatalogEntry, DeleteOutcome, LocalStorage, MediaCatalog, MemoryCatalog, StorageBackend,
};
pub use worker::WorkerBackend;

#[cfg(any(test, feature = "test-support"))]
pub use health::FakeProbe;
#[cfg(any(test, feature = "test-support"))]
pub use queue::{FakeQueueBackend, QueueCall};
#[cfg(any(test, feature = "test-support"))]
pub use storage::{FakeStorageBackend, StorageCall};
#[cfg(any(test, feature = "test-support"))]
pub use worker::FakeWorkerBackend;
