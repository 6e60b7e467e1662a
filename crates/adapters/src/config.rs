// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config store for per-worker-type configuration.
//!
//! Stores keep last-write-wins per worker id: a `set` carrying an older
//! revision than the stored value is ignored and the stored value returned.

use async_trait::async_trait;
use parking_lot::Mutex;
use qc_core::{StoredWorkerConfig, WorkerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::BackendError;

#[async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    async fn get(&self, id: &WorkerId) -> Result<Option<StoredWorkerConfig>, BackendError>;

    /// Write `value` unless a newer revision is stored. Returns what is stored
    /// afterwards.
    async fn set(
        &self,
        id: &WorkerId,
        value: StoredWorkerConfig,
    ) -> Result<StoredWorkerConfig, BackendError>;

    async fn list(&self) -> Result<BTreeMap<WorkerId, StoredWorkerConfig>, BackendError>;

    async fn ping(&self) -> Result<(), BackendError> {
        self.list().await.map(|_| ())
    }
}

fn merge_lww(
    entries: &mut BTreeMap<WorkerId, StoredWorkerConfig>,
    id: &WorkerId,
    value: StoredWorkerConfig,
) -> StoredWorkerConfig {
    match entries.get(id) {
        Some(current) if !value.supersedes(current) => *current,
        _ => {
            entries.insert(id.clone(), value);
            value
        }
    }
}

/// Process-local config store.
#[derive(Clone, Default)]
pub struct MemoryConfigStore {
    entries: Arc<Mutex<BTreeMap<WorkerId, StoredWorkerConfig>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, id: &WorkerId) -> Result<Option<StoredWorkerConfig>, BackendError> {
        Ok(self.entries.lock().get(id).copied())
    }

    async fn set(
        &self,
        id: &WorkerId,
        value: StoredWorkerConfig,
    ) -> Result<StoredWorkerConfig, BackendError> {
        Ok(merge_lww(&mut self.entries.lock(), id, value))
    }

    async fn list(&self) -> Result<BTreeMap<WorkerId, StoredWorkerConfig>, BackendError> {
        Ok(self.entries.lock().clone())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkersFile {
    #[serde(default)]
    workers: BTreeMap<WorkerId, StoredWorkerConfig>,
}

/// Config store persisted as a TOML file (`[workers.<id>]` tables).
///
/// File access runs on the blocking pool; the write lock is only held inside
/// the blocking closure.
#[derive(Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<WorkersFile, BackendError> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|e| BackendError::InvalidData(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WorkersFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_file(path: &Path, file: &WorkersFile) -> Result<(), BackendError> {
        let text = toml::to_string_pretty(file)
            .map_err(|e| BackendError::InvalidData(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so readers never see a torn file
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Path, &Mutex<()>) -> Result<T, BackendError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock = Arc::clone(&self.write_lock);
        tokio::task::spawn_blocking(move || f(&path, &lock))
            .await
            .map_err(|e| BackendError::unavailable("config", format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl ConfigStore for TomlConfigStore {
    async fn get(&self, id: &WorkerId) -> Result<Option<StoredWorkerConfig>, BackendError> {
        let id = id.clone();
        self.blocking(move |path, _| Ok(Self::read_file(path)?.workers.get(&id).copied())).await
    }

    async fn set(
        &self,
        id: &WorkerId,
        value: StoredWorkerConfig,
    ) -> Result<StoredWorkerConfig, BackendError> {
        let id = id.clone();
        self.blocking(move |path, lock| {
            let _guard = lock.lock();
            let mut file = Self::read_file(path)?;
            let stored = merge_lww(&mut file.workers, &id, value);
            if stored == value {
                Self::write_file(path, &file)?;
            } else {
                tracing::debug!(worker = %id, revision = value.revision, "ignoring stale config write");
            }
            Ok(stored)
        })
        .await
    }

    async fn list(&self) -> Result<BTreeMap<WorkerId, StoredWorkerConfig>, BackendError> {
        self.blocking(|path, _| Ok(Self::read_file(path)?.workers)).await
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
