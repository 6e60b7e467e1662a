// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker-type configuration backed by a [`ConfigStore`].
//!
//! Writes to one worker id are linearized: each gets the next revision under
//! the registry lock, and the store keeps the highest revision it has seen.
//! Writes to different ids never touch each other's entries. Reads go to the
//! store so that changes made elsewhere are picked up on the next poll.

use parking_lot::Mutex;
use qc_adapters::ConfigStore;
use qc_core::{Clock, StoredWorkerConfig, WorkerConfigPatch, WorkerConfiguration, WorkerId};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::EngineError;

pub struct WorkerConfigRegistry<S: ConfigStore, C: Clock> {
    store: Arc<S>,
    /// Worker types configured at startup, with their default values.
    defaults: BTreeMap<WorkerId, WorkerConfiguration>,
    entries: Mutex<BTreeMap<WorkerId, StoredWorkerConfig>>,
    clock: C,
}

impl<S: ConfigStore, C: Clock> WorkerConfigRegistry<S, C> {
    pub fn new(
        store: Arc<S>,
        defaults: impl IntoIterator<Item = (WorkerId, WorkerConfiguration)>,
        clock: C,
    ) -> Self {
        Self {
            store,
            defaults: defaults.into_iter().collect(),
            entries: Mutex::new(BTreeMap::new()),
            clock,
        }
    }

    /// Fold values read from the store into the local view, keeping the newer
    /// revision per id.
    fn absorb(&self, persisted: impl IntoIterator<Item = (WorkerId, StoredWorkerConfig)>) {
        let mut entries = self.entries.lock();
        for (id, value) in persisted {
            match entries.get(&id) {
                Some(current) if !value.supersedes(current) => {}
                _ => {
                    entries.insert(id, value);
                }
            }
        }
    }

    fn is_known(&self, id: &WorkerId) -> bool {
        self.defaults.contains_key(id) || self.entries.lock().contains_key(id)
    }

    /// Every known worker type and its current configuration.
    pub async fn get_all(&self) -> Result<BTreeMap<WorkerId, WorkerConfiguration>, EngineError> {
        let persisted = self.store.list().await?;
        self.absorb(persisted);
        let entries = self.entries.lock();
        let mut all: BTreeMap<WorkerId, WorkerConfiguration> = self.defaults.clone();
        for (id, stored) in entries.iter() {
            all.insert(id.clone(), stored.config);
        }
        Ok(all)
    }

    pub async fn get(&self, id: &WorkerId) -> Result<WorkerConfiguration, EngineError> {
        if let Some(persisted) = self.store.get(id).await? {
            self.absorb([(id.clone(), persisted)]);
        }
        let entries = self.entries.lock();
        entries
            .get(id)
            .map(|s| s.config)
            .or_else(|| self.defaults.get(id).copied())
            .ok_or_else(|| EngineError::WorkerNotFound(id.to_string()))
    }

    /// Consulted by the dispatch path before handing out work.
    pub async fn is_enabled(&self, id: &WorkerId) -> Result<bool, EngineError> {
        Ok(self.get(id).await?.enabled)
    }

    pub async fn set_enabled(
        &self,
        id: &WorkerId,
        enabled: bool,
    ) -> Result<WorkerConfiguration, EngineError> {
        self.update(id, WorkerConfigPatch::enabled(enabled)).await
    }

    /// Apply `patch` to the current value and persist it. Returns the value
    /// that won, which is the patched one unless a newer write landed first.
    pub async fn update(
        &self,
        id: &WorkerId,
        patch: WorkerConfigPatch,
    ) -> Result<WorkerConfiguration, EngineError> {
        if let Some(persisted) = self.store.get(id).await? {
            self.absorb([(id.clone(), persisted)]);
        }
        if !self.is_known(id) {
            return Err(EngineError::WorkerNotFound(id.to_string()));
        }

        let next = {
            let mut entries = self.entries.lock();
            let current = entries.get(id).copied().unwrap_or_else(|| {
                StoredWorkerConfig::initial(self.defaults.get(id).copied().unwrap_or_default())
            });
            let config = patch.apply(current.config);
            config.validate()?;
            let next = StoredWorkerConfig {
                config,
                revision: current.revision + 1,
                updated_at_ms: self.clock.epoch_ms(),
            };
            entries.insert(id.clone(), next);
            next
        };

        let stored = self.store.set(id, next).await?;
        self.absorb([(id.clone(), stored)]);
        if stored == next {
            tracing::info!(
                worker = %id,
                enabled = stored.config.enabled,
                max_retries = stored.config.max_retries,
                concurrency = stored.config.concurrency,
                revision = stored.revision,
                "worker config updated",
            );
        } else {
            tracing::info!(worker = %id, revision = next.revision, kept = stored.revision, "newer worker config already stored");
        }
        Ok(stored.config)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
