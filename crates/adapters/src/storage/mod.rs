// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage backend for housekeeping.
//!
//! The storage side lists candidate files per detection type and removes them.
//! Deletion is idempotent: removing a file that is already gone reports
//! [`DeleteOutcome::AlreadyGone`] rather than failing, since concurrent
//! housekeeping runs may race on the same file.

mod local;

pub use local::{CatalogEntry, LocalStorage, MediaCatalog, MemoryCatalog};

use async_trait::async_trait;
use qc_core::{CatalogRecord, FileCandidate, FindingType};
use std::path::Path;

use crate::BackendError;

/// Result of deleting one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { bytes: u64 },
    AlreadyGone,
}

impl DeleteOutcome {
    pub fn bytes_freed(&self) -> u64 {
        match self {
            Self::Deleted { bytes } => *bytes,
            Self::AlreadyGone => 0,
        }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Up to `max_files` candidates for one detection type, oldest first.
    async fn list_candidates(
        &self,
        finding_type: FindingType,
        max_files: usize,
    ) -> Result<Vec<FileCandidate>, BackendError>;

    async fn delete(&self, path: &Path) -> Result<DeleteOutcome, BackendError>;

    /// First phase of two-phase deletion: flag the catalog record deleted.
    async fn mark_deleted(&self, record: &CatalogRecord) -> Result<(), BackendError>;

    /// Remove now-empty directories above `path`. Returns how many were removed.
    async fn remove_empty_dirs(&self, path: &Path) -> Result<u32, BackendError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{DeleteOutcome, StorageBackend};
    use crate::BackendError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use qc_core::{CatalogRecord, FileCandidate, FindingType};
    use std::collections::{BTreeMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Recorded storage call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum StorageCall {
        List { finding_type: FindingType, max_files: usize },
        Delete { path: PathBuf },
        MarkDeleted { record_id: String },
        RemoveEmptyDirs { path: PathBuf },
    }

    #[derive(Default)]
    struct FakeStorageState {
        candidates: BTreeMap<FindingType, Vec<FileCandidate>>,
        present: HashSet<PathBuf>,
        failing_paths: HashSet<PathBuf>,
        failing_lists: HashSet<FindingType>,
        calls: Vec<StorageCall>,
    }

    /// In-memory storage backend for testing.
    #[derive(Clone, Default)]
    pub struct FakeStorageBackend {
        inner: Arc<Mutex<FakeStorageState>>,
    }

    impl FakeStorageBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Offer `candidate` to the `finding_type` pass. Its file is present
        /// when `candidate.exists` is set.
        pub fn add(&self, finding_type: FindingType, candidate: FileCandidate) {
            let mut state = self.inner.lock();
            if candidate.exists {
                state.present.insert(candidate.path.clone());
            }
            state.candidates.entry(finding_type).or_default().push(candidate);
        }

        pub fn exists(&self, path: impl AsRef<Path>) -> bool {
            self.inner.lock().present.contains(path.as_ref())
        }

        /// Remove a file behind the engine's back.
        pub fn vanish(&self, path: impl AsRef<Path>) {
            self.inner.lock().present.remove(path.as_ref());
        }

        pub fn fail_delete(&self, path: impl Into<PathBuf>) {
            self.inner.lock().failing_paths.insert(path.into());
        }

        pub fn fail_list(&self, finding_type: FindingType) {
            self.inner.lock().failing_lists.insert(finding_type);
        }

        pub fn calls(&self) -> Vec<StorageCall> {
            self.inner.lock().calls.clone()
        }

        pub fn deletes(&self) -> Vec<PathBuf> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    StorageCall::Delete { path } => Some(path),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl StorageBackend for FakeStorageBackend {
        async fn list_candidates(
            &self,
            finding_type: FindingType,
            max_files: usize,
        ) -> Result<Vec<FileCandidate>, BackendError> {
            let mut state = self.inner.lock();
            state.calls.push(StorageCall::List { finding_type, max_files });
            if state.failing_lists.contains(&finding_type) {
                return Err(BackendError::unavailable("storage", "listing failed"));
            }
            let mut out: Vec<FileCandidate> =
                state.candidates.get(&finding_type).cloned().unwrap_or_default();
            for candidate in &mut out {
                candidate.exists = state.present.contains(&candidate.path);
            }
            out.sort_by_key(|c| c.reference_time_ms());
            out.truncate(max_files);
            Ok(out)
        }

        async fn delete(&self, path: &Path) -> Result<DeleteOutcome, BackendError> {
            let mut state = self.inner.lock();
            state.calls.push(StorageCall::Delete { path: path.to_path_buf() });
            if state.failing_paths.contains(path) {
                return Err(BackendError::rejected("storage", "permission denied"));
            }
            if !state.present.remove(path) {
                return Ok(DeleteOutcome::AlreadyGone);
            }
            let bytes = state
                .candidates
                .values()
                .flatten()
                .find(|c| c.path == path)
                .map(|c| c.size_bytes)
                .unwrap_or(0);
            Ok(DeleteOutcome::Deleted { bytes })
        }

        async fn mark_deleted(&self, record: &CatalogRecord) -> Result<(), BackendError> {
            self.inner.lock().calls.push(StorageCall::MarkDeleted { record_id: record.id.clone() });
            Ok(())
        }

        async fn remove_empty_dirs(&self, path: &Path) -> Result<u32, BackendError> {
            self.inner.lock().calls.push(StorageCall::RemoveEmptyDirs { path: path.to_path_buf() });
            Ok(0)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStorageBackend, StorageCall};
