// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local filesystem storage paired with a media catalog.

use async_trait::async_trait;
use parking_lot::Mutex;
use qc_core::{CatalogRecord, FileCandidate, FindingType, RecordStatus};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use super::{DeleteOutcome, StorageBackend};
use crate::BackendError;

/// A catalog record together with the file it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub record: CatalogRecord,
    /// Path relative to the storage root, `/`-separated.
    pub rel_path: String,
}

/// The database side of media storage: which files are known and in what state.
#[async_trait]
pub trait MediaCatalog: Send + Sync + 'static {
    /// Up to `limit` records in `status`, oldest `status_at_ms` first.
    /// Records without a status time sort before all others.
    async fn with_status(
        &self,
        status: RecordStatus,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, BackendError>;

    async fn lookup(&self, rel_path: &str) -> Result<Option<CatalogRecord>, BackendError>;

    async fn mark_deleted(&self, record_id: &str) -> Result<(), BackendError>;
}

/// In-process catalog keyed by relative path.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    entries: Arc<Mutex<BTreeMap<String, CatalogRecord>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, rel_path: impl Into<String>, record: CatalogRecord) {
        self.entries.lock().insert(rel_path.into(), record);
    }

    pub fn status_of(&self, record_id: &str) -> Option<RecordStatus> {
        self.entries.lock().values().find(|r| r.id == record_id).map(|r| r.status)
    }
}

#[async_trait]
impl MediaCatalog for MemoryCatalog {
    async fn with_status(
        &self,
        status: RecordStatus,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, BackendError> {
        let mut matching: Vec<CatalogEntry> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, r)| r.status == status)
            .map(|(path, r)| CatalogEntry { record: r.clone(), rel_path: path.clone() })
            .collect();
        matching.sort_by_key(|e| e.record.status_at_ms);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn lookup(&self, rel_path: &str) -> Result<Option<CatalogRecord>, BackendError> {
        Ok(self.entries.lock().get(rel_path).cloned())
    }

    async fn mark_deleted(&self, record_id: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.lock();
        match entries.values_mut().find(|r| r.id == record_id) {
            Some(record) => {
                record.status = RecordStatus::Deleted;
                Ok(())
            }
            None => Err(BackendError::rejected("catalog", format!("no record {record_id}"))),
        }
    }
}

/// Storage rooted at a local directory.
///
/// Catalog-driven detection types list records in the matching status and
/// stat their files; `physical_orphans` walks the tree and keeps files the
/// catalog does not know.
#[derive(Clone)]
pub struct LocalStorage<M: MediaCatalog> {
    root: PathBuf,
    catalog: Arc<M>,
}

impl<M: MediaCatalog> LocalStorage<M> {
    pub fn new(root: impl Into<PathBuf>, catalog: Arc<M>) -> Self {
        Self { root: root.into(), catalog }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn status_for(finding_type: FindingType) -> Option<RecordStatus> {
        match finding_type {
            FindingType::PendingDeletionFiles => Some(RecordStatus::PendingDeletion),
            FindingType::DeletedStatusFiles => Some(RecordStatus::Deleted),
            FindingType::FailedProcessingFiles => Some(RecordStatus::ProcessingFailed),
            FindingType::AbandonedUploads => Some(RecordStatus::Uploading),
            FindingType::PhysicalOrphans => None,
        }
    }

    fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && path != self.root
    }

    async fn catalog_candidates(
        &self,
        status: RecordStatus,
        max_files: usize,
    ) -> Result<Vec<FileCandidate>, BackendError> {
        let entries = self.catalog.with_status(status, max_files).await?;
        let root = self.root.clone();
        blocking(move || {
            Ok(entries
                .into_iter()
                .map(|entry| {
                    let path = root.join(&entry.rel_path);
                    let stat = stat_file(&path);
                    FileCandidate {
                        name: file_name(&path),
                        size_bytes: stat.map(|(size, _)| size).unwrap_or(0),
                        created_at_ms: stat
                            .map(|(_, mtime)| mtime)
                            .or(entry.record.status_at_ms)
                            .unwrap_or(0),
                        exists: stat.is_some(),
                        path,
                        record: Some(entry.record),
                    }
                })
                .collect())
        })
        .await
    }

    async fn orphan_candidates(&self, max_files: usize) -> Result<Vec<FileCandidate>, BackendError> {
        let root = self.root.clone();
        let files = blocking(move || walk_files(&root)).await?;
        let mut out = Vec::new();
        for (rel_path, path, size_bytes, mtime) in files {
            if self.catalog.lookup(&rel_path).await?.is_some() {
                continue;
            }
            out.push(FileCandidate {
                name: file_name(&path),
                path,
                size_bytes,
                created_at_ms: mtime,
                record: None,
                exists: true,
            });
        }
        out.sort_by_key(FileCandidate::reference_time_ms);
        out.truncate(max_files);
        Ok(out)
    }
}

#[async_trait]
impl<M: MediaCatalog> StorageBackend for LocalStorage<M> {
    async fn list_candidates(
        &self,
        finding_type: FindingType,
        max_files: usize,
    ) -> Result<Vec<FileCandidate>, BackendError> {
        let mut candidates = match Self::status_for(finding_type) {
            Some(status) => self.catalog_candidates(status, max_files).await?,
            None => self.orphan_candidates(max_files).await?,
        };
        candidates.sort_by_key(FileCandidate::reference_time_ms);
        Ok(candidates)
    }

    async fn delete(&self, path: &Path) -> Result<DeleteOutcome, BackendError> {
        if !self.contains(path) {
            return Err(BackendError::rejected(
                "storage",
                format!("{} is outside {}", path.display(), self.root.display()),
            ));
        }
        let path = path.to_path_buf();
        blocking(move || {
            let bytes = match std::fs::metadata(&path) {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(DeleteOutcome::AlreadyGone)
                }
                Err(e) => return Err(e.into()),
            };
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(DeleteOutcome::Deleted { bytes }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyGone),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn mark_deleted(&self, record: &CatalogRecord) -> Result<(), BackendError> {
        self.catalog.mark_deleted(&record.id).await
    }

    async fn remove_empty_dirs(&self, path: &Path) -> Result<u32, BackendError> {
        let root = self.root.clone();
        let path = path.to_path_buf();
        blocking(move || {
            let mut removed = 0;
            let mut dir = path.parent();
            while let Some(current) = dir {
                if !current.starts_with(&root) || current == root {
                    break;
                }
                // Fails on non-empty directories, which ends the climb
                if std::fs::remove_dir(current).is_err() {
                    break;
                }
                tracing::debug!(dir = %current.display(), "removed empty directory");
                removed += 1;
                dir = current.parent();
            }
            Ok(removed)
        })
        .await
    }
}

async fn blocking<T, F>(f: F) -> Result<T, BackendError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, BackendError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BackendError::unavailable("storage", format!("blocking task failed: {e}")))?
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn mtime_ms(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Size and modification time of a regular file, `None` when absent.
fn stat_file(path: &Path) -> Option<(u64, u64)> {
    let meta = std::fs::metadata(path).ok()?;
    meta.is_file().then(|| (meta.len(), mtime_ms(&meta)))
}

/// Every regular file under `root` as (relative path, path, size, mtime).
/// Symlinks are not followed.
fn walk_files(root: &Path) -> Result<Vec<(String, PathBuf, u64, u64)>, BackendError> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let meta = std::fs::symlink_metadata(&path)?;
            if meta.is_dir() {
                stack.push(path);
            } else if meta.is_file() {
                let rel = path
                    .strip_prefix(root)
                    .map(|p| {
                        p.components()
                            .map(|c| c.as_os_str().to_string_lossy())
                            .collect::<Vec<_>>()
                            .join("/")
                    })
                    .unwrap_or_default();
                out.push((rel, path, meta.len(), mtime_ms(&meta)));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
