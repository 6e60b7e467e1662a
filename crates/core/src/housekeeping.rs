// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Housekeeping data model: detection types, candidates, findings and results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// The five independent detection passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    PendingDeletionFiles,
    DeletedStatusFiles,
    FailedProcessingFiles,
    AbandonedUploads,
    PhysicalOrphans,
}

crate::string_enum! {
    FindingType {
        PendingDeletionFiles => "pending_deletion_files",
        DeletedStatusFiles => "deleted_status_files",
        FailedProcessingFiles => "failed_processing_files",
        AbandonedUploads => "abandoned_uploads",
        PhysicalOrphans => "physical_orphans",
    }
}

/// Status of the catalog (database) record behind a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    PendingDeletion,
    Deleted,
    ProcessingFailed,
    Uploading,
}

crate::string_enum! {
    RecordStatus {
        Active => "active",
        PendingDeletion => "pending_deletion",
        Deleted => "deleted",
        ProcessingFailed => "processing_failed",
        Uploading => "uploading",
    }
}

/// Catalog record attached to a candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub status: RecordStatus,
    /// When the record entered its current status (flagged, failed, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_at_ms: Option<u64>,
}

/// A file the storage backend offers for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at_ms: u64,
    /// `None` when no catalog record references the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<CatalogRecord>,
    /// Whether the physical file was present when listed.
    pub exists: bool,
}

impl FileCandidate {
    /// Timestamp used for oldest-first ordering and grace periods: the status
    /// change time when known, else the file creation time.
    pub fn reference_time_ms(&self) -> u64 {
        self.record.as_ref().and_then(|r| r.status_at_ms).unwrap_or(self.created_at_ms)
    }

    pub fn record_status(&self) -> Option<RecordStatus> {
        self.record.as_ref().map(|r| r.status)
    }
}

/// A candidate that matched its detection predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingFinding {
    pub finding_type: FindingType,
    pub name: String,
    pub path: PathBuf,
    pub reason: String,
    pub size_bytes: u64,
}

/// Parameters for one housekeeping invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HousekeepingConfig {
    pub dry_run: bool,
    /// Candidates scanned per detection type.
    pub max_files: usize,
    pub grace_period_hours: u64,
    pub detection_types: BTreeSet<FindingType>,
    pub log_details: bool,
    /// Uploads older than this without completion are abandoned.
    pub abandoned_upload_hours: u64,
    /// Mark catalog records deleted before removing their files.
    pub two_phase_deletion: bool,
    /// Remove directories left empty by a deletion.
    pub cleanup_empty_dirs: bool,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            max_files: 1000,
            grace_period_hours: 24,
            detection_types: FindingType::ALL.iter().copied().collect(),
            log_details: false,
            abandoned_upload_hours: 24,
            two_phase_deletion: true,
            cleanup_empty_dirs: true,
        }
    }
}

impl HousekeepingConfig {
    crate::setters! {
        set {
            dry_run: bool,
            max_files: usize,
            grace_period_hours: u64,
            log_details: bool,
            abandoned_upload_hours: u64,
            two_phase_deletion: bool,
            cleanup_empty_dirs: bool,
        }
    }

    /// Restrict detection to the given types.
    pub fn only(mut self, types: impl IntoIterator<Item = FindingType>) -> Self {
        self.detection_types = types.into_iter().collect();
        self
    }
}

/// Per-type outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeResult {
    pub finding_type: FindingType,
    pub processed: u64,
    pub cleaned: u64,
    pub size_freed_bytes: u64,
    pub findings: Vec<HousekeepingFinding>,
}

impl TypeResult {
    pub fn empty(finding_type: FindingType) -> Self {
        Self { finding_type, processed: 0, cleaned: 0, size_freed_bytes: 0, findings: Vec::new() }
    }
}

/// A failure confined to one file or one detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingError {
    pub finding_type: FindingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Result of one `analyze` or `run` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingRunResult {
    pub run_id: String,
    pub dry_run: bool,
    pub total_processed: u64,
    pub total_cleaned: u64,
    pub total_size_freed_bytes: u64,
    pub results: Vec<TypeResult>,
    pub errors: Vec<HousekeepingError>,
    pub started_at_ms: u64,
    pub duration_ms: u64,
}

impl HousekeepingRunResult {
    pub fn result(&self, finding_type: FindingType) -> Option<&TypeResult> {
        self.results.iter().find(|r| r.finding_type == finding_type)
    }

    /// Any per-file or per-pass failure was itemized.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
#[path = "housekeeping_tests.rs"]
mod tests;
