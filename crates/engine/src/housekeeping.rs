// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Housekeeping: detect stale and orphaned media files and remove them.
//!
//! Detection types run one after another in a fixed order. Each lists up to
//! `max_files` candidates oldest-first and classifies them against its own
//! predicate. A dry run stops after classification; an executing run deletes
//! each finding in turn, itemizing per-file failures without stopping.

use qc_adapters::StorageBackend;
use qc_core::{
    hours_ms, Clock, FileCandidate, FindingType, HousekeepingConfig, HousekeepingError,
    HousekeepingFinding, HousekeepingRunResult, RecordStatus, TypeResult,
};
use std::sync::Arc;

const HOUR_MS: u64 = hours_ms(1);

pub struct HousekeepingEngine<S: StorageBackend, C: Clock> {
    storage: Arc<S>,
    clock: C,
}

impl<S: StorageBackend, C: Clock> HousekeepingEngine<S, C> {
    pub fn new(storage: Arc<S>, clock: C) -> Self {
        Self { storage, clock }
    }

    /// Report what a run would clean without touching anything.
    pub async fn analyze(&self, config: &HousekeepingConfig) -> HousekeepingRunResult {
        let config = config.clone().dry_run(true);
        self.execute(&config).await
    }

    /// Run with the given configuration, deleting unless `dry_run` is set.
    pub async fn run(&self, config: &HousekeepingConfig) -> HousekeepingRunResult {
        self.execute(config).await
    }

    async fn execute(&self, config: &HousekeepingConfig) -> HousekeepingRunResult {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started = self.clock.now();
        let started_at_ms = self.clock.epoch_ms();
        tracing::info!(
            %run_id,
            dry_run = config.dry_run,
            types = config.detection_types.len(),
            max_files = config.max_files,
            "housekeeping started",
        );

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for finding_type in FindingType::ALL.iter().copied() {
            if !config.detection_types.contains(&finding_type) {
                continue;
            }
            results.push(self.process_type(finding_type, config, &mut errors).await);
        }

        let result = HousekeepingRunResult {
            total_processed: results.iter().map(|r| r.processed).sum(),
            total_cleaned: results.iter().map(|r| r.cleaned).sum(),
            total_size_freed_bytes: results.iter().map(|r| r.size_freed_bytes).sum(),
            run_id,
            dry_run: config.dry_run,
            results,
            errors,
            started_at_ms,
            duration_ms: self.clock.now().saturating_duration_since(started).as_millis() as u64,
        };
        tracing::info!(
            run_id = %result.run_id,
            dry_run = result.dry_run,
            processed = result.total_processed,
            cleaned = result.total_cleaned,
            freed_bytes = result.total_size_freed_bytes,
            errors = result.errors.len(),
            "housekeeping finished",
        );
        result
    }

    async fn process_type(
        &self,
        finding_type: FindingType,
        config: &HousekeepingConfig,
        errors: &mut Vec<HousekeepingError>,
    ) -> TypeResult {
        let mut result = TypeResult::empty(finding_type);
        let mut candidates =
            match self.storage.list_candidates(finding_type, config.max_files).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(%finding_type, error = %e, "listing candidates failed");
                    errors.push(HousekeepingError {
                        finding_type,
                        path: None,
                        message: e.to_string(),
                    });
                    return result;
                }
            };
        candidates.sort_by_key(FileCandidate::reference_time_ms);
        candidates.truncate(config.max_files);
        result.processed = candidates.len() as u64;

        let now = self.clock.epoch_ms();
        for candidate in &candidates {
            let Some(reason) = classify(finding_type, candidate, now, config) else {
                continue;
            };
            let finding = HousekeepingFinding {
                finding_type,
                name: candidate.name.clone(),
                path: candidate.path.clone(),
                reason,
                size_bytes: candidate.size_bytes,
            };
            if config.log_details {
                tracing::info!(%finding_type, path = %finding.path.display(), reason = %finding.reason, size = finding.size_bytes, "finding");
            }

            if config.dry_run {
                result.cleaned += 1;
                result.size_freed_bytes += finding.size_bytes;
            } else {
                match self.remove(candidate, config).await {
                    Ok(freed) => {
                        result.cleaned += 1;
                        result.size_freed_bytes += freed;
                    }
                    Err(message) => {
                        tracing::warn!(%finding_type, path = %candidate.path.display(), error = %message, "cleanup failed");
                        errors.push(HousekeepingError {
                            finding_type,
                            path: Some(candidate.path.clone()),
                            message,
                        });
                    }
                }
            }
            result.findings.push(finding);
        }
        result
    }

    /// Delete one file. With two-phase deletion its catalog record is marked
    /// deleted first, and the file is left alone if that fails.
    async fn remove(
        &self,
        candidate: &FileCandidate,
        config: &HousekeepingConfig,
    ) -> Result<u64, String> {
        if config.two_phase_deletion {
            let record = candidate.record.as_ref().filter(|r| r.status != RecordStatus::Deleted);
            if let Some(record) = record {
                self.storage.mark_deleted(record).await.map_err(|e| e.to_string())?;
            }
        }
        let outcome = self.storage.delete(&candidate.path).await.map_err(|e| e.to_string())?;
        if outcome.bytes_freed() == 0 {
            tracing::debug!(path = %candidate.path.display(), "file already gone");
        }
        if config.cleanup_empty_dirs {
            if let Err(e) = self.storage.remove_empty_dirs(&candidate.path).await {
                tracing::warn!(path = %candidate.path.display(), error = %e, "empty directory cleanup failed");
            }
        }
        Ok(outcome.bytes_freed())
    }
}

/// Why `candidate` belongs to `finding_type`, or `None` if it does not.
pub fn classify(
    finding_type: FindingType,
    candidate: &FileCandidate,
    now_ms: u64,
    config: &HousekeepingConfig,
) -> Option<String> {
    let age_ms = now_ms.saturating_sub(candidate.reference_time_ms());
    let grace_ms = config.grace_period_hours.saturating_mul(HOUR_MS);
    let status = candidate.record_status();
    if !candidate.exists {
        return None;
    }
    match finding_type {
        FindingType::PendingDeletionFiles => (status == Some(RecordStatus::PendingDeletion)
            && age_ms >= grace_ms)
            .then(|| format!("flagged for deletion {}h ago", age_ms / HOUR_MS)),
        FindingType::DeletedStatusFiles => (status == Some(RecordStatus::Deleted))
            .then(|| "record deleted but file still present".to_string()),
        FindingType::FailedProcessingFiles => (status == Some(RecordStatus::ProcessingFailed))
            .then(|| "processing failed".to_string()),
        FindingType::AbandonedUploads => (status == Some(RecordStatus::Uploading)
            && age_ms >= config.abandoned_upload_hours.saturating_mul(HOUR_MS))
        .then(|| format!("upload incomplete after {}h", age_ms / HOUR_MS)),
        FindingType::PhysicalOrphans => (status.is_none() && age_ms >= grace_ms)
            .then(|| "no catalog record".to_string()),
    }
}

#[cfg(test)]
#[path = "housekeeping_tests.rs"]
mod tests;
