// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Housekeeping specs against real files on disk.

use qc_adapters::MemoryCatalog;

use crate::prelude::*;

fn deleted_only() -> HousekeepingConfig {
    HousekeepingConfig::default().only([FindingType::DeletedStatusFiles])
}

async fn housekeeping(daemon: &Daemon, request: Request) -> Box<qc_core::HousekeepingRunResult> {
    match daemon.send(request).await {
        Response::Housekeeping { result } => result,
        other => panic!("expected Housekeeping, got {other:?}"),
    }
}

#[tokio::test]
async fn analyze_reports_without_deleting_and_run_cleans_up() {
    let project = Project::new(SETTINGS);
    let gone = project.media_file("2026/01/gone.jpg", 512);
    let kept = project.media_file("2026/01/kept.jpg", 64);
    let catalog = MemoryCatalog::new();
    catalog.insert("2026/01/gone.jpg", record("gone", RecordStatus::Deleted, 0));
    catalog.insert("2026/01/kept.jpg", record("kept", RecordStatus::Active, 0));
    let daemon = project.start_with_catalog(catalog).await;

    let analyzed = housekeeping(&daemon, Request::HousekeepingAnalyze { config: deleted_only() }).await;
    assert!(analyzed.dry_run);
    assert_eq!((analyzed.total_cleaned, analyzed.total_size_freed_bytes), (1, 512));
    assert!(gone.exists());

    let ran = housekeeping(
        &daemon,
        Request::HousekeepingRun { config: deleted_only().dry_run(false) },
    )
    .await;
    assert!(!ran.dry_run);
    assert!(ran.errors.is_empty(), "{:?}", ran.errors);
    assert_eq!((ran.total_cleaned, ran.total_size_freed_bytes), (1, 512));
    assert!(!gone.exists());
    assert!(kept.exists());

    let again = housekeeping(&daemon, Request::HousekeepingAnalyze { config: deleted_only() }).await;
    assert_eq!(again.total_cleaned, 0);

    daemon.stop().await;
}

#[tokio::test]
async fn default_run_is_a_dry_run() {
    let project = Project::new(SETTINGS);
    let gone = project.media_file("gone.jpg", 10);
    let catalog = MemoryCatalog::new();
    catalog.insert("gone.jpg", record("gone", RecordStatus::Deleted, 0));
    let daemon = project.start_with_catalog(catalog).await;

    let result =
        housekeeping(&daemon, Request::HousekeepingRun { config: HousekeepingConfig::default() })
            .await;
    assert!(result.dry_run);
    assert_eq!(result.results.len(), FindingType::ALL.len());
    assert!(gone.exists());

    daemon.stop().await;
}

#[tokio::test]
async fn two_phase_run_marks_the_catalog_first() {
    let project = Project::new(SETTINGS);
    let failed = project.media_file("uploads/broken.png", 32);
    let catalog = MemoryCatalog::new();
    catalog.insert("uploads/broken.png", record("broken", RecordStatus::ProcessingFailed, 0));
    let daemon = project.start_with_catalog(catalog.clone()).await;

    let config = HousekeepingConfig::default()
        .only([FindingType::FailedProcessingFiles])
        .dry_run(false);
    let result = housekeeping(&daemon, Request::HousekeepingRun { config }).await;
    assert_eq!(result.total_cleaned, 1);
    assert!(!failed.exists());
    assert!(!project.media_dir().join("uploads").exists());
    assert_eq!(catalog.status_of("broken"), Some(RecordStatus::Deleted));

    daemon.stop().await;
}
