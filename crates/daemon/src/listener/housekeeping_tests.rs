// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use qc_core::test_support::record;
use qc_core::{hours_ms, FakeClock, FileCandidate, FindingType, RecordStatus};

use super::super::test_ctx;
use super::*;

fn stale(name: &str) -> FileCandidate {
    let flagged_at = FakeClock::START_EPOCH_MS - hours_ms(48);
    FileCandidate::builder()
        .name(name)
        .path(format!("/media/{name}"))
        .size_bytes(1_024)
        .created_at_ms(flagged_at)
        .record(record(name, RecordStatus::PendingDeletion, flagged_at))
        .build()
}

#[tokio::test]
async fn analyze_never_deletes_even_when_asked() {
    let (ctx, fake) = test_ctx();
    fake.storage.add(FindingType::PendingDeletionFiles, stale("a.jpg"));

    let config = HousekeepingConfig::default().dry_run(false);
    let Response::Housekeeping { result } = handle_analyze(&ctx.plane, &config).await else {
        panic!("expected Housekeeping");
    };
    assert!(result.dry_run);
    assert_eq!(result.total_cleaned, 1);
    assert!(fake.storage.exists("/media/a.jpg"));
}

#[tokio::test]
async fn run_with_execute_frees_space() {
    let (ctx, fake) = test_ctx();
    fake.storage.add(FindingType::PendingDeletionFiles, stale("a.jpg"));
    fake.storage.add(FindingType::PendingDeletionFiles, stale("b.jpg"));

    let config = HousekeepingConfig::default().dry_run(false);
    let Response::Housekeeping { result } = handle_run(&ctx.plane, &config).await else {
        panic!("expected Housekeeping");
    };
    assert!(!result.dry_run);
    assert_eq!(result.total_size_freed_bytes, 2_048);
    assert!(!fake.storage.exists("/media/b.jpg"));
}
