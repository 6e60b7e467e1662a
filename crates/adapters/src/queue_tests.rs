// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use qc_core::test_support::jobs_in_state;

fn fixture() -> FakeQueueBackend {
    let backend = FakeQueueBackend::new();
    backend.push_jobs(jobs_in_state("process-image", JobState::Failed, 3));
    backend.push_jobs(jobs_in_state("process-image", JobState::Completed, 4));
    backend.push_jobs(jobs_in_state("email", JobState::Failed, 1));
    backend
}

#[tokio::test]
async fn fake_requeue_only_touches_named_queue() {
    let backend = fixture();
    assert_eq!(backend.requeue_failed("process-image").await.unwrap(), 3);
    assert_eq!(backend.count("process-image", JobState::Failed), 0);
    assert_eq!(backend.count("email", JobState::Failed), 1);
}

#[tokio::test]
async fn fake_list_jobs_is_newest_first_and_paged() {
    let backend = fixture();
    let page = backend
        .list_jobs(&JobFilter::queue("process-image"), PageRequest::new(Some(1), Some(5)))
        .await
        .unwrap();
    assert_eq!(page.total, 7);
    assert_eq!(page.jobs.len(), 5);
    assert!(page.jobs.windows(2).all(|w| w[0].created_on_ms >= w[1].created_on_ms));
}

#[tokio::test]
async fn fake_fail_next_is_consumed() {
    let backend = fixture();
    backend.fail_next(1);
    assert!(backend.ping().await.is_err());
    assert!(backend.ping().await.is_ok());
}
