// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::BreakerConfig;
use qc_adapters::{FakeQueueBackend, QueueCall};
use qc_core::test_support::jobs_in_state;
use qc_core::FakeClock;
use serde_json::json;
use yare::parameterized;

type TestOps = QueueRemediationOps<FakeQueueBackend, FakeClock>;

fn ops_with(queue: &Arc<FakeQueueBackend>) -> (TestOps, Arc<StatsCache>) {
    let cache = Arc::new(StatsCache::new());
    let breaker =
        Arc::new(CircuitBreaker::new("queue", BreakerConfig::default(), FakeClock::new()));
    let ops = QueueRemediationOps::new(
        vec![QueueDescriptor::new("process-image"), QueueDescriptor::new("email")],
        Arc::clone(queue),
        breaker,
        Arc::clone(&cache),
    );
    (ops, cache)
}

fn image_queue() -> Arc<FakeQueueBackend> {
    let queue = Arc::new(FakeQueueBackend::new());
    queue.push_jobs(jobs_in_state("process-image", JobState::Pending, 10));
    queue.push_jobs(jobs_in_state("process-image", JobState::Active, 2));
    queue.push_jobs(jobs_in_state("process-image", JobState::Completed, 40));
    queue.push_jobs(jobs_in_state("process-image", JobState::Failed, 3));
    queue
}

#[tokio::test]
async fn reprocess_requeues_exactly_the_failed_jobs() {
    let queue = image_queue();
    let (ops, _) = ops_with(&queue);
    let ack = ops.reprocess("process-image").await.unwrap();
    assert_eq!(ack.affected, 3);
    assert_eq!(ack.action, RemediationAction::Reprocess);
    assert!(queue
        .calls()
        .contains(&QueueCall::RequeueFailed { queue: "process-image".to_string(), count: 3 }));
}

#[tokio::test]
async fn reprocess_with_nothing_failed_succeeds() {
    let queue = Arc::new(FakeQueueBackend::new());
    let (ops, _) = ops_with(&queue);
    assert_eq!(ops.reprocess("email").await.unwrap().affected, 0);
}

#[tokio::test]
async fn unknown_queue_is_rejected_before_backend() {
    let queue = image_queue();
    let (ops, _) = ops_with(&queue);
    let err = ops.reprocess("video").await.unwrap_err();
    assert!(matches!(err, EngineError::QueueNotFound(ref q) if q == "video"));
    let err = ops.empty("video", EmptyOptions::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::QueueNotFound(_)));
    assert!(queue.calls().is_empty());
}

#[tokio::test]
async fn empty_keeps_completed_by_default() {
    let queue = Arc::new(FakeQueueBackend::new());
    queue.push_jobs(jobs_in_state("email", JobState::Failed, 5));
    queue.push_jobs(jobs_in_state("email", JobState::Completed, 7));
    let (ops, _) = ops_with(&queue);
    let ack = ops.empty("email", EmptyOptions::default()).await.unwrap();
    assert_eq!(ack.affected, 5);
    assert_eq!(queue.count("email", JobState::Failed), 0);
    assert_eq!(queue.count("email", JobState::Completed), 7);
}

#[parameterized(
    failed_only = { EmptyOptions::default(), vec![JobState::Failed] },
    with_pending = {
        EmptyOptions { include_pending: true, ..Default::default() },
        vec![JobState::Failed, JobState::Pending, JobState::Retry]
    },
    with_active = {
        EmptyOptions { include_active: true, ..Default::default() },
        vec![JobState::Failed, JobState::Active]
    },
    drop_completed = {
        EmptyOptions { keep_completed: false, ..Default::default() },
        vec![JobState::Failed, JobState::Completed]
    },
)]
fn empty_option_states(options: EmptyOptions, expected: Vec<JobState>) {
    assert_eq!(options.states(), expected);
}

#[tokio::test]
async fn empty_without_keep_completed_removes_them() {
    let queue = image_queue();
    let (ops, _) = ops_with(&queue);
    let options = EmptyOptions { keep_completed: false, ..Default::default() };
    assert_eq!(ops.empty("process-image", options).await.unwrap().affected, 43);
    assert_eq!(queue.count("process-image", JobState::Pending), 10);
}

#[tokio::test]
async fn mutations_invalidate_stats() {
    let queue = image_queue();
    let (ops, cache) = ops_with(&queue);
    ops.reprocess("process-image").await.unwrap();
    assert_eq!(cache.generation(), 1);
    ops.empty("process-image", EmptyOptions::default()).await.unwrap();
    assert_eq!(cache.generation(), 2);
}

#[tokio::test]
async fn job_detail_includes_payloads() {
    let queue = Arc::new(FakeQueueBackend::new());
    queue.push_jobs([JobRecord::builder()
        .id("img-42")
        .queue("process-image")
        .state(JobState::Failed)
        .input(json!({ "media_id": 42 }))
        .output(json!({ "error": "decoder crashed" }))
        .build()]);
    let (ops, _) = ops_with(&queue);
    let job = ops.job_detail(&JobId::from("img-42")).await.unwrap();
    assert_eq!(job.input["media_id"], 42);
    assert_eq!(job.output["error"], "decoder crashed");

    let err = ops.job_detail(&JobId::from("nope")).await.unwrap_err();
    assert!(matches!(err, EngineError::JobNotFound(_)));
}

#[tokio::test]
async fn list_jobs_pages_by_offset() {
    let queue = image_queue();
    let (ops, _) = ops_with(&queue);
    let filter = JobFilter::queue("process-image").with_state(JobState::Completed);
    let first = ops.list_jobs(&filter, PageRequest::default()).await.unwrap();
    assert_eq!((first.jobs.len(), first.total, first.pages()), (10, 40, 4));

    let big = ops.list_jobs(&filter, PageRequest::new(Some(1), Some(500))).await.unwrap();
    assert_eq!(big.jobs.len(), 40);
    assert_eq!(big.limit, PageRequest::MAX_LIMIT);

    let last = ops.list_jobs(&filter, PageRequest::new(Some(4), None)).await.unwrap();
    assert_eq!(last.jobs.len(), 10);
    assert!(first.jobs.iter().all(|j| !last.jobs.contains(j)));
}

#[tokio::test]
async fn open_breaker_blocks_remediation() {
    let queue = image_queue();
    let (ops, _) = ops_with(&queue);
    queue.set_unavailable(true);
    for _ in 0..3 {
        ops.reprocess("process-image").await.unwrap_err();
    }
    queue.set_unavailable(false);
    let calls = queue.calls().len();
    assert!(ops.reprocess("process-image").await.unwrap_err().is_circuit_open());
    assert_eq!(queue.calls().len(), calls);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn empty_never_touches_completed_by_default(failed in 0usize..20, completed in 0usize..20) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let queue = Arc::new(FakeQueueBackend::new());
                queue.push_jobs(jobs_in_state("email", JobState::Failed, failed));
                queue.push_jobs(jobs_in_state("email", JobState::Completed, completed));
                let (ops, _) = ops_with(&queue);
                ops.empty("email", EmptyOptions::default()).await.unwrap();
                prop_assert_eq!(queue.count("email", JobState::Failed), 0);
                prop_assert_eq!(queue.count("email", JobState::Completed), completed);
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
