// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard and remediation specs.

use crate::prelude::*;

async fn stats(daemon: &Daemon, refresh: bool) -> Box<qc_core::DashboardSnapshot> {
    match daemon.send(Request::QueueStats { refresh }).await {
        Response::Stats { snapshot } => snapshot,
        other => panic!("expected Stats, got {other:?}"),
    }
}

#[tokio::test]
async fn dashboard_counts_jobs_per_queue() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.queue.push_jobs(jobs_in_state("process-image", JobState::Pending, 4));
    daemon.queue.push_jobs(jobs_in_state("process-image", JobState::Failed, 2));
    daemon.queue.push_jobs(jobs_in_state("email", JobState::Completed, 7));

    let snapshot = stats(&daemon, false).await;
    let names: Vec<&str> = snapshot.queues.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, ["process-image", "email"]);

    let image = snapshot.queue("process-image").unwrap();
    assert_eq!(image.display_name, "Image Processing");
    assert_eq!((image.counts.pending, image.counts.failed), (4, 2));
    assert_eq!(snapshot.queue("email").unwrap().counts.completed, 7);
    assert!(snapshot.worker_status.is_some());

    let checks: Vec<&str> = snapshot.health.checks.iter().map(|c| c.name.as_str()).collect();
    for expected in ["database", "config", "memory", "disk", "workers"] {
        assert!(checks.contains(&expected), "missing {expected} in {checks:?}");
    }

    daemon.stop().await;
}

#[tokio::test]
async fn reprocess_is_visible_on_the_next_snapshot() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.queue.push_jobs(jobs_in_state("process-image", JobState::Failed, 3));

    let before = stats(&daemon, false).await;
    assert_eq!(before.queue("process-image").unwrap().counts.failed, 3);

    let response = daemon.send(Request::QueueReprocess { queue: "process-image".into() }).await;
    let Response::Remediated { ack } = response else {
        panic!("expected Remediated, got {response:?}");
    };
    assert_eq!(ack.affected, 3);

    // No explicit refresh: the mutation invalidated the cached snapshot
    let after = stats(&daemon, false).await;
    let counts = &after.queue("process-image").unwrap().counts;
    assert_eq!((counts.failed, counts.pending), (0, 3));
    assert!(after.generation > before.generation);

    daemon.stop().await;
}

#[tokio::test]
async fn empty_keeps_completed_jobs_unless_asked() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.queue.push_jobs(jobs_in_state("email", JobState::Failed, 5));
    daemon.queue.push_jobs(jobs_in_state("email", JobState::Completed, 9));

    let empty = |keep_completed| Request::QueueEmpty {
        queue: "email".into(),
        keep_completed,
        include_pending: false,
        include_active: false,
    };
    let response = daemon.send(empty(true)).await;
    assert!(matches!(response, Response::Remediated { ref ack } if ack.affected == 5), "{response:?}");
    assert_eq!(daemon.queue.count("email", JobState::Completed), 9);

    let response = daemon.send(empty(false)).await;
    assert!(matches!(response, Response::Remediated { ref ack } if ack.affected == 9), "{response:?}");
    assert_eq!(daemon.queue.count("email", JobState::Completed), 0);

    daemon.stop().await;
}

#[tokio::test]
async fn browsing_jobs_pages_and_shows_payloads() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.queue.push_jobs(jobs_in_state("email", JobState::Failed, 25));

    let response = daemon
        .send(Request::QueueJobs {
            queue: Some("email".into()),
            state: Some(JobState::Failed),
            page: Some(3),
            limit: None,
        })
        .await;
    let Response::Jobs { page } = response else {
        panic!("expected Jobs, got {response:?}");
    };
    assert_eq!((page.jobs.len(), page.total, page.page), (5, 25, 3));

    let id = page.jobs[0].id.clone();
    let response = daemon.send(Request::JobDetail { id: id.clone() }).await;
    assert!(matches!(response, Response::Job { ref job } if job.id == id), "{response:?}");

    let response = daemon.send(Request::JobDetail { id: "missing".into() }).await;
    assert!(matches!(response, Response::Error { .. }), "{response:?}");

    daemon.stop().await;
}

#[tokio::test]
async fn unknown_queue_is_an_error_not_a_mutation() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;

    let response = daemon.send(Request::QueueReprocess { queue: "video".into() }).await;
    let Response::Error { message } = response else {
        panic!("expected Error, got {response:?}");
    };
    assert!(message.contains("video"), "{message}");
    assert!(daemon.queue.calls().is_empty());

    daemon.stop().await;
}
