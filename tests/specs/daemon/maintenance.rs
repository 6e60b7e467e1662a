// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue outage specs: the circuit opens, clients see maintenance, and the
//! daemon recovers once the cooldown has passed.

use std::time::Duration;

use crate::prelude::*;

async fn breaker(daemon: &Daemon) -> qc_core::BreakerStatus {
    match daemon.send(Request::BreakerStatus).await {
        Response::Breaker { status } => status,
        other => panic!("expected Breaker, got {other:?}"),
    }
}

#[tokio::test]
async fn outage_switches_clients_to_maintenance() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.queue.set_unavailable(true);

    for _ in 0..3 {
        let response = daemon.send(Request::QueueStats { refresh: true }).await;
        assert!(matches!(response, Response::Error { .. }), "{response:?}");
    }
    assert_eq!(breaker(&daemon).await.state, CircuitState::Open);

    let calls = daemon.queue.calls().len();
    let response = daemon.send(Request::QueueStats { refresh: true }).await;
    let Response::Maintenance { retry_after_ms } = response else {
        panic!("expected Maintenance, got {response:?}");
    };
    assert!(retry_after_ms > 0 && retry_after_ms <= 30_000, "{retry_after_ms}");

    // Remediation shares the circuit and never reaches the backend
    let response = daemon.send(Request::QueueReprocess { queue: "email".into() }).await;
    assert!(matches!(response, Response::Maintenance { .. }), "{response:?}");
    assert_eq!(daemon.queue.calls().len(), calls);

    daemon.stop().await;
}

#[tokio::test]
async fn daemon_recovers_after_cooldown() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.queue.push_jobs(jobs_in_state("email", JobState::Pending, 2));
    daemon.queue.set_unavailable(true);
    for _ in 0..3 {
        daemon.send(Request::QueueStats { refresh: true }).await;
    }
    daemon.queue.set_unavailable(false);

    // Still cooling down
    daemon.clock.advance(Duration::from_secs(10));
    let response = daemon.send(Request::QueueStats { refresh: true }).await;
    assert!(matches!(response, Response::Maintenance { .. }), "{response:?}");

    daemon.clock.advance(Duration::from_secs(21));
    let response = daemon.send(Request::QueueStats { refresh: true }).await;
    let Response::Stats { snapshot } = response else {
        panic!("expected Stats, got {response:?}");
    };
    assert_eq!(snapshot.queue("email").unwrap().counts.pending, 2);

    let status = breaker(&daemon).await;
    assert_eq!(status.state, CircuitState::Closed);
    assert_eq!(status.failure_count, 0);

    daemon.stop().await;
}

#[tokio::test]
async fn failed_trial_reopens_the_circuit() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.queue.set_unavailable(true);
    for _ in 0..3 {
        daemon.send(Request::QueueStats { refresh: true }).await;
    }

    daemon.clock.advance(Duration::from_secs(31));
    let response = daemon.send(Request::QueueStats { refresh: true }).await;
    assert!(matches!(response, Response::Error { .. }), "{response:?}");

    let status = breaker(&daemon).await;
    assert_eq!(status.state, CircuitState::Open);
    assert_eq!(status.retry_after_ms, Some(30_000));

    daemon.stop().await;
}
