// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle and configuration specs.

use std::collections::BTreeMap;

use qc_core::{WorkerConfigPatch, WorkerConfiguration};

use crate::prelude::*;

async fn configs(daemon: &Daemon) -> BTreeMap<WorkerId, WorkerConfiguration> {
    match daemon.send(Request::WorkerConfigs).await {
        Response::WorkerConfigs { workers } => workers,
        other => panic!("expected WorkerConfigs, got {other:?}"),
    }
}

#[tokio::test]
async fn stop_is_confirmed_and_repeating_it_is_a_no_op() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;

    let response = daemon.send(Request::WorkerStop).await;
    assert_eq!(
        response,
        Response::WorkerCommand {
            outcome: CommandOutcome::Confirmed {
                action: WorkerAction::Stop,
                state: LifecycleState::Stopped,
            }
        }
    );

    let response = daemon.send(Request::WorkerState).await;
    assert!(
        matches!(response, Response::WorkerLifecycle { state: LifecycleState::Stopped, .. }),
        "{response:?}"
    );

    let response = daemon.send(Request::WorkerStop).await;
    assert!(
        matches!(response, Response::WorkerCommand { outcome: CommandOutcome::NoOp { .. } }),
        "{response:?}"
    );
    assert_eq!(daemon.workers.commands(), vec![WorkerAction::Stop]);

    daemon.stop().await;
}

#[tokio::test]
async fn rejected_command_is_reported() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;
    daemon.workers.reject_commands(Some("pool is draining"));

    let response = daemon.send(Request::WorkerStop).await;
    let Response::Error { message } = response else {
        panic!("expected Error, got {response:?}");
    };
    assert!(message.contains("pool is draining"), "{message}");

    daemon.stop().await;
}

#[tokio::test]
async fn configured_workers_start_from_settings() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;

    let defaults = WorkerConfiguration::default();
    let expected = BTreeMap::from([
        (WorkerId::from("email"), defaults),
        (WorkerId::from("image-processing"), WorkerConfiguration { concurrency: 4, ..defaults }),
    ]);
    similar_asserts::assert_eq!(configs(&daemon).await, expected);

    daemon.stop().await;
}

#[tokio::test]
async fn disabling_a_worker_survives_a_restart() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;

    let response = daemon
        .send(Request::WorkerSetEnabled { worker: "email".into(), enabled: false })
        .await;
    let Response::WorkerConfig { worker, config } = response else {
        panic!("expected WorkerConfig, got {response:?}");
    };
    assert_eq!(worker.as_str(), "email");
    assert!(!config.enabled);
    daemon.stop().await;

    let daemon = project.start().await;
    let workers = configs(&daemon).await;
    assert!(!workers[&WorkerId::from("email")].enabled);
    assert!(workers[&WorkerId::from("image-processing")].enabled);
    daemon.kill().await;
}

#[tokio::test]
async fn invalid_update_is_rejected_and_nothing_is_saved() {
    let project = Project::new(SETTINGS);
    let daemon = project.start().await;

    let patch = WorkerConfigPatch { concurrency: Some(0), ..Default::default() };
    let response = daemon.send(Request::WorkerUpdate { worker: "email".into(), patch }).await;
    assert!(matches!(response, Response::Error { .. }), "{response:?}");

    let response = daemon
        .send(Request::WorkerSetEnabled { worker: "video".into(), enabled: true })
        .await;
    assert!(matches!(response, Response::Error { .. }), "{response:?}");

    assert!(!daemon.config.workers_path.exists());
    daemon.stop().await;
}
