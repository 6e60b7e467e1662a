// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use qc_core::test_support::jobs_in_state;
use qc_core::{JobState, WorkerAction};
use tempfile::tempdir;
use tokio::net::UnixStream;

use super::test_helpers::{fake_deps, test_config};
use super::*;
use crate::protocol::{read_response, write_request, Request, Response};

async fn send(config: &Config, request: Request) -> Response {
    let stream = UnixStream::connect(&config.socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    write_request(&mut writer, &request, Duration::from_secs(5)).await.unwrap();
    read_response(&mut reader, Duration::from_secs(5)).await.unwrap()
}

#[tokio::test]
async fn serves_until_shutdown_request() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let (deps, fakes) = fake_deps();
    fakes.queue.push_jobs(jobs_in_state("email", JobState::Failed, 2));

    let StartupResult { daemon, listener } =
        startup(&config, deps, fakes.clock.clone()).await.unwrap();
    let running = tokio::spawn(daemon.run(listener));

    assert_eq!(send(&config, Request::Ping).await, Response::Pong);
    let response = send(&config, Request::QueueStats { refresh: false }).await;
    let Response::Stats { snapshot } = response else {
        panic!("expected Stats, got {response:?}");
    };
    assert_eq!(snapshot.queue("email").unwrap().counts.failed, 2);

    let response = send(&config, Request::WorkerStop).await;
    assert!(matches!(response, Response::WorkerCommand { .. }), "{response:?}");
    assert_eq!(fakes.workers.commands(), vec![WorkerAction::Stop]);

    assert_eq!(send(&config, Request::Shutdown).await, Response::ShuttingDown);
    tokio::time::timeout(Duration::from_secs(10), running).await.unwrap().unwrap().unwrap();
    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn shutdown_handle_stops_run() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.poll_interval = Duration::from_millis(10);
    let (deps, fakes) = fake_deps();

    let StartupResult { daemon, listener } =
        startup(&config, deps, fakes.clock.clone()).await.unwrap();
    let handle = daemon.shutdown_handle();
    let running = tokio::spawn(daemon.run(listener));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fakes.queue.fetch_count() > 0, "poller should have refreshed");

    handle.notify_one();
    tokio::time::timeout(Duration::from_secs(10), running).await.unwrap().unwrap().unwrap();
    assert!(!config.socket_path.exists());
}
