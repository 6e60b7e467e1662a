// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::protocol::{read_response, write_request};

async fn roundtrip(ctx: ListenCtx<qc_engine::FakeBackends>, request: Request) -> Response {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(server);
    let handler = tokio::spawn(async move { handle_connection(reader, writer, &ctx).await });

    let (mut client_reader, mut client_writer) = tokio::io::split(client);
    write_request(&mut client_writer, &request, Duration::from_secs(1)).await.unwrap();
    let response = read_response(&mut client_reader, Duration::from_secs(1)).await.unwrap();
    handler.await.unwrap().unwrap();
    response
}

#[tokio::test]
async fn ping_over_the_wire() {
    let (ctx, _fake) = test_ctx();
    assert_eq!(roundtrip(ctx, Request::Ping).await, Response::Pong);
}

#[tokio::test]
async fn hello_reports_daemon_version() {
    let (ctx, _fake) = test_ctx();
    let response = roundtrip(ctx, Request::Hello { version: "0.0.1".to_string() }).await;
    assert_eq!(response, Response::Hello { version: PROTOCOL_VERSION.to_string() });
}

#[tokio::test]
async fn shutdown_notifies_the_daemon() {
    let (ctx, _fake) = test_ctx();
    assert_eq!(handle_request(Request::Shutdown, &ctx).await, Response::ShuttingDown);
    // notify_one leaves a permit for the next waiter
    tokio::time::timeout(Duration::from_secs(1), ctx.shutdown.notified()).await.unwrap();
}

#[tokio::test]
async fn breaker_status_reflects_outage() {
    let (ctx, fake) = test_ctx();
    fake.queue.set_unavailable(true);
    for _ in 0..3 {
        handle_request(Request::QueueStats { refresh: true }, &ctx).await;
    }
    let response = handle_request(Request::BreakerStatus, &ctx).await;
    let Response::Breaker { status } = response else {
        panic!("expected Breaker, got {response:?}");
    };
    assert_eq!(status.state, qc_core::CircuitState::Open);
    assert!(status.is_blocking());
}

#[tokio::test]
async fn open_circuit_answers_maintenance_not_error() {
    let (ctx, fake) = test_ctx();
    fake.queue.set_unavailable(true);
    for _ in 0..3 {
        let response = handle_request(Request::QueueStats { refresh: true }, &ctx).await;
        assert!(matches!(response, Response::Error { .. }), "{response:?}");
    }
    let response = handle_request(Request::QueueReprocess { queue: "email".into() }, &ctx).await;
    assert!(
        matches!(response, Response::Maintenance { retry_after_ms } if retry_after_ms > 0),
        "{response:?}"
    );
}

#[tokio::test]
async fn client_that_hangs_up_early_is_not_an_error() {
    let (ctx, _fake) = test_ctx();
    let (client, server) = tokio::io::duplex(1024);
    let (reader, writer) = tokio::io::split(server);
    drop(client);
    let result = handle_connection(reader, writer, &ctx).await;
    assert!(matches!(
        result,
        Err(ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed))
    ));
}

#[tokio::test(start_paused = true)]
async fn mutation_finishes_after_client_closes_its_write_side() {
    use tokio::io::AsyncWriteExt;

    let (ctx, fake) = test_ctx();
    fake.workers.set_responsive(false);
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(server);
    let handler = tokio::spawn(async move { handle_connection(reader, writer, &ctx).await });

    let (mut client_reader, mut client_writer) = tokio::io::split(client);
    write_request(&mut client_writer, &Request::WorkerStop, Duration::from_secs(60))
        .await
        .unwrap();
    client_writer.shutdown().await.unwrap();

    // The unconfirmed stop polls the heartbeat before answering
    let response = read_response(&mut client_reader, Duration::from_secs(60)).await.unwrap();
    assert_eq!(
        response,
        Response::WorkerCommand {
            outcome: qc_engine::CommandOutcome::Pending {
                action: qc_core::WorkerAction::Stop,
                state: qc_core::LifecycleState::Stopping,
            }
        }
    );
    handler.await.unwrap().unwrap();
    assert_eq!(fake.workers.commands(), vec![qc_core::WorkerAction::Stop]);
}
