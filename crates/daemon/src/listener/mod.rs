// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each in its own task so a slow backend call never blocks other clients.
//! Requests are dispatched to the shared control plane.

mod housekeeping;
mod queues;
mod workers;

use std::sync::Arc;
use std::time::Instant;

use qc_engine::{Backends, ControlPlane};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::env::{ipc_timeout, PROTOCOL_VERSION};
use crate::protocol::{self, Request, Response};

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx<B: Backends> {
    pub plane: Arc<ControlPlane<B>>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

impl<B: Backends> ListenCtx<B> {
    pub fn new(plane: Arc<ControlPlane<B>>, shutdown: Arc<Notify>) -> Self {
        Self { plane, start_time: Instant::now(), shutdown }
    }
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener<B: Backends> {
    unix: UnixListener,
    ctx: Arc<ListenCtx<B>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<B: Backends> Listener<B> {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx<B>>) -> Self {
        Self { unix, ctx }
    }

    /// Accept connections until `cancel` fires, spawning a task for each.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.unix.accept() => match result {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            if let Err(e) = handle_connection(reader, writer, &ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("Unix accept error: {}", e),
                },
            }
        }
        debug!("listener stopped");
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// Query handlers are raced against client disconnect detection and dropped
/// if the client closes the connection first. Mutations always finish.
async fn handle_connection<R, W, B>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx<B>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    B: Backends,
{
    let request = protocol::read_request(&mut reader, ipc_timeout()).await?;

    if request.is_query() {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = if request.is_query() {
        tokio::select! {
            response = handle_request(request, ctx) => response,
            _ = detect_client_disconnect(&mut reader) => {
                debug!("Client disconnected, cancelling query");
                return Ok(());
            }
        }
    } else {
        // Mutations run to completion so partial work is never abandoned
        handle_request(request, ctx).await
    };

    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Detect client disconnect by reading from the socket after the request.
///
/// The client sends one request then waits, so a read returning (EOF or not)
/// means the client is gone or misbehaving.
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request<B: Backends>(request: Request, ctx: &ListenCtx<B>) -> Response {
    let plane = ctx.plane.as_ref();
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "protocol version mismatch");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }

        Request::Shutdown => {
            info!(uptime_secs = ctx.start_time.elapsed().as_secs(), "shutdown requested");
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::QueueStats { refresh } => queues::handle_stats(plane, refresh).await,

        Request::BreakerStatus => Response::Breaker { status: plane.breaker().status() },

        Request::QueueJobs { queue, state, page, limit } => {
            queues::handle_jobs(plane, queue, state, page, limit).await
        }

        Request::JobDetail { id } => queues::handle_job_detail(plane, &id).await,

        Request::QueueReprocess { queue } => queues::handle_reprocess(plane, &queue).await,

        Request::QueueEmpty { queue, keep_completed, include_pending, include_active } => {
            let options =
                qc_engine::EmptyOptions { keep_completed, include_pending, include_active };
            queues::handle_empty(plane, &queue, options).await
        }

        Request::WorkerStart => workers::handle_start(plane).await,
        Request::WorkerStop => workers::handle_stop(plane).await,
        Request::WorkerRestart => workers::handle_restart(plane).await,
        Request::WorkerState => workers::handle_state(plane).await,
        Request::WorkerConfigs => workers::handle_configs(plane).await,

        Request::WorkerSetEnabled { worker, enabled } => {
            workers::handle_set_enabled(plane, worker, enabled).await
        }

        Request::WorkerUpdate { worker, patch } => workers::handle_update(plane, worker, patch).await,

        Request::HousekeepingAnalyze { config } => housekeeping::handle_analyze(plane, &config).await,

        Request::HousekeepingRun { config } => housekeeping::handle_run(plane, &config).await,
    }
}

#[cfg(test)]
pub(crate) fn test_ctx() -> (ListenCtx<qc_engine::FakeBackends>, qc_engine::FakePlane) {
    let fake = qc_engine::FakePlane::new();
    let ctx = ListenCtx::new(Arc::clone(&fake.plane), Arc::new(Notify::new()));
    (ctx, fake)
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
