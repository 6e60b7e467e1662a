// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle and configuration handlers.

use qc_core::{WorkerConfigPatch, WorkerId};
use qc_engine::{Backends, CommandOutcome, ControlPlane, EngineError};
use tracing::info;

use crate::protocol::Response;

fn command(result: Result<CommandOutcome, EngineError>) -> Response {
    match result {
        Ok(outcome) => {
            info!(outcome = ?outcome, "worker command finished");
            Response::WorkerCommand { outcome }
        }
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_start<B: Backends>(plane: &ControlPlane<B>) -> Response {
    command(plane.lifecycle().start().await)
}

pub(super) async fn handle_stop<B: Backends>(plane: &ControlPlane<B>) -> Response {
    command(plane.lifecycle().stop().await)
}

pub(super) async fn handle_restart<B: Backends>(plane: &ControlPlane<B>) -> Response {
    command(plane.lifecycle().restart().await)
}

pub(super) async fn handle_state<B: Backends>(plane: &ControlPlane<B>) -> Response {
    match plane.lifecycle().observe().await {
        Ok((state, status)) => Response::WorkerLifecycle { state, status },
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_configs<B: Backends>(plane: &ControlPlane<B>) -> Response {
    match plane.registry().get_all().await {
        Ok(workers) => Response::WorkerConfigs { workers },
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_set_enabled<B: Backends>(
    plane: &ControlPlane<B>,
    worker: WorkerId,
    enabled: bool,
) -> Response {
    match plane.registry().set_enabled(&worker, enabled).await {
        Ok(config) => {
            info!(worker = %worker, enabled, "worker toggled");
            Response::WorkerConfig { worker, config }
        }
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_update<B: Backends>(
    plane: &ControlPlane<B>,
    worker: WorkerId,
    patch: WorkerConfigPatch,
) -> Response {
    match plane.registry().update(&worker, patch).await {
        Ok(config) => {
            info!(worker = %worker, ?config, "worker configuration updated");
            Response::WorkerConfig { worker, config }
        }
        Err(e) => e.into(),
    }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
