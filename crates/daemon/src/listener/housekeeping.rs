// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Housekeeping handlers.

use qc_core::HousekeepingConfig;
use qc_engine::{Backends, ControlPlane};

use crate::protocol::Response;

pub(super) async fn handle_analyze<B: Backends>(
    plane: &ControlPlane<B>,
    config: &HousekeepingConfig,
) -> Response {
    let result = plane.housekeeping().analyze(config).await;
    Response::Housekeeping { result: Box::new(result) }
}

pub(super) async fn handle_run<B: Backends>(
    plane: &ControlPlane<B>,
    config: &HousekeepingConfig,
) -> Response {
    let result = plane.housekeeping().run(config).await;
    Response::Housekeeping { result: Box::new(result) }
}

#[cfg(test)]
#[path = "housekeeping_tests.rs"]
mod tests;
