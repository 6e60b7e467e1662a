// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard and queue remediation handlers.

use qc_core::{JobFilter, JobId, JobState, PageRequest};
use qc_engine::{Backends, ControlPlane, EmptyOptions};
use tracing::info;

use crate::protocol::Response;

pub(super) async fn handle_stats<B: Backends>(plane: &ControlPlane<B>, refresh: bool) -> Response {
    let snapshot = if refresh { plane.stats().refresh().await } else { plane.stats().snapshot().await };
    match snapshot {
        Ok(snapshot) => Response::Stats { snapshot: Box::new((*snapshot).clone()) },
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_jobs<B: Backends>(
    plane: &ControlPlane<B>,
    queue: Option<String>,
    state: Option<JobState>,
    page: Option<u32>,
    limit: Option<u32>,
) -> Response {
    let filter = JobFilter { queue, state };
    match plane.remediation().list_jobs(&filter, PageRequest::new(page, limit)).await {
        Ok(page) => Response::Jobs { page },
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_job_detail<B: Backends>(plane: &ControlPlane<B>, id: &JobId) -> Response {
    match plane.remediation().job_detail(id).await {
        Ok(job) => Response::Job { job: Box::new(job) },
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_reprocess<B: Backends>(plane: &ControlPlane<B>, queue: &str) -> Response {
    match plane.remediation().reprocess(queue).await {
        Ok(ack) => {
            info!(queue, affected = ack.affected, "queue reprocessed");
            Response::Remediated { ack }
        }
        Err(e) => e.into(),
    }
}

pub(super) async fn handle_empty<B: Backends>(
    plane: &ControlPlane<B>,
    queue: &str,
    options: EmptyOptions,
) -> Response {
    match plane.remediation().empty(queue, options).await {
        Ok(ack) => {
            info!(queue, affected = ack.affected, "queue emptied");
            Response::Remediated { ack }
        }
        Err(e) => e.into(),
    }
}

#[cfg(test)]
#[path = "queues_tests.rs"]
mod tests;
