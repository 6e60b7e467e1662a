// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard auto-refresh.
//!
//! Keeps the stats cache warm so clients polling `QueueStats` read a recent
//! snapshot without each triggering a backend fetch. Polling pauses while the
//! queue circuit is open and resumes once the cooldown has passed, at which
//! point the next refresh doubles as the half-open trial call.

use std::sync::Arc;
use std::time::Duration;

use qc_engine::{Backends, ControlPlane};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct Poller<B: Backends> {
    plane: Arc<ControlPlane<B>>,
    interval: Duration,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    Refreshed,
    Paused,
    Failed,
}

impl<B: Backends> Poller<B> {
    pub fn new(plane: Arc<ControlPlane<B>>, interval: Duration) -> Self {
        Self { plane, interval }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
        debug!("poller stopped");
    }

    pub async fn tick(&self) -> Tick {
        let status = self.plane.breaker().status();
        if status.is_blocking() {
            debug!(retry_after_ms = ?status.retry_after_ms, "queue circuit open, polling paused");
            return Tick::Paused;
        }
        match self.plane.stats().refresh().await {
            Ok(snapshot) => {
                debug!(generation = snapshot.generation, "dashboard refreshed");
                Tick::Refreshed
            }
            Err(e) if e.is_circuit_open() => Tick::Paused,
            Err(e) => {
                warn!(error = %e, "dashboard refresh failed");
                Tick::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
