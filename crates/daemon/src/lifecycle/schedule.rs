// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic housekeeping runs.

use std::sync::Arc;
use std::time::Duration;

use qc_core::HousekeepingConfig;
use qc_engine::{Backends, ControlPlane};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(super) struct ScheduledHousekeeping<B: Backends> {
    plane: Arc<ControlPlane<B>>,
    interval: Duration,
    config: HousekeepingConfig,
}

impl<B: Backends> ScheduledHousekeeping<B> {
    pub fn new(plane: Arc<ControlPlane<B>>, interval: Duration, config: HousekeepingConfig) -> Self {
        Self { plane, interval, config }
    }

    /// First run one interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_secs = self.interval.as_secs(),
            dry_run = self.config.dry_run,
            "scheduled housekeeping enabled",
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let result = self.plane.housekeeping().run(&self.config).await;
                    if result.is_partial() {
                        warn!(
                            run_id = %result.run_id,
                            cleaned = result.total_cleaned,
                            errors = result.errors.len(),
                            "scheduled housekeeping finished with errors",
                        );
                    } else {
                        info!(
                            run_id = %result.run_id,
                            cleaned = result.total_cleaned,
                            freed_bytes = result.total_size_freed_bytes,
                            "scheduled housekeeping finished",
                        );
                    }
                }
            }
        }
        debug!("housekeeping schedule stopped");
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
