// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool lifecycle: start, stop and restart with heartbeat confirmation.
//!
//! Commands move the controller into `Starting` or `Stopping` before the
//! backend is asked to act, and only a heartbeat moves it on to `Running` or
//! `Stopped`. A command that the heartbeat does not confirm within the bounded
//! wait returns [`CommandOutcome::Pending`] and leaves the transitional state
//! visible to callers.

use parking_lot::Mutex;
use qc_adapters::{BackendError, WorkerBackend};
use qc_core::{Clock, LifecycleState, WorkerAction, WorkerStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::{EngineError, StatsCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// A heartbeat older than this does not count as the pool running.
    pub heartbeat_timeout_ms: u64,
    /// Heartbeat checks made after a command before giving up on confirmation.
    pub confirm_attempts: u32,
    pub confirm_interval_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { heartbeat_timeout_ms: 15_000, confirm_attempts: 5, confirm_interval_ms: 1_000 }
    }
}

/// Result of a lifecycle command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The heartbeat confirmed the target state.
    Confirmed { action: WorkerAction, state: LifecycleState },
    /// Command accepted but not yet confirmed; `state` is transitional.
    Pending { action: WorkerAction, state: LifecycleState },
    /// Nothing to do from the current state. Not an error.
    NoOp { action: WorkerAction, state: LifecycleState, reason: String },
}

impl CommandOutcome {
    pub fn state(&self) -> LifecycleState {
        match self {
            Self::Confirmed { state, .. } | Self::Pending { state, .. } | Self::NoOp { state, .. } => {
                *state
            }
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

#[derive(Debug, Default)]
struct Observed {
    /// `None` until the first heartbeat is seen.
    state: Option<LifecycleState>,
    /// Epoch ms of the last state change.
    since_ms: u64,
    last_status: Option<WorkerStatus>,
}

pub struct WorkerLifecycleController<W: WorkerBackend, C: Clock> {
    workers: Arc<W>,
    cache: Arc<StatsCache>,
    config: LifecycleConfig,
    clock: C,
    observed: Mutex<Observed>,
}

impl<W: WorkerBackend, C: Clock> WorkerLifecycleController<W, C> {
    pub fn new(workers: Arc<W>, cache: Arc<StatsCache>, config: LifecycleConfig, clock: C) -> Self {
        Self { workers, cache, config, clock, observed: Mutex::new(Observed::default()) }
    }

    /// Current state, folded from a fresh heartbeat.
    pub async fn state(&self) -> Result<LifecycleState, EngineError> {
        Ok(self.observe().await?.0)
    }

    /// Read the heartbeat and fold it into the state machine.
    pub async fn observe(&self) -> Result<(LifecycleState, WorkerStatus), EngineError> {
        let status = self.workers.heartbeat().await?;
        Ok((self.apply_heartbeat(status), status))
    }

    pub fn last_status(&self) -> Option<WorkerStatus> {
        self.observed.lock().last_status
    }

    pub async fn start(&self) -> Result<CommandOutcome, EngineError> {
        let action = WorkerAction::Start;
        let previous = match self
            .begin(action, |state| match state {
                LifecycleState::Stopped => Ok(LifecycleState::Starting),
                LifecycleState::Running => Err("already running"),
                LifecycleState::Starting => Err("start already in progress"),
                LifecycleState::Stopping => Err("stop in progress"),
            })
            .await?
        {
            Ok(previous) => previous,
            Err(outcome) => return Ok(outcome),
        };
        self.dispatch(action, previous).await?;
        Ok(self.confirm(action, LifecycleState::Running).await)
    }

    pub async fn stop(&self) -> Result<CommandOutcome, EngineError> {
        let action = WorkerAction::Stop;
        let previous = match self
            .begin(action, |state| match state {
                LifecycleState::Running => Ok(LifecycleState::Stopping),
                LifecycleState::Stopped => Err("already stopped"),
                LifecycleState::Stopping => Err("stop already in progress"),
                LifecycleState::Starting => Err("start in progress"),
            })
            .await?
        {
            Ok(previous) => previous,
            Err(outcome) => return Ok(outcome),
        };
        self.dispatch(action, previous).await?;
        Ok(self.confirm(action, LifecycleState::Stopped).await)
    }

    /// Restart from `Running` or `Stopped`.
    ///
    /// Callers only see `Starting` until the pool is confirmed running: with an
    /// atomic backend restart one command is sent, otherwise stop and start
    /// are sent in sequence without exposing the stopped state in between.
    pub async fn restart(&self) -> Result<CommandOutcome, EngineError> {
        let action = WorkerAction::Restart;
        let previous = match self
            .begin(action, |state| match state {
                LifecycleState::Running | LifecycleState::Stopped => Ok(LifecycleState::Starting),
                LifecycleState::Starting | LifecycleState::Stopping => {
                    Err("transition already in progress")
                }
            })
            .await?
        {
            Ok(previous) => previous,
            Err(outcome) => return Ok(outcome),
        };

        if self.workers.supports_atomic_restart() {
            self.send(action, WorkerAction::Restart, previous).await?;
        } else {
            if previous == LifecycleState::Running {
                self.send(action, WorkerAction::Stop, previous).await?;
                if !self.wait_for(|status, now| !self.confirms_running(status, now)).await {
                    tracing::warn!("stop phase of restart not confirmed, starting anyway");
                }
            }
            self.send(action, WorkerAction::Start, previous).await?;
        }
        self.cache.invalidate();
        Ok(self.confirm(action, LifecycleState::Running).await)
    }

    fn confirms_running(&self, status: &WorkerStatus, now_ms: u64) -> bool {
        status.confirms_running(now_ms, self.config.heartbeat_timeout_ms)
    }

    fn apply_heartbeat(&self, status: WorkerStatus) -> LifecycleState {
        let now = self.clock.epoch_ms();
        let running = self.confirms_running(&status, now);
        let mut observed = self.observed.lock();
        observed.last_status = Some(status);
        let next = match observed.state {
            Some(LifecycleState::Starting) if running => LifecycleState::Running,
            Some(LifecycleState::Starting)
                if !status.is_running
                    && now.saturating_sub(observed.since_ms) > self.config.heartbeat_timeout_ms =>
            {
                tracing::warn!("start was never confirmed by a heartbeat, pool is stopped");
                LifecycleState::Stopped
            }
            Some(LifecycleState::Starting) => LifecycleState::Starting,
            Some(LifecycleState::Stopping)
                if running
                    && now.saturating_sub(observed.since_ms) > self.config.heartbeat_timeout_ms =>
            {
                tracing::warn!("stop was never carried out, pool is still running");
                LifecycleState::Running
            }
            Some(LifecycleState::Stopping) if running => LifecycleState::Stopping,
            Some(LifecycleState::Stopping) => LifecycleState::Stopped,
            _ if running => LifecycleState::Running,
            _ => LifecycleState::Stopped,
        };
        if observed.state != Some(next) {
            tracing::info!(from = ?observed.state, to = %next, "worker pool state changed");
            observed.state = Some(next);
            observed.since_ms = now;
        }
        next
    }

    /// Check `rule` against the state from a fresh heartbeat and, if allowed,
    /// move to the transitional state it names. In-flight `Starting` and
    /// `Stopping` hold until the heartbeat settles them. Returns the state before the move, or the
    /// no-op outcome.
    async fn begin(
        &self,
        action: WorkerAction,
        rule: impl Fn(LifecycleState) -> Result<LifecycleState, &'static str>,
    ) -> Result<Result<LifecycleState, CommandOutcome>, EngineError> {
        let (observed_state, _) = self.observe().await?;
        let mut observed = self.observed.lock();
        let current = observed.state.unwrap_or(observed_state);
        match rule(current) {
            Ok(next) => {
                observed.state = Some(next);
                observed.since_ms = self.clock.epoch_ms();
                Ok(Ok(current))
            }
            Err(reason) => {
                drop(observed);
                tracing::info!(%action, state = %current, reason, "lifecycle command is a no-op");
                self.cache.invalidate();
                Ok(Err(CommandOutcome::NoOp { action, state: current, reason: reason.to_string() }))
            }
        }
    }

    async fn dispatch(
        &self,
        action: WorkerAction,
        previous: LifecycleState,
    ) -> Result<(), EngineError> {
        self.send(action, action, previous).await?;
        self.cache.invalidate();
        Ok(())
    }

    /// Send `command` on behalf of `action`, restoring `previous` on failure.
    async fn send(
        &self,
        action: WorkerAction,
        command: WorkerAction,
        previous: LifecycleState,
    ) -> Result<(), EngineError> {
        match self.workers.send_command(command).await {
            Ok(()) => {
                tracing::info!(%action, %command, "worker command sent");
                Ok(())
            }
            Err(e) => {
                {
                    let mut observed = self.observed.lock();
                    observed.state = Some(previous);
                    observed.since_ms = self.clock.epoch_ms();
                }
                self.cache.invalidate();
                tracing::warn!(%action, %command, error = %e, "worker command failed");
                Err(match e {
                    BackendError::Rejected { message, .. } => {
                        EngineError::CommandRejected { action, message }
                    }
                    other => other.into(),
                })
            }
        }
    }

    /// Poll the heartbeat until `done` holds, up to the configured attempts.
    async fn wait_for(&self, done: impl Fn(&WorkerStatus, u64) -> bool) -> bool {
        for attempt in 0..self.config.confirm_attempts {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.confirm_interval_ms)).await;
            }
            match self.workers.heartbeat().await {
                Ok(status) if done(&status, self.clock.epoch_ms()) => return true,
                Ok(_) => {}
                Err(e) => tracing::debug!(attempt, error = %e, "heartbeat read failed"),
            }
        }
        false
    }

    async fn confirm(&self, action: WorkerAction, target: LifecycleState) -> CommandOutcome {
        for attempt in 0..self.config.confirm_attempts {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.confirm_interval_ms)).await;
            }
            match self.observe().await {
                Ok((state, _)) if state == target => {
                    return CommandOutcome::Confirmed { action, state };
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(attempt, error = %e, "heartbeat read failed"),
            }
        }
        let state = self.observed.lock().state.unwrap_or(target);
        if state == target {
            return CommandOutcome::Confirmed { action, state };
        }
        tracing::warn!(%action, %state, "command not confirmed by heartbeat");
        CommandOutcome::Pending { action, state }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
