// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker guarding calls to the queue backend.
//!
//! Closed: calls run; consecutive failures are counted and reaching the
//! threshold opens the circuit. Open: calls fail with
//! [`EngineError::CircuitOpen`] without running until the reset timeout has
//! elapsed since the last failure, after which the next call moves the circuit
//! to half-open. Half-open: calls run; the first success closes the circuit and
//! the first failure reopens it with a fresh timer.

use parking_lot::Mutex;
use qc_adapters::BackendError;
use qc_core::{BreakerStatus, CircuitState, Clock};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 3, reset_timeout_ms: 30_000 }
    }
}

impl BreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

#[derive(Debug, Default)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    last_failure_ms: Option<u64>,
}

pub struct CircuitBreaker<C: Clock> {
    name: &'static str,
    config: BreakerConfig,
    clock: C,
    inner: Mutex<BreakerInner>,
    status_tx: watch::Sender<BreakerStatus>,
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn new(name: &'static str, config: BreakerConfig, clock: C) -> Self {
        let inner = BreakerInner::default();
        let (status_tx, _) = watch::channel(BreakerStatus {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_ms: None,
            retry_after_ms: None,
        });
        Self { name, config, clock, inner: Mutex::new(inner), status_tx }
    }

    pub fn config(&self) -> BreakerConfig {
        self.config
    }

    /// Run `op` unless the circuit is open.
    ///
    /// Errors from `op` pass through unchanged and count as failures.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        self.admit()?;
        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(e) => {
                self.on_failure(&e);
                Err(e.into())
            }
        }
    }

    pub fn status(&self) -> BreakerStatus {
        self.status_of(&self.inner.lock())
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Watch state transitions and failure counts.
    pub fn subscribe(&self) -> watch::Receiver<BreakerStatus> {
        self.status_tx.subscribe()
    }

    fn remaining(&self, inner: &BreakerInner) -> Option<Duration> {
        let since = inner.last_failure_at?;
        let elapsed = self.clock.now().saturating_duration_since(since);
        self.config.reset_timeout().checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    fn status_of(&self, inner: &BreakerInner) -> BreakerStatus {
        let retry_after_ms = match inner.state {
            CircuitState::Open => {
                Some(self.remaining(inner).map(|d| d.as_millis() as u64).unwrap_or(0))
            }
            _ => None,
        };
        BreakerStatus {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_ms: inner.last_failure_ms,
            retry_after_ms,
        }
    }

    fn publish(&self, inner: &BreakerInner) {
        self.status_tx.send_replace(self.status_of(inner));
    }

    fn admit(&self) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }
        if let Some(remaining) = self.remaining(&inner) {
            tracing::debug!(breaker = self.name, "circuit open, skipping call");
            return Err(EngineError::CircuitOpen { retry_after_ms: remaining.as_millis() as u64 });
        }
        inner.state = CircuitState::HalfOpen;
        tracing::info!(breaker = self.name, "reset timeout elapsed, circuit half-open");
        self.publish(&inner);
        Ok(())
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                tracing::info!(breaker = self.name, "trial call succeeded, circuit closed");
                self.publish(&inner);
            }
            CircuitState::Closed if inner.failure_count > 0 => {
                inner.failure_count = 0;
                self.publish(&inner);
            }
            // A call admitted before the circuit opened; the open timer stands
            _ => {}
        }
    }

    fn on_failure(&self, error: &BackendError) {
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_at = Some(self.clock.now());
        inner.last_failure_ms = Some(self.clock.epoch_ms());
        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                inner.state = CircuitState::Open;
                tracing::warn!(
                    breaker = self.name,
                    failures = inner.failure_count,
                    error = %error,
                    "failure threshold reached, circuit open",
                );
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                tracing::warn!(breaker = self.name, error = %error, "trial call failed, circuit reopened");
            }
            _ => {
                tracing::debug!(breaker = self.name, failures = inner.failure_count, error = %error, "guarded call failed");
            }
        }
        self.publish(&inner);
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
