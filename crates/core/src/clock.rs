// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source shared by the breaker, lifecycle and housekeeping components.
//!
//! Two readings are exposed: a monotonic [`Instant`] for measuring cooldowns and
//! run durations, and wall-clock epoch milliseconds for comparing against
//! timestamps reported by the backends (heartbeats, flag times, upload starts).

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;

    /// Milliseconds elapsed since `epoch_ms`, saturating at zero for timestamps
    /// in the future.
    fn ms_since(&self, epoch_ms: u64) -> u64 {
        self.epoch_ms().saturating_sub(epoch_ms)
    }
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

#[derive(Debug)]
struct FakeTime {
    instant: Instant,
    epoch_ms: u64,
}

/// Manually driven clock for tests.
///
/// Both readings live behind one lock so `advance` moves them together.
#[derive(Clone, Debug)]
pub struct FakeClock {
    time: Arc<Mutex<FakeTime>>,
}

impl FakeClock {
    /// Default wall-clock start: 2026-01-01T00:00:00Z.
    pub const START_EPOCH_MS: u64 = 1_767_225_600_000;

    pub fn new() -> Self {
        Self::at_epoch_ms(Self::START_EPOCH_MS)
    }

    pub fn at_epoch_ms(epoch_ms: u64) -> Self {
        Self { time: Arc::new(Mutex::new(FakeTime { instant: Instant::now(), epoch_ms })) }
    }

    /// Move both readings forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut time = self.time.lock();
        time.instant += duration;
        time.epoch_ms += duration.as_millis() as u64;
    }

    /// Reposition the wall clock without touching the monotonic reading.
    pub fn set_epoch_ms(&self, epoch_ms: u64) {
        self.time.lock().epoch_ms = epoch_ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.time.lock().instant
    }

    fn epoch_ms(&self) -> u64 {
        self.time.lock().epoch_ms
    }
}

/// Hours expressed in milliseconds, for grace-period arithmetic.
pub const fn hours_ms(hours: u64) -> u64 {
    hours * 60 * 60 * 1000
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
