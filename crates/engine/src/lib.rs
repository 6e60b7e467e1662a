// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qc-engine: circuit breaker, dashboard aggregation, worker lifecycle,
//! config registry, queue remediation and housekeeping

mod breaker;
mod error;
mod housekeeping;
mod lifecycle;
mod plane;
mod registry;
mod remediation;
mod stats;

pub use breaker::{BreakerConfig, CircuitBreaker};
pub use error::EngineError;
pub use housekeeping::{classify, HousekeepingEngine};
pub use lifecycle::{CommandOutcome, LifecycleConfig, WorkerLifecycleController};
pub use plane::{Backends, ControlPlane, PlaneConfig, PlaneDeps};
pub use registry::WorkerConfigRegistry;
pub use remediation::{EmptyOptions, QueueRemediationOps, RemediationAck, RemediationAction};
pub use stats::{QueueStatsAggregator, StatsCache, StatsConfig};

#[cfg(any(test, feature = "test-support"))]
pub use plane::{FakeBackends, FakePlane};
