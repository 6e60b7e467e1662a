// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker state as seen by observers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

crate::string_enum! {
    CircuitState {
        Closed => "closed",
        Open => "open",
        HalfOpen => "half_open",
    }
}

/// Point-in-time breaker status for banners and polling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerStatus {
    pub state: CircuitState,
    pub failure_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_ms: Option<u64>,
    /// Time left in the cooldown while open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl BreakerStatus {
    /// Open and still cooling down: callers should show maintenance, not retry.
    pub fn is_blocking(&self) -> bool {
        self.state == CircuitState::Open && self.retry_after_ms.is_some_and(|ms| ms > 0)
    }
}
