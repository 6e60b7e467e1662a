// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job records as observed on the queue backend.
//!
//! The backend owns every state transition; the control plane only reads
//! records and asks for the two forced transitions it supports (re-enqueue of
//! failed jobs and removal).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque job identifier assigned by the queue backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Backend-reported job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Active,
    Completed,
    Failed,
    Retry,
}

crate::string_enum! {
    JobState {
        Pending => "pending",
        Active => "active",
        Completed => "completed",
        Failed => "failed",
        Retry => "retry",
    }
}

/// A single job with its opaque payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub queue: String,
    pub state: JobState,
    /// Higher runs sooner.
    #[serde(default)]
    pub priority: i32,
    pub created_on_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_on_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub output: serde_json::Value,
}

impl JobRecord {
    /// Reported duration, falling back to the start/completion timestamps.
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.duration_ms.or_else(|| match (self.started_on_ms, self.completed_on_ms) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        })
    }
}

/// Filter for job listings. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,
}

impl JobFilter {
    pub fn queue(name: impl Into<String>) -> Self {
        Self { queue: Some(name.into()), state: None }
    }

    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn matches(&self, job: &JobRecord) -> bool {
        self.queue.as_deref().is_none_or(|q| q == job.queue)
            && self.state.is_none_or(|s| s == job.state)
    }
}

/// Offset pagination request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 50;

    /// Build a request, clamping page to >= 1 and limit to `1..=MAX_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobRecord>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl JobPage {
    pub fn pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
