// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failure of a call to an external backend (queue, worker pool, config store,
/// storage, catalog, host probes).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{backend} unavailable: {message}")]
    Unavailable { backend: &'static str, message: String },

    #[error("{backend} rejected request: {message}")]
    Rejected { backend: &'static str, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl BackendError {
    pub fn unavailable(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable { backend, message: message.into() }
    }

    pub fn rejected(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected { backend, message: message.into() }
    }

    /// The backend refused the request itself, as opposed to being unreachable.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
