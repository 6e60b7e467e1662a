// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! qc-daemon: the control plane served over a Unix socket
//!
//! Exposes the IPC protocol types for clients and the lifecycle entry points
//! (`Config`, `startup`, `setup_logging`) for the embedding process.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
mod listener;
mod poller;
pub mod protocol;

pub use lifecycle::{
    setup_logging, startup, Config, DaemonState, LifecycleError, Settings, StartupResult,
};
pub use protocol::{Request, Response};
