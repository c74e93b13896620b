// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobcore-daemon: the thin binary that wires [`jobcore_engine::Engine`] up
//! to a collaborator bundle, `tracing`, and environment-driven
//! configuration, and runs it on a single-threaded `tokio` runtime until
//! shutdown (spec.md non-goals: no CLI surface, no IPC listener).

pub mod config;

pub use config::{Config, ConfigError};
