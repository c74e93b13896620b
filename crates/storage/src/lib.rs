// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobcore-storage: the Batch Engine (BE, spec.md §4.2) -- amortizes KVS
//! round-trips and preserves the invariant that pub notifications never
//! precede durable visibility of the event they describe.

pub mod batch;

pub use batch::{BatchEngine, BatchPhase};
