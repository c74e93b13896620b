// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named flag bitset carried on a job.
//!
//! `set-flags` unions a caller-supplied set of names into a job's flags.
//! Names are looked up against a small static table rather than parsed as
//! arbitrary bit positions, so an unrecognized name is a caller error
//! instead of silently doing nothing.

use serde::{Deserialize, Serialize};

/// A job is waitable by an external `wait` collaborator (spec.md §4.3, `INACTIVE` action).
pub const WAITABLE: u32 = 1 << 0;
/// Job is administratively held; schedulable actions should not fire.
pub const HOLD: u32 = 1 << 1;
/// Verbose per-event tracing requested for this job.
pub const DEBUG: u32 = 1 << 2;
/// A termination signal has been requested out-of-band.
pub const SIGNALED: u32 = 1 << 3;

const NAMED: &[(&str, u32)] =
    &[("waitable", WAITABLE), ("hold", HOLD), ("debug", DEBUG), ("signaled", SIGNALED)];

/// Bitset of named flags on a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobFlags(pub u32);

impl JobFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u32) {
        self.0 |= bit;
    }

    /// Union a named flag into this set. Returns `false` for an unknown name.
    pub fn set_by_name(&mut self, name: &str) -> bool {
        match NAMED.iter().find(|(n, _)| *n == name) {
            Some((_, bit)) => {
                self.set(*bit);
                true
            }
            None => false,
        }
    }

    /// Union every recognized name in `names` into this set, ignoring
    /// unrecognized names (per spec.md: `set-flags` commits regardless).
    pub fn union_names<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.set_by_name(name);
        }
    }
}
