// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state (JS): the in-memory record of a job's mutable state, flags,
//! counters, and references used by state-machine guards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::EventEntry;
use crate::flags::JobFlags;
use crate::ids::JobId;

/// Position of a job in the lifecycle DAG (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    New,
    Depend,
    Priority,
    Sched,
    Run,
    Cleanup,
    Inactive,
}

crate::simple_display! {
    JobState {
        New => "NEW",
        Depend => "DEPEND",
        Priority => "PRIORITY",
        Sched => "SCHED",
        Run => "RUN",
        Cleanup => "CLEANUP",
        Inactive => "INACTIVE",
    }
}

impl JobState {
    /// Whether jobs in this state count toward the process-wide running set.
    pub fn is_running(self) -> bool {
        matches!(self, JobState::Run | JobState::Cleanup)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Inactive)
    }
}

/// Sentinel for an unset scheduler priority (spec.md §3: "`priority` | i64
/// or sentinel `unset`").
pub const PRIORITY_UNSET: i64 = i64::MIN;

/// Outstanding scheduler/exec interactions tracked as a small bitset
/// multiset rather than five raw booleans (spec.md §9 redesign flag).
/// `perilog_active` is a genuine count, so it stays a separate field
/// rather than joining this set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutstandingSet(u8);

impl OutstandingSet {
    const ALLOC_QUEUED: u8 = 1 << 0;
    const ALLOC_PENDING: u8 = 1 << 1;
    const FREE_PENDING: u8 = 1 << 2;
    const START_PENDING: u8 = 1 << 3;

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn alloc_queued(self) -> bool {
        self.0 & Self::ALLOC_QUEUED != 0
    }
    pub fn set_alloc_queued(&mut self, v: bool) {
        self.set(Self::ALLOC_QUEUED, v)
    }

    pub fn alloc_pending(self) -> bool {
        self.0 & Self::ALLOC_PENDING != 0
    }
    pub fn set_alloc_pending(&mut self, v: bool) {
        self.set(Self::ALLOC_PENDING, v)
    }

    pub fn free_pending(self) -> bool {
        self.0 & Self::FREE_PENDING != 0
    }
    pub fn set_free_pending(&mut self, v: bool) {
        self.set(Self::FREE_PENDING, v)
    }

    pub fn start_pending(self) -> bool {
        self.0 & Self::START_PENDING != 0
    }
    pub fn set_start_pending(&mut self, v: bool) {
        self.set(Self::START_PENDING, v)
    }

    fn set(&mut self, bit: u8, v: bool) {
        if v {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// In-memory record of a job. Owned exclusively by the reactor thread;
/// no internal locking (spec.md §9: cyclic job/batch/engine references
/// are resolved by owning the job in a process-wide index keyed by id,
/// never via a handle held across a recursive `post_event` call).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    pub t_submit: f64,
    pub urgency: i32,
    pub priority: i64,
    pub userid: u32,
    pub flags: JobFlags,
    pub has_resources: bool,
    pub outstanding: OutstandingSet,
    pub alloc_bypass: bool,
    pub perilog_active: u8,
    pub depend_posted: bool,
    /// Keyed by dependency description (spec.md §4.3: `dependency-add`/
    /// `dependency-remove` key by description, not a bare counter) — the
    /// count is `dependencies.len()`.
    #[serde(default)]
    pub dependencies: std::collections::HashSet<String>,
    pub end_event: Option<EventEntry>,
    pub eventlog_seq: i64,
    /// event-index id → last assigned sequence (`-1` sentinel for events
    /// posted with `NO_COMMIT` and no `FORCE_SEQUENCE`; spec.md invariant 7).
    #[serde(default)]
    pub last_event_id_map: HashMap<i32, i64>,
    #[serde(skip, default)]
    pub refcount: u32,
    /// Free-form annotations merged in by `memo` events.
    #[serde(default)]
    pub annotations: serde_json::Map<String, serde_json::Value>,
}

impl Job {
    /// A freshly ingested job, in `NEW`, before `submit` has been applied.
    pub fn new(id: JobId, userid: u32) -> Self {
        Self {
            id,
            state: JobState::New,
            t_submit: 0.0,
            urgency: 0,
            priority: PRIORITY_UNSET,
            userid,
            flags: JobFlags::empty(),
            has_resources: false,
            outstanding: OutstandingSet::default(),
            alloc_bypass: false,
            perilog_active: 0,
            depend_posted: false,
            dependencies: std::collections::HashSet::new(),
            end_event: None,
            eventlog_seq: 0,
            last_event_id_map: HashMap::new(),
            refcount: 0,
            annotations: serde_json::Map::new(),
        }
    }

    pub fn dependency_count(&self) -> u32 {
        self.dependencies.len() as u32
    }

    /// Sets `end_event` only if unset (spec.md invariant 6: first terminal
    /// event latches, later ones never overwrite).
    pub fn latch_end_event(&mut self, entry: EventEntry) {
        if self.end_event.is_none() {
            self.end_event = Some(entry);
        }
    }

    pub fn incref(&mut self) {
        self.refcount += 1;
    }

    /// Returns the refcount after decrementing. Saturates at zero rather
    /// than panicking on an unbalanced decref.
    pub fn decref(&mut self) -> u32 {
        self.refcount = self.refcount.saturating_sub(1);
        self.refcount
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct JobBuilder {
    id: JobId,
    state: JobState,
    t_submit: f64,
    urgency: i32,
    priority: i64,
    userid: u32,
    flags: JobFlags,
    has_resources: bool,
    outstanding: OutstandingSet,
    alloc_bypass: bool,
    perilog_active: u8,
    depend_posted: bool,
    dependencies: std::collections::HashSet<String>,
    end_event: Option<EventEntry>,
    eventlog_seq: i64,
    last_event_id_map: HashMap<i32, i64>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for JobBuilder {
    fn default() -> Self {
        Self {
            id: JobId::new(1),
            state: JobState::New,
            t_submit: 0.0,
            urgency: 0,
            priority: PRIORITY_UNSET,
            userid: 0,
            flags: JobFlags::empty(),
            has_resources: false,
            outstanding: OutstandingSet::default(),
            alloc_bypass: false,
            perilog_active: 0,
            depend_posted: false,
            dependencies: std::collections::HashSet::new(),
            end_event: None,
            eventlog_seq: 0,
            last_event_id_map: HashMap::new(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl JobBuilder {
    crate::setters! {
        set {
            id: JobId,
            state: JobState,
            t_submit: f64,
            urgency: i32,
            priority: i64,
            userid: u32,
            flags: JobFlags,
            has_resources: bool,
            outstanding: OutstandingSet,
            alloc_bypass: bool,
            perilog_active: u8,
            depend_posted: bool,
            dependencies: std::collections::HashSet<String>,
            eventlog_seq: i64,
        }
        option {
            end_event: EventEntry,
        }
    }

    pub fn build(self) -> Job {
        Job {
            id: self.id,
            state: self.state,
            t_submit: self.t_submit,
            urgency: self.urgency,
            priority: self.priority,
            userid: self.userid,
            flags: self.flags,
            has_resources: self.has_resources,
            outstanding: self.outstanding,
            alloc_bypass: self.alloc_bypass,
            perilog_active: self.perilog_active,
            depend_posted: self.depend_posted,
            dependencies: self.dependencies,
            end_event: self.end_event,
            eventlog_seq: self.eventlog_seq,
            last_event_id_map: self.last_event_id_map,
            refcount: 0,
            annotations: serde_json::Map::new(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Job {
    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
