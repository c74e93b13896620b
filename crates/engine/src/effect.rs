// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-state actions (spec.md §4.3 step 12) as a pure `(JobState, &Job) ->
//! Vec<Effect>` function plus the small `Effect` enum it returns, grounded
//! in the teacher's `Effect`/`Executor` split: describing work as data
//! keeps the action table testable without a collaborator double for
//! every case, and keeps [`crate::pipeline`] as the only place that
//! actually touches the adapter traits.

use jobcore::{Job, JobId, JobState};

/// A unit of work the per-state action table wants performed against an
/// external collaborator, or against the engine's own bookkeeping
/// (`PostDepend`/`PostClean` recurse into `post_event`; `RemoveFromIndex`
/// is attempted but only takes effect once the job's refcount reaches
/// zero — see spec.md §4.3 step 10/13 and §9 reentrancy note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    DequeueAlloc(JobId),
    EnqueueAlloc(JobId),
    RecalcPending(JobId),
    SendStart(JobId),
    SendFree(JobId),
    PostDepend(JobId),
    PostClean(JobId),
    NotifyWait(JobId),
    RemoveFromIndex(JobId),
    InformDrain(JobId),
}

/// Computes the idempotent per-state action for `job`, currently in
/// `state` (spec.md §4.3). Reads `job.outstanding`/`job.perilog_active`/
/// `job.alloc_bypass` to decide whether a collaborator interaction is
/// already in flight, so invoking this twice with no intervening event
/// returns the same (often empty) list both times -- the idempotency
/// property (spec.md §8 property 4). The caller ([`crate::pipeline`]) is
/// responsible for flipping the `outstanding` bits once it actually
/// dispatches an effect.
pub fn dispatch_action(state: JobState, job: &Job) -> Vec<Effect> {
    let id = job.id;
    match state {
        JobState::New => Vec::new(),

        JobState::Depend => {
            if job.dependency_count() == 0 && !job.depend_posted {
                vec![Effect::PostDepend(id)]
            } else {
                Vec::new()
            }
        }

        JobState::Priority => {
            if job.outstanding.alloc_queued() || job.outstanding.alloc_pending() {
                vec![Effect::DequeueAlloc(id)]
            } else {
                Vec::new()
            }
        }

        JobState::Sched => {
            let mut effects = Vec::new();
            if !job.outstanding.alloc_queued() {
                effects.push(Effect::EnqueueAlloc(id));
            }
            effects.push(Effect::RecalcPending(id));
            effects
        }

        JobState::Run => {
            if job.perilog_active == 0 && !job.outstanding.start_pending() {
                vec![Effect::SendStart(id)]
            } else {
                Vec::new()
            }
        }

        JobState::Cleanup => {
            let mut effects = Vec::new();
            if job.outstanding.alloc_queued() || job.outstanding.alloc_pending() {
                effects.push(Effect::DequeueAlloc(id));
            }
            if job.has_resources
                && job.perilog_active == 0
                && !job.outstanding.start_pending()
                && !job.outstanding.free_pending()
                && !job.alloc_bypass
            {
                effects.push(Effect::SendFree(id));
            }
            if job.outstanding.is_empty() && !job.has_resources {
                effects.push(Effect::PostClean(id));
            }
            effects
        }

        JobState::Inactive => {
            let mut effects = Vec::new();
            if job.flags.has(jobcore::WAITABLE) {
                effects.push(Effect::NotifyWait(id));
            }
            effects.push(Effect::RemoveFromIndex(id));
            effects.push(Effect::InformDrain(id));
            effects
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
