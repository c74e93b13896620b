// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State machine (SM): the pure transition function mapping
//! `(JobState, Event) -> JobState'` (spec.md §4.3). Illegal source states
//! are rejected rather than silently ignored.

use jobcore::{CoreError, EventEntry, EventKind, Job, JobState};
use serde_json::Value;

fn context_i64(entry: &EventEntry, key: &str) -> Option<i64> {
    entry.context.as_ref()?.get(key)?.as_i64()
}

fn context_i32(entry: &EventEntry, key: &str) -> Option<i32> {
    context_i64(entry, key).map(|v| v as i32)
}

fn context_u32(entry: &EventEntry, key: &str) -> Option<u32> {
    context_i64(entry, key).map(|v| v as u32)
}

fn context_str<'a>(entry: &'a EventEntry, key: &str) -> Option<&'a str> {
    entry.context.as_ref()?.get(key)?.as_str()
}

fn context_bool(entry: &EventEntry, key: &str) -> Option<bool> {
    entry.context.as_ref()?.get(key)?.as_bool()
}

fn context_str_array<'a>(entry: &'a EventEntry, key: &str) -> Vec<&'a str> {
    entry
        .context
        .as_ref()
        .and_then(|c| c.get(key))
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn invalid(name: &str, state: JobState) -> CoreError {
    CoreError::InvalidTransition(format!("event {name:?} not valid in state {state}"))
}

/// Apply `entry` to `job`, mutating it in place per the transition table.
///
/// Returns `Ok(Some(new_state))` when the state changed, `Ok(None)` when
/// the job mutated (or didn't) without changing state, and
/// `Err(CoreError::InvalidTransition)` when `entry` is not legal from the
/// job's current state.
pub fn apply(job: &mut Job, entry: &EventEntry) -> Result<Option<JobState>, CoreError> {
    let kind = EventKind::parse(&entry.name);
    let from = job.state;

    match kind {
        EventKind::Submit => {
            if from != JobState::New {
                return Err(invalid(&entry.name, from));
            }
            job.t_submit = entry.timestamp;
            if let Some(urgency) = context_i32(entry, "urgency") {
                job.urgency = urgency.clamp(0, 31);
            }
            if let Some(userid) = context_u32(entry, "userid") {
                job.userid = userid;
            }
            job.flags.union_names(context_str_array(entry, "flags"));
            job.state = JobState::Depend;
            Ok(Some(JobState::Depend))
        }

        EventKind::DependencyAdd => {
            if from != JobState::Depend {
                return Err(invalid(&entry.name, from));
            }
            if let Some(desc) = context_str(entry, "description") {
                job.dependencies.insert(desc.to_string());
            }
            Ok(None)
        }

        EventKind::DependencyRemove => {
            if from != JobState::Depend {
                return Err(invalid(&entry.name, from));
            }
            if let Some(desc) = context_str(entry, "description") {
                job.dependencies.remove(desc);
            }
            Ok(None)
        }

        EventKind::SetFlags => {
            job.flags.union_names(context_str_array(entry, "flags"));
            Ok(None)
        }

        EventKind::Memo => {
            if let Some(context) = &entry.context {
                for (k, v) in context {
                    job.annotations.insert(k.clone(), v.clone());
                }
            }
            Ok(None)
        }

        EventKind::Depend => {
            if from != JobState::Depend {
                return Err(invalid(&entry.name, from));
            }
            job.state = JobState::Priority;
            Ok(Some(JobState::Priority))
        }

        EventKind::Priority => {
            if from != JobState::Priority && from != JobState::Sched {
                return Err(invalid(&entry.name, from));
            }
            if let Some(priority) = context_i64(entry, "priority") {
                job.priority = priority;
            }
            if from == JobState::Sched {
                return Ok(None);
            }
            job.state = JobState::Sched;
            Ok(Some(JobState::Sched))
        }

        EventKind::Urgency => {
            if from.is_terminal() {
                return Err(invalid(&entry.name, from));
            }
            if let Some(urgency) = context_i32(entry, "urgency") {
                job.urgency = urgency.clamp(0, 31);
            }
            Ok(None)
        }

        EventKind::Exception => {
            if matches!(from, JobState::New | JobState::Inactive) {
                return Err(invalid(&entry.name, from));
            }
            let severity = context_i32(entry, "severity").unwrap_or(0);
            if severity == 0 {
                job.latch_end_event(entry.clone());
                job.outstanding.set_start_pending(false);
                if from == JobState::Cleanup {
                    return Ok(None);
                }
                job.state = JobState::Cleanup;
                return Ok(Some(JobState::Cleanup));
            }
            Ok(None)
        }

        EventKind::Alloc => {
            if from != JobState::Sched && from != JobState::Cleanup {
                return Err(invalid(&entry.name, from));
            }
            job.has_resources = true;
            job.outstanding.set_alloc_queued(false);
            job.outstanding.set_alloc_pending(false);
            if from == JobState::Sched {
                job.state = JobState::Run;
                return Ok(Some(JobState::Run));
            }
            Ok(None)
        }

        EventKind::Free => {
            if from != JobState::Cleanup {
                return Err(invalid(&entry.name, from));
            }
            if !job.has_resources {
                return Err(CoreError::InvalidTransition("free without has_resources".into()));
            }
            job.has_resources = false;
            job.outstanding.set_free_pending(false);
            Ok(None)
        }

        EventKind::Finish => {
            if from != JobState::Run && from != JobState::Cleanup {
                return Err(invalid(&entry.name, from));
            }
            if from == JobState::Run {
                job.latch_end_event(entry.clone());
                job.outstanding.set_start_pending(false);
                job.state = JobState::Cleanup;
                return Ok(Some(JobState::Cleanup));
            }
            Ok(None)
        }

        EventKind::Release => {
            if from != JobState::Run && from != JobState::Cleanup {
                return Err(invalid(&entry.name, from));
            }
            let is_final = context_bool(entry, "final").unwrap_or(false);
            if is_final && from == JobState::Run {
                return Err(CoreError::InvalidTransition(
                    "final release not valid while job is RUN".into(),
                ));
            }
            Ok(None)
        }

        EventKind::Clean => {
            if from != JobState::Cleanup {
                return Err(invalid(&entry.name, from));
            }
            job.state = JobState::Inactive;
            Ok(Some(JobState::Inactive))
        }

        EventKind::PrologStart => {
            if job.outstanding.start_pending() {
                return Err(invalid(&entry.name, from));
            }
            job.perilog_active = job.perilog_active.saturating_add(1);
            Ok(None)
        }

        EventKind::PrologFinish => {
            if job.outstanding.start_pending() {
                return Err(invalid(&entry.name, from));
            }
            job.perilog_active = job.perilog_active.saturating_sub(1);
            Ok(None)
        }

        EventKind::EpilogStart => {
            if from != JobState::Cleanup {
                return Err(invalid(&entry.name, from));
            }
            job.perilog_active = job.perilog_active.saturating_add(1);
            Ok(None)
        }

        EventKind::EpilogFinish => {
            if from != JobState::Cleanup {
                return Err(invalid(&entry.name, from));
            }
            job.perilog_active = job.perilog_active.saturating_sub(1);
            Ok(None)
        }

        EventKind::FluxRestart => {
            if from != JobState::Sched {
                return Err(invalid(&entry.name, from));
            }
            job.state = JobState::Priority;
            Ok(Some(JobState::Priority))
        }

        // Unrecognized events are committed and cached but never drive a
        // transition (spec.md §9 redesign flag).
        EventKind::Other(_) => Ok(None),
    }
}

#[cfg(test)]
#[path = "sm_tests.rs"]
mod tests;
