// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobcore::{EventEntry, Job, JobState};

fn job_in(state: JobState) -> Job {
    Job::builder().state(state).build()
}

#[yare::parameterized(
    new_to_depend = { JobState::New, JobState::Depend },
    depend_to_priority = { JobState::Depend, JobState::Priority },
    priority_to_sched = { JobState::Priority, JobState::Sched },
    cleanup_to_inactive = { JobState::Cleanup, JobState::Inactive },
)]
fn legal_edges_advance_state(from: JobState, to: JobState) {
    let mut job = job_in(from);
    let name = match from {
        JobState::New => "submit",
        JobState::Depend => "depend",
        JobState::Priority => "priority",
        JobState::Cleanup => "clean",
        _ => unreachable!(),
    };
    let entry = EventEntry::new(1.0, name, None);
    let result = apply(&mut job, &entry).unwrap();
    assert_eq!(result, Some(to));
    assert_eq!(job.state, to);
}

#[test]
fn submit_sets_submit_fields() {
    let mut job = job_in(JobState::New);
    let mut context = serde_json::Map::new();
    context.insert("urgency".into(), serde_json::json!(16));
    context.insert("userid".into(), serde_json::json!(42));
    context.insert("flags".into(), serde_json::json!(["waitable"]));
    let entry = EventEntry::new(5.0, "submit", Some(context));
    apply(&mut job, &entry).unwrap();
    assert_eq!(job.t_submit, 5.0);
    assert_eq!(job.urgency, 16);
    assert_eq!(job.userid, 42);
    assert!(job.flags.has(jobcore::WAITABLE));
    assert_eq!(job.state, JobState::Depend);
}

#[test]
fn submit_is_rejected_outside_new() {
    let mut job = job_in(JobState::Depend);
    let entry = EventEntry::new(1.0, "submit", None);
    assert!(matches!(apply(&mut job, &entry), Err(jobcore::CoreError::InvalidTransition(_))));
}

#[test]
fn dependency_add_then_remove_tracks_count() {
    let mut job = job_in(JobState::Depend);
    let mut ctx_a = serde_json::Map::new();
    ctx_a.insert("description".into(), serde_json::json!("a"));
    apply(&mut job, &EventEntry::new(1.0, "dependency-add", Some(ctx_a.clone()))).unwrap();
    assert_eq!(job.dependency_count(), 1);

    apply(&mut job, &EventEntry::new(2.0, "dependency-remove", Some(ctx_a))).unwrap();
    assert_eq!(job.dependency_count(), 0);
}

#[test]
fn priority_in_priority_state_enters_sched() {
    let mut job = job_in(JobState::Priority);
    let mut context = serde_json::Map::new();
    context.insert("priority".into(), serde_json::json!(100));
    let result = apply(&mut job, &EventEntry::new(1.0, "priority", Some(context))).unwrap();
    assert_eq!(result, Some(JobState::Sched));
    assert_eq!(job.priority, 100);
}

#[test]
fn priority_in_sched_state_updates_without_transition() {
    let mut job = job_in(JobState::Sched);
    let mut context = serde_json::Map::new();
    context.insert("priority".into(), serde_json::json!(200));
    let result = apply(&mut job, &EventEntry::new(1.0, "priority", Some(context))).unwrap();
    assert_eq!(result, None);
    assert_eq!(job.priority, 200);
    assert_eq!(job.state, JobState::Sched);
}

#[test]
fn alloc_in_sched_moves_to_run() {
    let mut job = job_in(JobState::Sched);
    let result = apply(&mut job, &EventEntry::new(1.0, "alloc", None)).unwrap();
    assert_eq!(result, Some(JobState::Run));
    assert!(job.has_resources);
}

#[test]
fn alloc_in_cleanup_sets_resources_without_transition() {
    let mut job = job_in(JobState::Cleanup);
    let result = apply(&mut job, &EventEntry::new(1.0, "alloc", None)).unwrap();
    assert_eq!(result, None);
    assert!(job.has_resources);
}

#[test]
fn free_requires_has_resources() {
    let mut job = job_in(JobState::Cleanup);
    assert!(matches!(
        apply(&mut job, &EventEntry::new(1.0, "free", None)),
        Err(jobcore::CoreError::InvalidTransition(_))
    ));
}

#[test]
fn finish_in_run_latches_end_event_and_moves_to_cleanup() {
    let mut job = job_in(JobState::Run);
    let result = apply(&mut job, &EventEntry::new(1.0, "finish", None)).unwrap();
    assert_eq!(result, Some(JobState::Cleanup));
    assert_eq!(job.end_event.unwrap().name, "finish");
}

#[test]
fn fatal_exception_latches_first_and_moves_to_cleanup() {
    let mut job = job_in(JobState::Sched);
    let mut severity0 = serde_json::Map::new();
    severity0.insert("severity".into(), serde_json::json!(0));
    let result =
        apply(&mut job, &EventEntry::new(1.0, "exception", Some(severity0.clone()))).unwrap();
    assert_eq!(result, Some(JobState::Cleanup));
    assert_eq!(job.end_event.as_ref().unwrap().name, "exception");

    // a later finish must not overwrite the latched end_event (invariant 6)
    apply(&mut job, &EventEntry::new(2.0, "finish", None)).unwrap();
    assert_eq!(job.end_event.unwrap().name, "exception");
}

#[test]
fn nonfatal_exception_does_not_change_state() {
    let mut job = job_in(JobState::Run);
    let mut severity1 = serde_json::Map::new();
    severity1.insert("severity".into(), serde_json::json!(5));
    let result = apply(&mut job, &EventEntry::new(1.0, "exception", Some(severity1))).unwrap();
    assert_eq!(result, None);
    assert_eq!(job.state, JobState::Run);
    assert!(job.end_event.is_none());
}

#[test]
fn final_release_is_rejected_while_running() {
    let mut job = job_in(JobState::Run);
    let mut context = serde_json::Map::new();
    context.insert("final".into(), serde_json::json!(true));
    assert!(matches!(
        apply(&mut job, &EventEntry::new(1.0, "release", Some(context))),
        Err(jobcore::CoreError::InvalidTransition(_))
    ));
}

#[test]
fn flux_restart_returns_sched_to_priority() {
    let mut job = job_in(JobState::Sched);
    let result = apply(&mut job, &EventEntry::new(1.0, "flux-restart", None)).unwrap();
    assert_eq!(result, Some(JobState::Priority));
}

#[test]
fn set_flags_is_legal_from_any_state() {
    for state in [JobState::New, JobState::Run, JobState::Inactive] {
        let mut job = job_in(state);
        let mut context = serde_json::Map::new();
        context.insert("flags".into(), serde_json::json!(["debug"]));
        apply(&mut job, &EventEntry::new(1.0, "set-flags", Some(context))).unwrap();
        assert!(job.flags.has(jobcore::DEBUG));
    }
}

#[test]
fn unknown_event_never_changes_state_but_still_succeeds() {
    let mut job = job_in(JobState::Run);
    let result = apply(&mut job, &EventEntry::new(1.0, "custom-signal", None)).unwrap();
    assert_eq!(result, None);
    assert_eq!(job.state, JobState::Run);
}

proptest::proptest! {
    /// Every (state, event) pair either transitions per the table or is
    /// rejected with InvalidTransition -- no third outcome.
    #[test]
    fn no_third_outcome(
        state in jobcore::test_support::strategies::arb_job_state(),
        name in jobcore::test_support::strategies::arb_event_name(),
    ) {
        let mut job = job_in(state);
        let entry = EventEntry::new(1.0, name, None);
        match apply(&mut job, &entry) {
            Ok(Some(new_state)) => assert_ne!(new_state, state, "reported a transition to the same state"),
            Ok(None) => {}
            Err(jobcore::CoreError::InvalidTransition(_)) => {}
            Err(other) => panic!("unexpected error variant from sm::apply: {other:?}"),
        }
    }
}
