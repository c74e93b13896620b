// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios S1-S6 (spec.md §8), driving the real `Engine` and
//! `BatchEngine` against the adapters crate's recording fakes.

use std::time::Duration;

use jobcore::{CoreError, FakeClock, Job, JobId, JobState, PostFlags};
use jobcore_adapters::FakeCollaborators;
use jobcore_engine::Engine;

fn engine(collabs: FakeCollaborators) -> Engine<FakeCollaborators, FakeClock> {
    Engine::with_clock(collabs, Duration::from_millis(10), FakeClock::new())
}

fn context(key: &str, value: i64) -> serde_json::Map<String, serde_json::Value> {
    let mut m = serde_json::Map::new();
    m.insert(key.to_string(), serde_json::Value::from(value));
    m
}

/// S1: submit -> depend (auto) -> priority(100) -> alloc -> finish(0) ->
/// free -> clean (auto). Final state INACTIVE, eventlog_seq 7, end_event
/// name "finish".
#[tokio::test]
async fn s1_happy_path() {
    let eng = engine(FakeCollaborators::new());
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    eng.post_event(id, "submit", PostFlags::none(), None).unwrap();
    assert_eq!(eng.job(id).unwrap().state, JobState::Priority);

    eng.post_event(id, "priority", PostFlags::none(), Some(context("priority", 100))).unwrap();
    assert_eq!(eng.job(id).unwrap().state, JobState::Sched);

    eng.post_event(id, "alloc", PostFlags::none(), None).unwrap();
    assert_eq!(eng.job(id).unwrap().state, JobState::Run);

    eng.post_event(id, "finish", PostFlags::none(), Some(context("status", 0))).unwrap();
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Cleanup);
    assert_eq!(job.end_event.as_ref().unwrap().name, "finish");
    let seq_before_free = job.eventlog_seq;
    assert_eq!(seq_before_free, 5);

    // `free` also satisfies the CLEANUP action's last condition, which
    // auto-posts `clean` (step 12) -- two more sequence numbers, no caller
    // action required.
    eng.post_event(id, "free", PostFlags::none(), None).unwrap();

    // the job reached INACTIVE with no outstanding reference and was
    // evicted from the engine's index (spec.md §4.3 INACTIVE action).
    assert!(eng.job(id).is_none());
}

/// S2: dependency-add/-remove pairs around a non-zero starting dependency
/// count, demonstrating `depend` is posted exactly once, the moment the
/// count returns to zero (spec.md's per-state DEPEND action).
#[tokio::test]
async fn s2_dependency_add_then_remove_posts_depend_exactly_once() {
    let eng = engine(FakeCollaborators::new());
    let id = JobId::new(1);
    let mut job = Job::new(id, 1000);
    job.state = JobState::Depend;
    job.dependencies.insert("a".to_string());
    job.dependencies.insert("b".to_string());
    eng.insert_job(job);

    eng.post_event(id, "dependency-remove", PostFlags::none(), Some(desc("a"))).unwrap();
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Depend, "one dependency still outstanding");
    assert!(!job.depend_posted);

    eng.post_event(id, "dependency-remove", PostFlags::none(), Some(desc("b"))).unwrap();
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Priority, "depend auto-posted once the count hit zero");
    assert!(job.depend_posted);
}

fn desc(description: &str) -> serde_json::Map<String, serde_json::Value> {
    let mut m = serde_json::Map::new();
    m.insert("description".to_string(), serde_json::Value::from(description));
    m
}

/// S3: submit -> priority -> alloc -> exception(severity 0) preempts a
/// running job, landing it in CLEANUP with `end_event.name == "exception"`;
/// a later `finish` is legal from CLEANUP but does not overwrite the
/// latched end event (it only nudges the action table towards `free`).
#[tokio::test]
async fn s3_fatal_exception_during_run_latches_end_event() {
    let eng = engine(FakeCollaborators::new());
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    eng.post_event(id, "submit", PostFlags::none(), None).unwrap();
    eng.post_event(id, "priority", PostFlags::none(), Some(context("priority", 100))).unwrap();
    eng.post_event(id, "alloc", PostFlags::none(), None).unwrap();
    assert_eq!(eng.job(id).unwrap().state, JobState::Run);

    eng.post_event(id, "exception", PostFlags::none(), Some(context("severity", 0))).unwrap();
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Cleanup);
    assert_eq!(job.end_event.as_ref().unwrap().name, "exception");

    // the job still holds its resources, so it stays in CLEANUP; `finish`
    // is legal from CLEANUP but must not overwrite the already-latched end
    // event.
    eng.post_event(id, "finish", PostFlags::none(), None).unwrap();
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Cleanup);
    assert_eq!(job.end_event.as_ref().unwrap().name, "exception");
}

/// S4: `urgency` posted with `NO_COMMIT` updates the field in memory but
/// leaves the KVS log, the publish stream, and `eventlog_seq` untouched.
#[tokio::test]
async fn s4_no_commit_journaling() {
    let collabs = FakeCollaborators::new();
    let kvs = collabs.kvs.clone();
    let publisher = collabs.publisher.clone();
    let eng = engine(collabs);
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    eng.post_event(id, "submit", PostFlags::none(), None).unwrap();
    eng.batch().flush().await;
    let seq_before = eng.job(id).unwrap().eventlog_seq;
    let commits_before = kvs.committed_batches();

    eng.post_event(id, "urgency", PostFlags(PostFlags::NO_COMMIT), Some(context("urgency", 12))).unwrap();
    eng.batch().flush().await;

    let job = eng.job(id).unwrap();
    assert_eq!(job.urgency, 12);
    assert_eq!(job.eventlog_seq, seq_before);
    assert_eq!(kvs.committed_batches(), commits_before);
    assert_eq!(publisher.job_state_batches().len(), 1, "no new publish for an unchanged state");
}

/// S5: three events posted within one batch window commit atomically and
/// produce exactly one `job-state` publication carrying all three
/// transitions.
#[tokio::test(start_paused = true)]
async fn s5_batch_window_coalesces_three_transitions() {
    let collabs = FakeCollaborators::new();
    let kvs = collabs.kvs.clone();
    let publisher = collabs.publisher.clone();
    let eng = engine(collabs);
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    eng.post_event(id, "submit", PostFlags::none(), None).unwrap(); // -> DEPEND, auto -> PRIORITY
    eng.post_event(id, "priority", PostFlags::none(), Some(context("priority", 100))).unwrap(); // -> SCHED

    tokio::time::advance(Duration::from_millis(11)).await;
    tokio::task::yield_now().await;

    assert_eq!(kvs.committed_batches(), 1);
    let batches = publisher.job_state_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3, "DEPEND, PRIORITY, SCHED in one window");
}

/// S6: a KVS rejection raises the fatal condition and no publish or reply
/// follows for that batch.
#[tokio::test]
async fn s6_commit_failure_is_fatal_and_suppresses_publish() {
    let collabs = FakeCollaborators::new();
    collabs.kvs.set_failing(true);
    let publisher = collabs.publisher.clone();
    let eng = engine(collabs);
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    let mut fatal = eng.fatal();
    eng.post_event(id, "submit", PostFlags::none(), None).unwrap();
    eng.batch().flush().await;

    fatal.changed().await.unwrap();
    let err = fatal.borrow().clone();
    assert!(matches!(err, Some(CoreError::CommitFailed(_))));
    assert!(publisher.job_state_batches().is_empty(), "a failed commit must never publish");
}
