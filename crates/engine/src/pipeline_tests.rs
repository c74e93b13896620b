// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use jobcore::{CoreError, FakeClock, Job, JobId, JobState, PostFlags};
use jobcore_adapters::{ExecCall, FakeCollaborators, SchedulerCall};

use super::Engine;

fn engine(collabs: FakeCollaborators) -> Engine<FakeCollaborators, FakeClock> {
    Engine::with_clock(collabs, Duration::from_millis(10), FakeClock::new())
}

async fn settle<C, Clk>(engine: &Engine<C, Clk>)
where
    C: jobcore_adapters::Collaborators + Clone,
    Clk: jobcore::Clock,
{
    engine.batch().flush().await;
}

#[tokio::test]
async fn new_job_rejects_everything_but_submit() {
    let collabs = FakeCollaborators::new();
    let eng = engine(collabs);
    eng.insert_job(Job::new(JobId::new(1), 1000));

    let err = eng.post_event(JobId::new(1), "priority", PostFlags::none(), None).unwrap_err();
    assert!(matches!(err, CoreError::TryAgain));
}

#[tokio::test]
async fn unknown_job_is_try_again() {
    let collabs = FakeCollaborators::new();
    let eng = engine(collabs);
    let err = eng.post_event(JobId::new(99), "submit", PostFlags::none(), None).unwrap_err();
    assert!(matches!(err, CoreError::TryAgain));
}

#[tokio::test]
async fn submit_auto_posts_depend_and_lands_in_priority() {
    let collabs = FakeCollaborators::new();
    let eng = engine(collabs);
    eng.insert_job(Job::new(JobId::new(1), 1000));

    eng.post_event(JobId::new(1), "submit", PostFlags::none(), None).unwrap();

    let job = eng.job(JobId::new(1)).unwrap();
    assert_eq!(job.state, JobState::Priority);
    assert!(job.depend_posted);
    // submit + auto depend, each assigned a sequence number.
    assert_eq!(job.eventlog_seq, 2);
    assert_eq!(job.last_event_id_map.len(), 2);
}

#[tokio::test]
async fn submit_and_auto_depend_both_commit_and_publish_in_one_window() {
    let collabs = FakeCollaborators::new();
    let kvs = collabs.kvs.clone();
    let publisher = collabs.publisher.clone();
    let eng = engine(collabs);
    eng.insert_job(Job::new(JobId::new(1), 1000));

    eng.post_event(JobId::new(1), "submit", PostFlags::none(), None).unwrap();
    settle(&eng).await;

    assert_eq!(kvs.committed_batches(), 1);
    assert_eq!(kvs.entries_for(JobId::new(1)).len(), 2);
    let batches = publisher.job_state_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], vec![(JobId::new(1), JobState::Depend, 1000.0), (JobId::new(1), JobState::Priority, 1000.0)]);
}

#[tokio::test]
async fn no_commit_flag_skips_append_and_publish_when_state_is_unchanged() {
    let collabs = FakeCollaborators::new();
    let kvs = collabs.kvs.clone();
    let eng = engine(collabs);
    eng.insert_job(Job::new(JobId::new(1), 1000));
    eng.post_event(JobId::new(1), "submit", PostFlags::none(), None).unwrap();
    settle(&eng).await;

    let seq_before = eng.job(JobId::new(1)).unwrap().eventlog_seq;

    eng.post_event(JobId::new(1), "urgency", PostFlags(PostFlags::NO_COMMIT), Some(context("urgency", 7))).unwrap();
    settle(&eng).await;

    let job = eng.job(JobId::new(1)).unwrap();
    assert_eq!(job.urgency, 7);
    assert_eq!(job.eventlog_seq, seq_before, "NO_COMMIT without FORCE_SEQUENCE must not advance the sequence");
    assert_eq!(kvs.committed_batches(), 1, "no second commit for a NO_COMMIT event");
}

fn context(key: &str, value: i64) -> serde_json::Map<String, serde_json::Value> {
    let mut m = serde_json::Map::new();
    m.insert(key.to_string(), serde_json::Value::from(value));
    m
}

#[tokio::test]
async fn full_lifecycle_reaches_inactive_and_evicts_the_job() {
    let collabs = FakeCollaborators::new();
    let kvs = collabs.kvs.clone();
    let scheduler = collabs.scheduler.clone();
    let exec = collabs.exec.clone();
    let drain = collabs.drain.clone();
    let eng = engine(collabs);
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    eng.post_event(id, "submit", PostFlags::none(), None).unwrap(); // -> PRIORITY (auto depend)
    assert_eq!(eng.job(id).unwrap().state, JobState::Priority);

    eng.post_event(id, "priority", PostFlags::none(), Some(context("priority", 100))).unwrap(); // -> SCHED
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Sched);
    assert!(job.outstanding.alloc_queued());
    assert_eq!(scheduler.calls(), vec![SchedulerCall::EnqueueAlloc(id), SchedulerCall::RecalcPending(id)]);

    eng.post_event(id, "alloc", PostFlags::none(), None).unwrap(); // -> RUN
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Run);
    assert!(job.has_resources);
    assert!(!job.outstanding.alloc_queued(), "alloc clears the outstanding request it satisfied");
    assert_eq!(eng.running_count(), 1);
    assert_eq!(exec.calls(), vec![ExecCall::Start(id)]);

    eng.post_event(id, "finish", PostFlags::none(), None).unwrap(); // -> CLEANUP
    assert_eq!(eng.job(id).unwrap().state, JobState::Cleanup);
    assert_eq!(eng.running_count(), 1, "CLEANUP still counts as running");
    assert_eq!(exec.calls(), vec![ExecCall::Start(id), ExecCall::Free(id)]);

    eng.post_event(id, "free", PostFlags::none(), None).unwrap(); // auto-posts clean -> INACTIVE
    assert_eq!(eng.running_count(), 0);
    assert_eq!(drain.informed(), vec![id]);

    settle(&eng).await;
    assert!(kvs.committed_batches() >= 1);
    assert!(eng.job(id).is_none(), "an INACTIVE job with no outstanding references is evicted");
}

#[tokio::test]
async fn exec_failure_surfaces_as_downstream_but_still_releases_the_job() {
    let collabs = FakeCollaborators::new();
    collabs.exec.set_failing(true);
    let eng = engine(collabs);
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    eng.post_event(id, "submit", PostFlags::none(), None).unwrap();
    eng.post_event(id, "priority", PostFlags::none(), Some(context("priority", 100))).unwrap();

    let err = eng.post_event(id, "alloc", PostFlags::none(), None).unwrap_err();
    assert!(matches!(err, CoreError::Downstream(_)));

    // the SM transition itself still committed; only the RUN action failed.
    let job = eng.job(id).unwrap();
    assert_eq!(job.state, JobState::Run);
    assert_eq!(job.refcount, 0, "step 13 release runs even when the action dispatch errors");
}

#[tokio::test]
async fn reentrant_post_event_does_not_deadlock() {
    // PostDepend/PostClean recurse into post_event while the outer call's
    // own step-10 reference is still held; this must not self-deadlock on
    // the engine's job-index lock.
    let collabs = FakeCollaborators::new();
    let eng = engine(collabs);
    let id = JobId::new(1);
    eng.insert_job(Job::new(id, 1000));

    eng.post_event(id, "submit", PostFlags::none(), None).unwrap();
    assert_eq!(eng.job(id).unwrap().state, JobState::Priority);
}
