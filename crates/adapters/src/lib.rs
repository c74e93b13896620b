// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobcore-adapters: trait contracts for the external collaborators named
//! in spec.md §6 (KVS, pub/sub, journal, scheduler, exec, drain, wait,
//! plugins), each with a `Noop` and a `Fake` (recording) implementation.

pub mod drain;
pub mod exec;
pub mod journal;
pub mod kvs;
pub mod plugins;
pub mod publisher;
pub mod scheduler;
pub mod wait;

pub use drain::{Drain, NoopDrain};
pub use exec::{Exec, ExecError, NoopExec};
pub use journal::{Journal, NoopJournal};
pub use kvs::{Kvs, KvsAppend, KvsError, NoopKvs};
pub use plugins::{NoopPlugins, PluginError, Plugins};
pub use publisher::{state_topic, NoopPublisher, Publisher, PublisherError};
pub use scheduler::{NoopScheduler, Scheduler};
pub use wait::{NoopWait, Wait};

#[cfg(any(test, feature = "test-support"))]
pub use drain::FakeDrain;
#[cfg(any(test, feature = "test-support"))]
pub use exec::{ExecCall, FakeExec};
#[cfg(any(test, feature = "test-support"))]
pub use journal::{FakeJournal, JournalRecord};
#[cfg(any(test, feature = "test-support"))]
pub use kvs::FakeKvs;
#[cfg(any(test, feature = "test-support"))]
pub use plugins::{FakePlugins, PluginCall};
#[cfg(any(test, feature = "test-support"))]
pub use publisher::{FakePublisher, PluginTopicPublication};
#[cfg(any(test, feature = "test-support"))]
pub use scheduler::{FakeScheduler, SchedulerCall};
#[cfg(any(test, feature = "test-support"))]
pub use wait::FakeWait;

/// Every external collaborator bundled behind one bound, so the engine
/// can be generic over a single type parameter instead of eight.
pub trait Collaborators:
    Kvs + Publisher + Journal + Scheduler + Exec + Drain + Wait + Plugins
{
}

impl<T> Collaborators for T where T: Kvs + Publisher + Journal + Scheduler + Exec + Drain + Wait + Plugins
{}

/// A [`Collaborators`] bundle where every collaborator is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCollaborators;

#[async_trait::async_trait]
impl Kvs for NoopCollaborators {
    async fn append_tx(&self, batch: Vec<KvsAppend>) -> Result<(), KvsError> {
        NoopKvs.append_tx(batch).await
    }
}

#[async_trait::async_trait]
impl Publisher for NoopCollaborators {
    async fn publish_job_state_batch(
        &self,
        transitions: Vec<(jobcore::JobId, jobcore::JobState, f64)>,
    ) -> Result<(), PublisherError> {
        NoopPublisher.publish_job_state_batch(transitions).await
    }

    async fn publish_plugin_topic(
        &self,
        job_id: jobcore::JobId,
        topic: &str,
        entry: &jobcore::EventEntry,
    ) -> Result<(), PublisherError> {
        NoopPublisher.publish_plugin_topic(job_id, topic, entry).await
    }
}

impl Journal for NoopCollaborators {
    fn record(&self, entry: &jobcore::EventEntry, assigned_seq: i64) {
        NoopJournal.record(entry, assigned_seq)
    }
}

impl Scheduler for NoopCollaborators {
    fn enqueue_alloc(&self, job_id: jobcore::JobId) {
        NoopScheduler.enqueue_alloc(job_id)
    }
    fn dequeue_alloc(&self, job_id: jobcore::JobId) {
        NoopScheduler.dequeue_alloc(job_id)
    }
    fn recalc_pending(&self, job_id: jobcore::JobId) {
        NoopScheduler.recalc_pending(job_id)
    }
}

impl Exec for NoopCollaborators {
    fn send_start(&self, job_id: jobcore::JobId) -> Result<(), ExecError> {
        NoopExec.send_start(job_id)
    }
    fn send_free(&self, job_id: jobcore::JobId) -> Result<(), ExecError> {
        NoopExec.send_free(job_id)
    }
}

impl Drain for NoopCollaborators {
    fn inform(&self, job_id: jobcore::JobId) {
        NoopDrain.inform(job_id)
    }
}

impl Wait for NoopCollaborators {
    fn notify(&self, job_id: jobcore::JobId) {
        NoopWait.notify(job_id)
    }
}

impl Plugins for NoopCollaborators {
    fn notify_all(&self, job_id: jobcore::JobId, entry: &jobcore::EventEntry) -> Result<(), PluginError> {
        NoopPlugins.notify_all(job_id, entry)
    }
    fn notify_state(
        &self,
        job_id: jobcore::JobId,
        entry: &jobcore::EventEntry,
        prev_state: jobcore::JobState,
        new_state: jobcore::JobState,
    ) -> Result<(), PluginError> {
        NoopPlugins.notify_state(job_id, entry, prev_state, new_state)
    }
    fn reprioritize(&self, job_id: jobcore::JobId, urgency: i32) -> Result<Option<i64>, PluginError> {
        NoopPlugins.reprioritize(job_id, urgency)
    }
}

/// A [`Collaborators`] bundle of recording fakes, for integration tests
/// that need to assert on the order and content of dispatched effects.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeCollaborators {
    pub kvs: FakeKvs,
    pub publisher: FakePublisher,
    pub journal: FakeJournal,
    pub scheduler: FakeScheduler,
    pub exec: FakeExec,
    pub drain: FakeDrain,
    pub wait: FakeWait,
    pub plugins: FakePlugins,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeCollaborators {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait::async_trait]
impl Kvs for FakeCollaborators {
    async fn append_tx(&self, batch: Vec<KvsAppend>) -> Result<(), KvsError> {
        self.kvs.append_tx(batch).await
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait::async_trait]
impl Publisher for FakeCollaborators {
    async fn publish_job_state_batch(
        &self,
        transitions: Vec<(jobcore::JobId, jobcore::JobState, f64)>,
    ) -> Result<(), PublisherError> {
        self.publisher.publish_job_state_batch(transitions).await
    }

    async fn publish_plugin_topic(
        &self,
        job_id: jobcore::JobId,
        topic: &str,
        entry: &jobcore::EventEntry,
    ) -> Result<(), PublisherError> {
        self.publisher.publish_plugin_topic(job_id, topic, entry).await
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Journal for FakeCollaborators {
    fn record(&self, entry: &jobcore::EventEntry, assigned_seq: i64) {
        self.journal.record(entry, assigned_seq)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Scheduler for FakeCollaborators {
    fn enqueue_alloc(&self, job_id: jobcore::JobId) {
        self.scheduler.enqueue_alloc(job_id)
    }
    fn dequeue_alloc(&self, job_id: jobcore::JobId) {
        self.scheduler.dequeue_alloc(job_id)
    }
    fn recalc_pending(&self, job_id: jobcore::JobId) {
        self.scheduler.recalc_pending(job_id)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Exec for FakeCollaborators {
    fn send_start(&self, job_id: jobcore::JobId) -> Result<(), ExecError> {
        self.exec.send_start(job_id)
    }
    fn send_free(&self, job_id: jobcore::JobId) -> Result<(), ExecError> {
        self.exec.send_free(job_id)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Drain for FakeCollaborators {
    fn inform(&self, job_id: jobcore::JobId) {
        self.drain.inform(job_id)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Wait for FakeCollaborators {
    fn notify(&self, job_id: jobcore::JobId) {
        self.wait.notify(job_id)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Plugins for FakeCollaborators {
    fn notify_all(&self, job_id: jobcore::JobId, entry: &jobcore::EventEntry) -> Result<(), PluginError> {
        self.plugins.notify_all(job_id, entry)
    }
    fn notify_state(
        &self,
        job_id: jobcore::JobId,
        entry: &jobcore::EventEntry,
        prev_state: jobcore::JobState,
        new_state: jobcore::JobState,
    ) -> Result<(), PluginError> {
        self.plugins.notify_state(job_id, entry, prev_state, new_state)
    }
    fn reprioritize(&self, job_id: jobcore::JobId, urgency: i32) -> Result<Option<i64>, PluginError> {
        self.plugins.reprioritize(job_id, urgency)
    }
}
