// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event publisher (pub/sub bus, spec.md §6): job-state topics
//! (`job.state.new|depend|priority|sched|run|cleanup|inactive`) and
//! per-event plugin topics.

use async_trait::async_trait;
use jobcore::{EventEntry, JobId, JobState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("publish failed: {0}")]
    PublishFailed(String),
}

/// Maps a job state to its `job.state.<state>` pub-topic name (spec.md
/// §6). Public so `jobcore-storage`'s batch commit can name the topic it
/// passes to [`Publisher::publish_plugin_topic`] on every state change.
pub fn state_topic(state: JobState) -> &'static str {
    match state {
        JobState::New => "job.state.new",
        JobState::Depend => "job.state.depend",
        JobState::Priority => "job.state.priority",
        JobState::Sched => "job.state.sched",
        JobState::Run => "job.state.run",
        JobState::Cleanup => "job.state.cleanup",
        JobState::Inactive => "job.state.inactive",
    }
}

/// Pub/sub bus the engine publishes state-change and plugin-topic events
/// to, strictly after the corresponding KVS commit resolves (spec.md
/// invariant 5).
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    /// The Batch Engine's single aggregate publish per commit (spec.md
    /// §4.2 step 1, §6): one `job-state` topic message carrying every
    /// `[id, state, ts]` transition accumulated in the batch. Called at
    /// most once per batch commit, and only when the batch accumulated
    /// at least one transition.
    async fn publish_job_state_batch(
        &self,
        transitions: Vec<(JobId, JobState, f64)>,
    ) -> Result<(), PublisherError>;

    /// Per-event plugin-notification topic (spec.md §6): `job.state.<state>`
    /// for state-change calls (payload `{entry, prev_state}`), called by
    /// `jobcore-storage`'s batch commit once per queued transition,
    /// strictly after the batch's KVS append resolves.
    async fn publish_plugin_topic(
        &self,
        job_id: JobId,
        topic: &str,
        entry: &EventEntry,
    ) -> Result<(), PublisherError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl Publisher for NoopPublisher {
    async fn publish_job_state_batch(
        &self,
        _transitions: Vec<(JobId, JobState, f64)>,
    ) -> Result<(), PublisherError> {
        Ok(())
    }

    async fn publish_plugin_topic(
        &self,
        _job_id: JobId,
        _topic: &str,
        _entry: &EventEntry,
    ) -> Result<(), PublisherError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub struct PluginTopicPublication {
        pub job_id: JobId,
        pub topic: String,
        pub event_name: String,
    }

    #[derive(Default)]
    struct FakeState {
        job_state_batches: Vec<Vec<(JobId, JobState, f64)>>,
        plugin_topic: Vec<PluginTopicPublication>,
        fail: bool,
    }

    /// Records every publication in arrival order for assertion in tests.
    #[derive(Clone, Default)]
    pub struct FakePublisher {
        inner: Arc<Mutex<FakeState>>,
    }

    impl FakePublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn job_state_batches(&self) -> Vec<Vec<(JobId, JobState, f64)>> {
            self.inner.lock().job_state_batches.clone()
        }

        pub fn plugin_topic_calls(&self) -> Vec<PluginTopicPublication> {
            self.inner.lock().plugin_topic.clone()
        }

        /// Make every subsequent publish call return `PublishFailed`.
        pub fn set_failing(&self, failing: bool) {
            self.inner.lock().fail = failing;
        }
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn publish_job_state_batch(
            &self,
            transitions: Vec<(JobId, JobState, f64)>,
        ) -> Result<(), PublisherError> {
            let mut state = self.inner.lock();
            if state.fail {
                return Err(PublisherError::PublishFailed("fake publisher configured to fail".into()));
            }
            state.job_state_batches.push(transitions);
            Ok(())
        }

        async fn publish_plugin_topic(
            &self,
            job_id: JobId,
            topic: &str,
            entry: &EventEntry,
        ) -> Result<(), PublisherError> {
            let mut state = self.inner.lock();
            if state.fail {
                return Err(PublisherError::PublishFailed("fake publisher configured to fail".into()));
            }
            state.plugin_topic.push(PluginTopicPublication {
                job_id,
                topic: topic.to_string(),
                event_name: entry.name.clone(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePublisher, PluginTopicPublication};

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
