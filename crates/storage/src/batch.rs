// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Batch Engine (BE): accumulates durable appends and pub
//! notifications within a short time window, commits them atomically to
//! the KVS, then fires pub notifications and deferred replies in order
//! (spec.md §4.2).
//!
//! Batch lifecycle: `Idle -> Accumulating -> Committing -> {Done | Failed}`.
//! `Idle`/`Accumulating` are tracked directly (a batch slot is either
//! empty or not); `Committing` is a count of in-flight commit tasks, since
//! a fresh batch may start `Accumulating` while an older one is still
//! `Committing` (spec.md §4.2 concurrency note). `Done`/`Failed` are not
//! retained -- the batch is dropped the moment its commit task finishes.

use std::sync::Arc;
use std::time::Duration;

use jobcore::{CoreError, EventEntry, JobId, JobState};
use jobcore_adapters::{Kvs, KvsAppend, Publisher};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A reply registered via [`BatchEngine::respond_on_commit`], run once the
/// batch it was queued in commits successfully.
type Reply = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Batch {
    appends: Vec<KvsAppend>,
    transitions: Vec<(JobId, JobState, f64)>,
    plugin_topics: Vec<(JobId, String, EventEntry)>,
    replies: Vec<Reply>,
}

impl Batch {
    fn is_empty(&self) -> bool {
        self.appends.is_empty()
            && self.transitions.is_empty()
            && self.plugin_topics.is_empty()
            && self.replies.is_empty()
    }
}

/// Observable phase of the batch engine (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Accumulating,
    Committing,
}

struct Inner {
    current: Option<Batch>,
    committing: u32,
    handles: Vec<JoinHandle<()>>,
}

/// Coalesces KVS appends and state-transition notifications within a
/// fixed window (default 10ms, spec.md §4.2) and commits them atomically.
pub struct BatchEngine<K, P> {
    kvs: Arc<K>,
    publisher: Arc<P>,
    window: Duration,
    inner: Arc<Mutex<Inner>>,
    fatal_tx: watch::Sender<Option<CoreError>>,
}

impl<K, P> Clone for BatchEngine<K, P> {
    fn clone(&self) -> Self {
        Self {
            kvs: self.kvs.clone(),
            publisher: self.publisher.clone(),
            window: self.window,
            inner: self.inner.clone(),
            fatal_tx: self.fatal_tx.clone(),
        }
    }
}

impl<K, P> BatchEngine<K, P>
where
    K: Kvs,
    P: Publisher,
{
    /// spec.md §4.2: "arm a one-shot timer of the batch window" -- default
    /// 10ms, overridable so tests don't have to wait on a wall-clock sleep.
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(10);

    pub fn new(kvs: K, publisher: P, window: Duration) -> Self {
        let (fatal_tx, _rx) = watch::channel(None);
        Self {
            kvs: Arc::new(kvs),
            publisher: Arc::new(publisher),
            window,
            inner: Arc::new(Mutex::new(Inner { current: None, committing: 0, handles: Vec::new() })),
            fatal_tx,
        }
    }

    /// Subscribe to fatal `CommitFailed`/`PubFailed` conditions. The host
    /// reactor awaits this and stops on the first `Some` value (spec.md §7:
    /// these errors are fatal, never silently absorbed).
    pub fn fatal(&self) -> watch::Receiver<Option<CoreError>> {
        self.fatal_tx.subscribe()
    }

    pub fn phase(&self) -> BatchPhase {
        let inner = self.inner.lock();
        if inner.current.is_some() {
            BatchPhase::Accumulating
        } else if inner.committing > 0 {
            BatchPhase::Committing
        } else {
            BatchPhase::Idle
        }
    }

    /// Queue a durable append for the current batch (spec.md §4.3 step 7).
    pub fn append(&self, append: KvsAppend) {
        self.touch(|batch| batch.appends.push(append));
    }

    /// Queue a state-transition notification (spec.md §4.3 step 8).
    pub fn enqueue_transition(&self, job_id: JobId, state: JobState, ts: f64) {
        self.touch(|batch| batch.transitions.push((job_id, state, ts)));
    }

    /// Queue a per-event plugin-notification topic (spec.md §6), published
    /// once this batch commits -- alongside, but independent of, the
    /// aggregate `job-state` transition publish.
    pub fn enqueue_plugin_topic(&self, job_id: JobId, topic: impl Into<String>, entry: EventEntry) {
        self.touch(|batch| batch.plugin_topics.push((job_id, topic.into(), entry)));
    }

    /// Queue a reply to be sent only once the current batch commits
    /// successfully (spec.md §4.2).
    pub fn respond_on_commit(&self, reply: impl FnOnce() + Send + 'static) {
        self.touch(|batch| batch.replies.push(Box::new(reply)));
    }

    /// `Idle -> Accumulating`: create the batch on first use and arm the
    /// window timer; otherwise just append to the batch already accumulating.
    fn touch(&self, f: impl FnOnce(&mut Batch)) {
        let fresh = {
            let mut inner = self.inner.lock();
            let fresh = inner.current.is_none();
            f(inner.current.get_or_insert_with(Batch::default));
            fresh
        };
        if fresh {
            self.arm_timer();
        }
    }

    fn arm_timer(&self) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(engine.window).await;
            engine.flush().await;
        });
        let mut inner = self.inner.lock();
        inner.handles.retain(|h| !h.is_finished());
        inner.handles.push(handle);
    }

    /// `Accumulating -> Committing`: take the current batch (if non-empty)
    /// and commit it now, without waiting for the window timer. Called by
    /// the armed timer and by [`BatchEngine::shutdown`].
    pub async fn flush(&self) {
        let batch = {
            let mut inner = self.inner.lock();
            match inner.current.take() {
                Some(b) if !b.is_empty() => {
                    inner.committing += 1;
                    Some(b)
                }
                _ => None,
            }
        };
        let Some(batch) = batch else { return };
        self.commit(batch).await;
        self.inner.lock().committing -= 1;
    }

    /// Commit one batch: KVS append, then (on success) the single
    /// aggregate `job-state` publish, then any per-event plugin-topic
    /// publishes, then deferred replies, in that order (spec.md §4.2
    /// `Committing -> Done`). A KVS or publish failure is fatal and
    /// short-circuits the remaining steps (`Committing -> Failed`): no
    /// pub or reply is ever emitted for a batch whose commit failed
    /// (spec.md property 5).
    async fn commit(&self, batch: Batch) {
        let batch_len = batch.appends.len();
        let job_count = batch.transitions.len();

        if !batch.appends.is_empty() {
            if let Err(e) = self.kvs.append_tx(batch.appends).await {
                tracing::error!(error = %e, batch_len, "batch commit failed");
                self.raise_fatal(CoreError::CommitFailed(e.to_string()));
                return;
            }
        }

        if !batch.transitions.is_empty() {
            if let Err(e) = self.publisher.publish_job_state_batch(batch.transitions).await {
                tracing::error!(error = %e, job_count, "job-state publish failed");
                self.raise_fatal(CoreError::PubFailed(e.to_string()));
                return;
            }
        }

        for (job_id, topic, entry) in batch.plugin_topics {
            if let Err(e) = self.publisher.publish_plugin_topic(job_id, &topic, &entry).await {
                tracing::error!(error = %e, %job_id, topic, "plugin-topic publish failed");
                self.raise_fatal(CoreError::PubFailed(e.to_string()));
                return;
            }
        }

        for reply in batch.replies {
            reply();
        }

        tracing::info!(batch_len, job_count, "batch committed");
    }

    fn raise_fatal(&self, err: CoreError) {
        let _ = self.fatal_tx.send(Some(err));
    }

    /// Synchronously flush any pending batch and wait for every in-flight
    /// commit to resolve (spec.md §4.2 `shutdown`).
    pub async fn shutdown(&self) {
        self.flush().await;
        let handles: Vec<_> = {
            let mut inner = self.inner.lock();
            std::mem::take(&mut inner.handles)
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
