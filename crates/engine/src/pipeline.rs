// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reactor-owned `Engine`: the process-wide job index, the
//! running-set counter, and `post_event` -- the 13-step pipeline from
//! spec.md §4.3 (guard, encode, journal, apply, sequence, cache, append,
//! publish, refcount, plugin hook, action dispatch, release).
//!
//! Reentrancy (spec.md §9): jobs live in a process-wide `HashMap<JobId,
//! Job>` owned by `Engine`, not behind a handle a caller could hold
//! across a recursive `post_event` call. A nested call (from a plugin
//! callback or a `PostDepend`/`PostClean` effect) looks the job back up
//! by id; the `refcount` taken in step 10 and released in step 13 is
//! what keeps a job from being evicted mid-pipeline.

use std::collections::HashMap;

use jobcore::{Clock, CoreError, EventEntry, EventIndex, EventKind, Job, JobId, JobState, PostFlags, SystemClock};
use jobcore_adapters::{Collaborators, Journal, KvsAppend, Plugins, Scheduler, Exec, Drain, Wait};
use jobcore_storage::BatchEngine;
use parking_lot::Mutex;
use serde_json::Map;

use crate::effect::{dispatch_action, Effect};
use crate::sm;

struct Inner {
    jobs: HashMap<JobId, Job>,
    evx: EventIndex,
    running: u32,
}

/// Owns every job's in-memory state and drives `post_event` against a
/// bundle of external collaborators (`C`). Generic over `Clk` so tests
/// can inject a [`jobcore::FakeClock`] for default event timestamps.
pub struct Engine<C, Clk = SystemClock> {
    collabs: C,
    batch: BatchEngine<C, C>,
    clock: Clk,
    inner: Mutex<Inner>,
}

impl<C> Engine<C, SystemClock>
where
    C: Collaborators + Clone,
{
    pub fn new(collabs: C, batch_window: std::time::Duration) -> Self {
        Self::with_clock(collabs, batch_window, SystemClock)
    }
}

impl<C, Clk> Engine<C, Clk>
where
    C: Collaborators + Clone,
    Clk: Clock,
{
    pub fn with_clock(collabs: C, batch_window: std::time::Duration, clock: Clk) -> Self {
        let batch = BatchEngine::new(collabs.clone(), collabs.clone(), batch_window);
        Self {
            collabs,
            batch,
            clock,
            inner: Mutex::new(Inner { jobs: HashMap::new(), evx: EventIndex::new(), running: 0 }),
        }
    }

    /// Registers a freshly ingested job in `NEW`, ready to receive `submit`.
    pub fn insert_job(&self, job: Job) {
        self.inner.lock().jobs.insert(job.id, job);
    }

    pub fn job(&self, job_id: JobId) -> Option<Job> {
        self.inner.lock().jobs.get(&job_id).cloned()
    }

    /// Process-wide count of jobs in `{RUN, CLEANUP}` (spec.md §4.3 step 9).
    pub fn running_count(&self) -> u32 {
        self.inner.lock().running
    }

    pub fn batch(&self) -> &BatchEngine<C, C> {
        &self.batch
    }

    /// Subscribes to fatal `CommitFailed`/`PubFailed` conditions raised by
    /// the batch engine (spec.md §7).
    pub fn fatal(&self) -> tokio::sync::watch::Receiver<Option<CoreError>> {
        self.batch.fatal()
    }

    pub async fn shutdown(&self) {
        self.batch.shutdown().await;
    }

    /// Runs the full `post_event` pipeline (spec.md §4.3) for `job_id`.
    pub fn post_event(
        &self,
        job_id: JobId,
        name: &str,
        flags: PostFlags,
        context: Option<Map<String, serde_json::Value>>,
    ) -> Result<(), CoreError> {
        self.post_event_at(job_id, name, flags, context, None)
    }

    fn post_event_at(
        &self,
        job_id: JobId,
        name: &str,
        flags: PostFlags,
        context: Option<Map<String, serde_json::Value>>,
        timestamp: Option<f64>,
    ) -> Result<(), CoreError> {
        tracing::debug!(%job_id, name, flags = flags.0, "post_event");

        // Step 1: guard. A job not yet submitted only accepts `submit`.
        {
            let inner = self.inner.lock();
            let job = inner.jobs.get(&job_id).ok_or(CoreError::TryAgain)?;
            if job.state == JobState::New && name != "submit" {
                return Err(CoreError::TryAgain);
            }
        }

        // Step 2: encode, defaulting the timestamp to wall time.
        let entry = EventEntry::new(timestamp.unwrap_or_else(|| self.clock.epoch_secs_f64()), name, context);
        let kind = EventKind::parse(&entry.name);

        // Step 3: journal hook. `-1` sentinel until we know the real
        // sequence (set below once we know whether a sequence is assigned).
        let will_assign_sequence = !flags.no_commit() || flags.force_sequence();

        let (prev_state, new_state_opt, assigned_seq) = {
            let mut inner = self.inner.lock();
            let job = inner.jobs.get_mut(&job_id).ok_or(CoreError::TryAgain)?;
            let prev_state = job.state;

            self.collabs.record(&entry, if will_assign_sequence { job.eventlog_seq + 1 } else { -1 });

            // Step 4: apply.
            let new_state_opt = sm::apply(job, &entry)?;

            // Step 5: sequence.
            let assigned_seq = if will_assign_sequence {
                job.eventlog_seq += 1;
                job.eventlog_seq
            } else {
                -1
            };

            // Step 6: cache.
            let evx_id = inner.evx.index(&entry.name)?;
            let job = inner.jobs.get_mut(&job_id).ok_or(CoreError::TryAgain)?;
            job.last_event_id_map.insert(evx_id, assigned_seq);

            (prev_state, new_state_opt, assigned_seq)
        };

        // Step 7: append, gated by NO_COMMIT.
        if !flags.no_commit() {
            self.batch.append(KvsAppend { job_id, entry: entry.clone() });
        }

        // Step 8: publish. Per the literal pipeline text this is gated on
        // a state change, not on NO_COMMIT -- an event posted with
        // NO_COMMIT that still changes state is still announced once its
        // (never-appended) "commit" resolves, since the batch may carry
        // other jobs' real appends in the same window. This mirrors
        // spec.md §4.3 step 8 exactly; see DESIGN.md.
        //
        // Alongside the aggregate `job-state` batch transition, queue the
        // per-event plugin-notification topic (spec.md §6:
        // `job.state.<state>`, payload `{entry, prev_state}`), published
        // by the same batch commit once it resolves.
        if let Some(new_state) = new_state_opt {
            self.batch.enqueue_transition(job_id, new_state, entry.timestamp);
            self.batch.enqueue_plugin_topic(
                job_id,
                jobcore_adapters::state_topic(new_state),
                entry.clone(),
            );
        }

        // Step 9: running counter, maintained on the RUN/CLEANUP edges.
        if let Some(new_state) = new_state_opt {
            self.update_running_count(prev_state, new_state);
        }

        // Step 10: reference.
        {
            let mut inner = self.inner.lock();
            if let Some(job) = inner.jobs.get_mut(&job_id) {
                job.incref();
            }
        }

        let result = self.run_hooks_and_actions(job_id, &entry, &kind, prev_state, new_state_opt);

        // Step 13: release. Evicts the job once its refcount drops to
        // zero and it has reached INACTIVE (spec.md §9 reentrancy note).
        {
            let mut inner = self.inner.lock();
            if let Some(job) = inner.jobs.get_mut(&job_id) {
                let refcount = job.decref();
                if refcount == 0 && job.state == JobState::Inactive {
                    inner.jobs.remove(&job_id);
                }
            }
        }

        result
    }

    fn update_running_count(&self, prev_state: JobState, new_state: JobState) {
        let was_running = prev_state.is_running();
        let now_running = new_state.is_running();
        if was_running == now_running {
            return;
        }
        let mut inner = self.inner.lock();
        if now_running {
            inner.running += 1;
        } else {
            inner.running = inner.running.saturating_sub(1);
        }
    }

    /// Steps 11-12: plugin hooks, then the per-state action table. Runs
    /// outside the job lock (collaborators and recursive `post_event`
    /// calls must not re-enter while we hold it).
    fn run_hooks_and_actions(
        &self,
        job_id: JobId,
        entry: &EventEntry,
        kind: &EventKind,
        prev_state: JobState,
        new_state_opt: Option<JobState>,
    ) -> Result<(), CoreError> {
        // Step 11: plugin hook.
        if let Err(e) = self.collabs.notify_all(job_id, entry) {
            // spec.md §9 open question: the source swallows plugin errors
            // but flags that they should become job exceptions. We keep
            // that seam marked rather than silently deciding it here.
            // TODO(plugin-errors): synthesize an `exception` event instead
            // of just logging once that policy is settled.
            tracing::warn!(%job_id, error = %e, "plugin notify_all failed");
        }

        if let Some(new_state) = new_state_opt {
            if let Err(e) = self.collabs.notify_state(job_id, entry, prev_state, new_state) {
                tracing::warn!(%job_id, error = %e, "plugin notify_state failed");
            }
            tracing::info!(%job_id, from = %prev_state, to = %new_state, "state transition");
        }

        if matches!(kind, EventKind::Urgency) {
            let urgency = self.job(job_id).map(|j| j.urgency).unwrap_or(0);
            match self.collabs.reprioritize(job_id, urgency) {
                Ok(Some(new_priority)) => {
                    let mut inner = self.inner.lock();
                    if let Some(job) = inner.jobs.get_mut(&job_id) {
                        job.priority = new_priority;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(%job_id, error = %e, "plugin reprioritize failed"),
            }
        }

        // Step 12: action dispatch.
        let effects = match self.job(job_id) {
            Some(job) => dispatch_action(job.state, &job),
            None => return Ok(()),
        };

        for effect in effects {
            self.execute_effect(job_id, effect)?;
        }

        Ok(())
    }

    fn execute_effect(&self, job_id: JobId, effect: Effect) -> Result<(), CoreError> {
        match effect {
            Effect::DequeueAlloc(id) => {
                self.collabs.dequeue_alloc(id);
                self.with_job(id, |job| {
                    job.outstanding.set_alloc_queued(false);
                    job.outstanding.set_alloc_pending(false);
                });
            }
            Effect::EnqueueAlloc(id) => {
                self.collabs.enqueue_alloc(id);
                self.with_job(id, |job| job.outstanding.set_alloc_queued(true));
            }
            Effect::RecalcPending(id) => {
                self.collabs.recalc_pending(id);
            }
            Effect::SendStart(id) => match self.collabs.send_start(id) {
                Ok(()) => self.with_job(id, |job| job.outstanding.set_start_pending(true)),
                Err(e) => return Err(CoreError::Downstream(e.to_string())),
            },
            Effect::SendFree(id) => match self.collabs.send_free(id) {
                Ok(()) => self.with_job(id, |job| job.outstanding.set_free_pending(true)),
                Err(e) => return Err(CoreError::Downstream(e.to_string())),
            },
            Effect::PostDepend(id) => {
                self.with_job(id, |job| job.depend_posted = true);
                self.post_event_at(id, "depend", PostFlags::none(), None, None)?;
            }
            Effect::PostClean(id) => {
                self.post_event_at(id, "clean", PostFlags::none(), None, None)?;
            }
            Effect::NotifyWait(id) => self.collabs.notify(id),
            Effect::RemoveFromIndex(id) => self.try_evict(id),
            Effect::InformDrain(id) => self.collabs.inform(id),
        }
        Ok(())
    }

    fn with_job(&self, job_id: JobId, f: impl FnOnce(&mut Job)) {
        let mut inner = self.inner.lock();
        if let Some(job) = inner.jobs.get_mut(&job_id) {
            f(job);
        }
    }

    /// Attempts the eviction the `INACTIVE` action calls for. A no-op
    /// while the pipeline's own step-10 reference is still held; the
    /// actual removal happens at step 13 once refcount reaches zero.
    fn try_evict(&self, job_id: JobId) {
        let mut inner = self.inner.lock();
        if let Some(job) = inner.jobs.get(&job_id) {
            if job.refcount == 0 && job.state == JobState::Inactive {
                inner.jobs.remove(&job_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
