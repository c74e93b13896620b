// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plugin hook system (`jobtap`, spec.md §1, §4.3 step 11): only the
//! event-points the core emits into it are specified here. The core
//! always notifies "all subscribers"; additionally invokes the
//! state-topic callback on a state change, and asks for a reprioritize
//! decision on `urgency` events.

use jobcore::{EventEntry, JobId, JobState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin callback failed: {0}")]
    CallbackFailed(String),
}

pub trait Plugins: Send + Sync + 'static {
    /// Notify every subscriber of every posted event, unconditionally.
    fn notify_all(&self, job_id: JobId, entry: &EventEntry) -> Result<(), PluginError>;

    /// Invoked only when the event changed the job's state.
    fn notify_state(
        &self,
        job_id: JobId,
        entry: &EventEntry,
        prev_state: JobState,
        new_state: JobState,
    ) -> Result<(), PluginError>;

    /// Invoked on `urgency` events: ask for a new priority. `Ok(None)`
    /// means no change.
    fn reprioritize(&self, job_id: JobId, urgency: i32) -> Result<Option<i64>, PluginError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlugins;

impl Plugins for NoopPlugins {
    fn notify_all(&self, _job_id: JobId, _entry: &EventEntry) -> Result<(), PluginError> {
        Ok(())
    }

    fn notify_state(
        &self,
        _job_id: JobId,
        _entry: &EventEntry,
        _prev_state: JobState,
        _new_state: JobState,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    fn reprioritize(&self, _job_id: JobId, _urgency: i32) -> Result<Option<i64>, PluginError> {
        Ok(None)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum PluginCall {
        NotifyAll { job_id: JobId, event_name: String },
        NotifyState { job_id: JobId, prev_state: JobState, new_state: JobState },
        Reprioritize { job_id: JobId, urgency: i32 },
    }

    #[derive(Default)]
    struct FakeState {
        calls: Vec<PluginCall>,
        notify_all_fails: bool,
        reprioritize_result: Option<i64>,
    }

    /// Records every hook invocation. `reprioritize` returns
    /// `reprioritize_result` (settable via [`FakePlugins::set_reprioritize_result`]).
    #[derive(Clone, Default)]
    pub struct FakePlugins {
        inner: Arc<Mutex<FakeState>>,
    }

    impl FakePlugins {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<PluginCall> {
            self.inner.lock().calls.clone()
        }

        pub fn set_notify_all_fails(&self, fails: bool) {
            self.inner.lock().notify_all_fails = fails;
        }

        pub fn set_reprioritize_result(&self, result: Option<i64>) {
            self.inner.lock().reprioritize_result = result;
        }
    }

    impl Plugins for FakePlugins {
        fn notify_all(&self, job_id: JobId, entry: &EventEntry) -> Result<(), PluginError> {
            let mut state = self.inner.lock();
            if state.notify_all_fails {
                return Err(PluginError::CallbackFailed("fake plugin configured to fail".into()));
            }
            state.calls.push(PluginCall::NotifyAll { job_id, event_name: entry.name.clone() });
            Ok(())
        }

        fn notify_state(
            &self,
            job_id: JobId,
            _entry: &EventEntry,
            prev_state: JobState,
            new_state: JobState,
        ) -> Result<(), PluginError> {
            self.inner.lock().calls.push(PluginCall::NotifyState { job_id, prev_state, new_state });
            Ok(())
        }

        fn reprioritize(&self, job_id: JobId, urgency: i32) -> Result<Option<i64>, PluginError> {
            let mut state = self.inner.lock();
            state.calls.push(PluginCall::Reprioritize { job_id, urgency });
            Ok(state.reprioritize_result)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePlugins, PluginCall};
