// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shell-launch (`start`) collaborator (spec.md §1, §4.3 `RUN` action):
//! sends start/free requests, out of scope beyond this contract.

use jobcore::JobId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("exec request failed: {0}")]
    RequestFailed(String),
}

pub trait Exec: Send + Sync + 'static {
    /// `RUN` action: send the start request once no prolog/epilog is active.
    fn send_start(&self, job_id: JobId) -> Result<(), ExecError>;
    /// `CLEANUP` action: send the free request once nothing else is pending.
    fn send_free(&self, job_id: JobId) -> Result<(), ExecError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExec;

impl Exec for NoopExec {
    fn send_start(&self, _job_id: JobId) -> Result<(), ExecError> {
        Ok(())
    }
    fn send_free(&self, _job_id: JobId) -> Result<(), ExecError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Exec, ExecError};
    use jobcore::JobId;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ExecCall {
        Start(JobId),
        Free(JobId),
    }

    #[derive(Clone, Default)]
    pub struct FakeExec {
        calls: Arc<Mutex<Vec<ExecCall>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl FakeExec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<ExecCall> {
            self.calls.lock().clone()
        }

        pub fn set_failing(&self, failing: bool) {
            *self.fail.lock() = failing;
        }
    }

    impl Exec for FakeExec {
        fn send_start(&self, job_id: JobId) -> Result<(), ExecError> {
            if *self.fail.lock() {
                return Err(ExecError::RequestFailed("fake exec configured to fail".into()));
            }
            self.calls.lock().push(ExecCall::Start(job_id));
            Ok(())
        }

        fn send_free(&self, job_id: JobId) -> Result<(), ExecError> {
            if *self.fail.lock() {
                return Err(ExecError::RequestFailed("fake exec configured to fail".into()));
            }
            self.calls.lock().push(ExecCall::Free(job_id));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecCall, FakeExec};
