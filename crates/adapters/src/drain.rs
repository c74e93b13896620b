// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The drain collaborator (spec.md §4.3 `INACTIVE` action): informed when
//! a job leaves the active set, used upstream to track drain completion.

use jobcore::JobId;

pub trait Drain: Send + Sync + 'static {
    fn inform(&self, job_id: JobId);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDrain;

impl Drain for NoopDrain {
    fn inform(&self, _job_id: JobId) {}
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Drain;
    use jobcore::JobId;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeDrain {
        informed: Arc<Mutex<Vec<JobId>>>,
    }

    impl FakeDrain {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn informed(&self) -> Vec<JobId> {
            self.informed.lock().clone()
        }
    }

    impl Drain for FakeDrain {
        fn inform(&self, job_id: JobId) {
            self.informed.lock().push(job_id);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDrain;
