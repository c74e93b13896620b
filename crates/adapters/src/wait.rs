// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wait collaborator (spec.md §4.3 `INACTIVE` action): notified when a
//! job carrying `WAITABLE` reaches `INACTIVE`, so a blocked `wait` caller
//! upstream can be released.

use jobcore::JobId;

pub trait Wait: Send + Sync + 'static {
    fn notify(&self, job_id: JobId);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWait;

impl Wait for NoopWait {
    fn notify(&self, _job_id: JobId) {}
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Wait;
    use jobcore::JobId;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeWait {
        notified: Arc<Mutex<Vec<JobId>>>,
    }

    impl FakeWait {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notified(&self) -> Vec<JobId> {
            self.notified.lock().clone()
        }
    }

    impl Wait for FakeWait {
        fn notify(&self, job_id: JobId) {
            self.notified.lock().push(job_id);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWait;
