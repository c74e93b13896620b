// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler (`alloc`) collaborator (spec.md §1, §4.3): resource
//! allocation request queueing, out of scope beyond this contract.

use jobcore::JobId;

pub trait Scheduler: Send + Sync + 'static {
    /// `SCHED` action: enqueue a resource allocation request for `job_id`.
    fn enqueue_alloc(&self, job_id: JobId);
    /// `PRIORITY`/`CLEANUP` actions: cancel or dequeue any stale request.
    fn dequeue_alloc(&self, job_id: JobId);
    /// `SCHED` action: ask the scheduler to recompute pending allocations.
    fn recalc_pending(&self, job_id: JobId);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn enqueue_alloc(&self, _job_id: JobId) {}
    fn dequeue_alloc(&self, _job_id: JobId) {}
    fn recalc_pending(&self, _job_id: JobId) {}
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Scheduler;
    use jobcore::JobId;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SchedulerCall {
        EnqueueAlloc(JobId),
        DequeueAlloc(JobId),
        RecalcPending(JobId),
    }

    #[derive(Clone, Default)]
    pub struct FakeScheduler {
        calls: Arc<Mutex<Vec<SchedulerCall>>>,
    }

    impl FakeScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<SchedulerCall> {
            self.calls.lock().clone()
        }
    }

    impl Scheduler for FakeScheduler {
        fn enqueue_alloc(&self, job_id: JobId) {
            self.calls.lock().push(SchedulerCall::EnqueueAlloc(job_id));
        }
        fn dequeue_alloc(&self, job_id: JobId) {
            self.calls.lock().push(SchedulerCall::DequeueAlloc(job_id));
        }
        fn recalc_pending(&self, job_id: JobId) {
            self.calls.lock().push(SchedulerCall::RecalcPending(job_id));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeScheduler, SchedulerCall};
