// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The key-value store (KVS): the external transactional append store
//! addressed by `(JobId, "eventlog")` (spec.md §3, §6). Only the contract
//! is modeled here; the real KVS is out of scope.

use async_trait::async_trait;
use jobcore::{EventEntry, JobId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvsError {
    #[error("transactional append failed: {0}")]
    AppendFailed(String),
}

/// One entry queued for durable append, keyed by the job it belongs to.
#[derive(Debug, Clone)]
pub struct KvsAppend {
    pub job_id: JobId,
    pub entry: EventEntry,
}

/// Transactional append store. `append_tx` commits every entry in the
/// batch atomically and returns nothing beyond success/failure — sequence
/// assignment happens in the engine before the batch is handed here
/// (spec.md §4.2: the batch already carries the assigned sequence numbers
/// in its transition records).
#[async_trait]
pub trait Kvs: Send + Sync + 'static {
    async fn append_tx(&self, batch: Vec<KvsAppend>) -> Result<(), KvsError>;
}

/// Discards every append. Useful for wiring a reactor that doesn't care
/// about durability (e.g. throwaway scripts, smoke tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopKvs;

#[async_trait]
impl Kvs for NoopKvs {
    async fn append_tx(&self, _batch: Vec<KvsAppend>) -> Result<(), KvsError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Kvs, KvsAppend, KvsError};
    use async_trait::async_trait;
    use jobcore::JobId;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct FakeKvsState {
        log: HashMap<JobId, Vec<jobcore::EventEntry>>,
        commits: Vec<Vec<KvsAppend>>,
    }

    /// Records every committed batch in memory, and optionally mirrors
    /// each append to a per-job JSONL file on disk (one line per entry,
    /// matching the [`jobcore::event::encode`] wire format) so tests can
    /// exercise on-disk durability without a real KVS.
    #[derive(Clone)]
    pub struct FakeKvs {
        state: Arc<Mutex<FakeKvsState>>,
        dir: Option<PathBuf>,
        /// When set, `append_tx` fails every call -- exercises `CommitFailed`.
        fail: Arc<Mutex<bool>>,
    }

    impl Default for FakeKvs {
        fn default() -> Self {
            Self::in_memory()
        }
    }

    impl FakeKvs {
        pub fn in_memory() -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeKvsState { log: HashMap::new(), commits: Vec::new() })),
                dir: None,
                fail: Arc::new(Mutex::new(false)),
            }
        }

        /// Mirror every committed append to `<dir>/<job_id>.eventlog`.
        pub fn on_disk(dir: impl AsRef<Path>) -> Self {
            let mut fake = Self::in_memory();
            fake.dir = Some(dir.as_ref().to_path_buf());
            fake
        }

        /// Make every subsequent `append_tx` call return `AppendFailed`.
        pub fn set_failing(&self, failing: bool) {
            *self.fail.lock() = failing;
        }

        pub fn committed_batches(&self) -> usize {
            self.state.lock().commits.len()
        }

        pub fn entries_for(&self, job_id: JobId) -> Vec<jobcore::EventEntry> {
            self.state.lock().log.get(&job_id).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl Kvs for FakeKvs {
        async fn append_tx(&self, batch: Vec<KvsAppend>) -> Result<(), KvsError> {
            if *self.fail.lock() {
                return Err(KvsError::AppendFailed("fake KVS configured to fail".into()));
            }
            let mut state = self.state.lock();
            for append in &batch {
                if let Some(dir) = &self.dir {
                    let path = dir.join(format!("{}.eventlog", append.job_id));
                    let line = jobcore::event::encode(&append.entry)
                        .map_err(|e| KvsError::AppendFailed(e.to_string()))?;
                    let mut file = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&path)
                        .map_err(|e| KvsError::AppendFailed(e.to_string()))?;
                    file.write_all(&line).map_err(|e| KvsError::AppendFailed(e.to_string()))?;
                }
                state.log.entry(append.job_id).or_default().push(append.entry.clone());
            }
            state.commits.push(batch);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeKvs;

#[cfg(test)]
#[path = "kvs_tests.rs"]
mod tests;
