// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The journal collaborator (spec.md §4.3 step 3): a hook fired before
//! commit, handed the entry and the sequence it will be assigned (`-1`
//! when `NO_COMMIT` and not `FORCE_SEQUENCE`).

use jobcore::EventEntry;

/// Called synchronously from the reactor thread; never fails (a journal
/// is diagnostic, not authoritative -- the KVS is the source of truth).
pub trait Journal: Send + Sync + 'static {
    fn record(&self, entry: &EventEntry, assigned_seq: i64);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopJournal;

impl Journal for NoopJournal {
    fn record(&self, _entry: &EventEntry, _assigned_seq: i64) {}
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Journal;
    use jobcore::EventEntry;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub struct JournalRecord {
        pub name: String,
        pub assigned_seq: i64,
    }

    #[derive(Clone, Default)]
    pub struct FakeJournal {
        records: Arc<Mutex<Vec<JournalRecord>>>,
    }

    impl FakeJournal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn records(&self) -> Vec<JournalRecord> {
            self.records.lock().clone()
        }
    }

    impl Journal for FakeJournal {
        fn record(&self, entry: &EventEntry, assigned_seq: i64) {
            self.records
                .lock()
                .push(JournalRecord { name: entry.name.clone(), assigned_seq });
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJournal, JournalRecord};
