// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event name index (EVX): stable small integer ids for event names.
//!
//! Ids are assigned in insertion order starting at 1 and are never reused
//! or renumbered, so a process-lifetime id can be cached by a caller (e.g.
//! `Job::last_event_id_map`) without fear of it pointing at a different
//! name later.

use std::collections::HashMap;

use crate::errors::CoreError;

/// Maps event names to stable small integer ids.
#[derive(Debug, Default)]
pub struct EventIndex {
    by_name: HashMap<String, i32>,
    by_id: Vec<String>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the id for `name`, assigning the next id if this is the
    /// first time `name` has been seen.
    pub fn index(&mut self, name: &str) -> Result<i32, CoreError> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(*id);
        }
        let id = self.by_id.len() as i32 + 1;
        if id == i32::MAX {
            return Err(CoreError::ResourceExhausted("event index exhausted".into()));
        }
        self.by_name.insert(name.to_string(), id);
        self.by_id.push(name.to_string());
        tracing::trace!(name, id, "event name indexed");
        Ok(id)
    }

    /// Reverse lookup: the name assigned to `id`, if any.
    pub fn name_of(&self, id: i32) -> Option<&str> {
        let idx = usize::try_from(id).ok()?.checked_sub(1)?;
        self.by_id.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
