// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a job. Immutable for the job's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner_value() {
        assert_eq!(JobId::new(42).to_string(), "42");
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(JobId::new(1), JobId::new(1));
        assert_ne!(JobId::new(1), JobId::new(2));
    }

    #[test]
    fn serde_roundtrip_is_bare_integer() {
        let id = JobId::new(7);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "7");
        let back: JobId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
