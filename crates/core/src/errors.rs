// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the job-manager event engine (spec.md §7).

use thiserror::Error;

/// Errors produced by the core engine.
///
/// `CommitFailed` and `PubFailed` are fatal: the durability and
/// notification contract of the whole job manager rests on them, so the
/// reactor must stop rather than let observers desynchronize from the
/// source of truth. See [`CoreError::is_fatal`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("malformed event: {0}")]
    Malformed(String),

    #[error("job not yet submitted")]
    TryAgain,

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("commit failed: {0}")]
    CommitFailed(String),

    #[error("pub failed: {0}")]
    PubFailed(String),

    #[error("downstream collaborator error: {0}")]
    Downstream(String),
}

impl CoreError {
    /// Fatal errors stop the reactor (spec.md §7); the rest are returned to
    /// the caller as ordinary operation failures.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::CommitFailed(_) | CoreError::PubFailed(_))
    }
}
