// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event codec (EC): the on-the-wire and on-disk representation of a
//! posted event, and the closed set of event kinds the state machine
//! recognizes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;

/// A single posted event, as it appears one-per-line in the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub timestamp: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl EventEntry {
    pub fn new(timestamp: f64, name: impl Into<String>, context: Option<Map<String, Value>>) -> Self {
        Self { timestamp, name: name.into(), context }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.timestamp < 0.0 || !self.timestamp.is_finite() {
            return Err(CoreError::Malformed(format!("negative or non-finite timestamp: {}", self.timestamp)));
        }
        if self.name.is_empty() || !self.name.is_ascii() {
            return Err(CoreError::Malformed(format!("empty or non-ASCII event name: {:?}", self.name)));
        }
        Ok(())
    }
}

/// Encode an entry as one line of JSON, newline-terminated.
pub fn encode(entry: &EventEntry) -> Result<Vec<u8>, CoreError> {
    entry.validate()?;
    let mut buf = serde_json::to_vec(entry)
        .map_err(|e| CoreError::Malformed(format!("encode failure: {e}")))?;
    buf.push(b'\n');
    Ok(buf)
}

/// Parse one line (trailing newline optional) into an [`EventEntry`].
pub fn parse(line: &[u8]) -> Result<EventEntry, CoreError> {
    let trimmed = line.strip_suffix(b"\n").unwrap_or(line);
    let entry: EventEntry = serde_json::from_slice(trimmed)
        .map_err(|e| CoreError::Malformed(format!("parse failure: {e}")))?;
    entry.validate()?;
    Ok(entry)
}

/// The closed set of event names the state machine assigns meaning to
/// (spec.md §4.3 transition table), plus a catch-all for everything else.
///
/// Unrecognized events are still committed to the log and indexed by
/// [`crate::evx::EventIndex`]; they just never drive a transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Submit,
    DependencyAdd,
    DependencyRemove,
    SetFlags,
    Memo,
    Depend,
    Priority,
    Urgency,
    Exception,
    Alloc,
    Free,
    Finish,
    Release,
    Clean,
    PrologStart,
    PrologFinish,
    EpilogStart,
    EpilogFinish,
    FluxRestart,
    Other(String),
}

impl EventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "submit" => Self::Submit,
            "dependency-add" => Self::DependencyAdd,
            "dependency-remove" => Self::DependencyRemove,
            "set-flags" => Self::SetFlags,
            "memo" => Self::Memo,
            "depend" => Self::Depend,
            "priority" => Self::Priority,
            "urgency" => Self::Urgency,
            "exception" => Self::Exception,
            "alloc" => Self::Alloc,
            "free" => Self::Free,
            "finish" => Self::Finish,
            "release" => Self::Release,
            "clean" => Self::Clean,
            "prolog-start" => Self::PrologStart,
            "prolog-finish" => Self::PrologFinish,
            "epilog-start" => Self::EpilogStart,
            "epilog-finish" => Self::EpilogFinish,
            "flux-restart" => Self::FluxRestart,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Submit => "submit",
            Self::DependencyAdd => "dependency-add",
            Self::DependencyRemove => "dependency-remove",
            Self::SetFlags => "set-flags",
            Self::Memo => "memo",
            Self::Depend => "depend",
            Self::Priority => "priority",
            Self::Urgency => "urgency",
            Self::Exception => "exception",
            Self::Alloc => "alloc",
            Self::Free => "free",
            Self::Finish => "finish",
            Self::Release => "release",
            Self::Clean => "clean",
            Self::PrologStart => "prolog-start",
            Self::PrologFinish => "prolog-finish",
            Self::EpilogStart => "epilog-start",
            Self::EpilogFinish => "epilog-finish",
            Self::FluxRestart => "flux-restart",
            Self::Other(name) => name,
        }
    }
}

/// Flags recognized by `post_event` (spec.md §4.4).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFlags(pub u32);

impl PostFlags {
    pub const NONE: u32 = 0;
    /// Do not append to the KVS; do not advance `eventlog_seq`.
    pub const NO_COMMIT: u32 = 1 << 0;
    /// Consume a sequence number even when combined with `NO_COMMIT`.
    pub const FORCE_SEQUENCE: u32 = 1 << 1;

    pub fn none() -> Self {
        Self(Self::NONE)
    }

    pub fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn no_commit(self) -> bool {
        self.has(Self::NO_COMMIT)
    }

    pub fn force_sequence(self) -> bool {
        self.has(Self::FORCE_SEQUENCE)
    }
}
