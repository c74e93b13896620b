// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::EventEntry;

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::job::JobState;
    use proptest::prelude::*;

    pub fn arb_job_state() -> impl Strategy<Value = JobState> {
        prop_oneof![
            Just(JobState::New),
            Just(JobState::Depend),
            Just(JobState::Priority),
            Just(JobState::Sched),
            Just(JobState::Run),
            Just(JobState::Cleanup),
            Just(JobState::Inactive),
        ]
    }

    pub fn arb_event_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("submit".to_string()),
            Just("dependency-add".to_string()),
            Just("dependency-remove".to_string()),
            Just("set-flags".to_string()),
            Just("memo".to_string()),
            Just("depend".to_string()),
            Just("priority".to_string()),
            Just("urgency".to_string()),
            Just("exception".to_string()),
            Just("alloc".to_string()),
            Just("free".to_string()),
            Just("finish".to_string()),
            Just("release".to_string()),
            Just("clean".to_string()),
            Just("prolog-start".to_string()),
            Just("prolog-finish".to_string()),
            Just("epilog-start".to_string()),
            Just("epilog-finish".to_string()),
            Just("flux-restart".to_string()),
            "[a-z-]{1,16}",
        ]
    }
}

/// Build an [`EventEntry`] with no context, for tests that don't care
/// about the payload.
pub fn event(timestamp: f64, name: &str) -> EventEntry {
    EventEntry::new(timestamp, name, None)
}

/// Build an [`EventEntry`] carrying a single string-valued context key.
pub fn event_with_context(timestamp: f64, name: &str, key: &str, value: &str) -> EventEntry {
    let mut context = serde_json::Map::new();
    context.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    EventEntry::new(timestamp, name, Some(context))
}
