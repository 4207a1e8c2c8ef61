//! Statistics model - per-step timing and attempt counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::id::{StepKey, TutorialId};
use crate::Time;

/// Canonical statistics state, persisted as the `tutorial_stats` record.
///
/// An average for a key is only meaningful once its attempt count is
/// above zero. Counters never decrease except through an explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsState {
    /// Accumulated step time, in milliseconds
    pub total_time: u64,

    /// Blended step duration per step key, in milliseconds
    #[serde(with = "crate::assoc")]
    pub step_average_times: BTreeMap<StepKey, f64>,

    /// Skips per step key
    #[serde(with = "crate::assoc")]
    pub step_skip_counts: BTreeMap<StepKey, u32>,

    /// Failures per step key
    #[serde(with = "crate::assoc")]
    pub step_failure_counts: BTreeMap<StepKey, u32>,

    /// Attempts per step key
    #[serde(with = "crate::assoc")]
    pub step_attempt_counts: BTreeMap<StepKey, u32>,

    /// Tutorial-level attempt counters
    #[serde(with = "crate::assoc")]
    pub tutorial_attempts: BTreeMap<TutorialId, TutorialAttempts>,

    /// Last time any counter changed
    pub last_updated: Option<Time>,
}

impl StatsState {
    /// Attempts recorded for a step key.
    pub fn attempts(&self, key: &StepKey) -> u32 {
        self.step_attempt_counts.get(key).copied().unwrap_or(0)
    }

    /// Failures recorded for a step key.
    pub fn failures(&self, key: &StepKey) -> u32 {
        self.step_failure_counts.get(key).copied().unwrap_or(0)
    }

    /// Skips recorded for a step key.
    pub fn skips(&self, key: &StepKey) -> u32 {
        self.step_skip_counts.get(key).copied().unwrap_or(0)
    }

    /// Blended duration for a step key.
    pub fn average_time(&self, key: &StepKey) -> Option<f64> {
        self.step_average_times.get(key).copied()
    }
}

/// Coarse tutorial-level action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorialAction {
    /// Tutorial entered
    Start,
    /// Last step passed
    Complete,
    /// Abandoned via skip
    Skip,
    /// Ended in failure
    Fail,
}

impl TutorialAction {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TutorialAction::Start => "start",
            TutorialAction::Complete => "complete",
            TutorialAction::Skip => "skip",
            TutorialAction::Fail => "fail",
        }
    }
}

/// Tutorial-level counters, independent of the step counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialAttempts {
    /// Times started
    pub start: u32,

    /// Times completed
    pub complete: u32,

    /// Times skipped
    pub skip: u32,

    /// Times failed
    pub fail: u32,

    /// Metadata of the most recent attempt
    pub last_metadata: Option<serde_json::Value>,

    /// When the most recent attempt happened
    pub last_attempt_at: Option<Time>,
}

impl TutorialAttempts {
    /// Count one action.
    pub fn record(&mut self, action: TutorialAction, metadata: Option<serde_json::Value>, at: Time) {
        match action {
            TutorialAction::Start => self.start += 1,
            TutorialAction::Complete => self.complete += 1,
            TutorialAction::Skip => self.skip += 1,
            TutorialAction::Fail => self.fail += 1,
        }
        self.last_metadata = metadata;
        self.last_attempt_at = Some(at);
    }

    /// Count for one action.
    pub fn count(&self, action: TutorialAction) -> u32 {
        match action {
            TutorialAction::Start => self.start,
            TutorialAction::Complete => self.complete,
            TutorialAction::Skip => self.skip,
            TutorialAction::Fail => self.fail,
        }
    }
}
