//! Progress model - which tutorial is active and how far along it is.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use crate::id::{StepId, TutorialId};
use crate::Time;

/// Canonical progress state. One instance per session, owned by the
/// progress store and persisted as the `tutorial_progress` record.
///
/// `paused_time` is only set while a tutorial is active; `current_step_index`
/// is `0` whenever no tutorial is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressState {
    /// Tutorials the user has finished
    pub completed_tutorials: BTreeSet<TutorialId>,

    /// Active tutorial, if any
    pub current_tutorial_id: Option<TutorialId>,

    /// Index of the active step
    pub current_step_index: usize,

    /// When the active tutorial was started
    pub start_time: Option<Time>,

    /// When the active tutorial was paused (set iff paused)
    pub paused_time: Option<Time>,

    /// Steps the user skipped, in skip order without duplicates
    pub skipped_steps: Vec<StepId>,

    /// Steps skipped in the active tutorial
    pub current_skipped_steps: Vec<StepId>,

    /// Attempts per step of the active tutorial
    #[serde(with = "crate::assoc")]
    pub step_attempts: BTreeMap<StepId, u32>,

    /// Whether the active tutorial is a guided tour
    pub guided_tour: bool,
}

impl ProgressState {
    /// Whether a tutorial is active.
    pub fn is_active(&self) -> bool {
        self.current_tutorial_id.is_some()
    }

    /// Whether the active tutorial is paused.
    pub fn is_paused(&self) -> bool {
        self.paused_time.is_some()
    }

    /// Drop everything about the active tutorial.
    pub fn clear_current(&mut self) {
        self.current_tutorial_id = None;
        self.current_step_index = 0;
        self.start_time = None;
        self.paused_time = None;
        self.step_attempts.clear();
        self.current_skipped_steps.clear();
        self.guided_tour = false;
    }
}

/// Read-only view of progress handed to the orchestrator and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Completed tutorials
    pub completed_tutorials: Vec<TutorialId>,

    /// Active tutorial
    pub current_tutorial_id: Option<TutorialId>,

    /// Active step index
    pub current_step: usize,

    /// Whether paused
    pub paused: bool,

    /// Skipped steps
    pub skipped_steps: Vec<StepId>,
}

/// Denormalized per-tour record, written while a guided tour is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourSnapshot {
    /// Tour identifier
    pub tour_id: TutorialId,

    /// Step the user is on
    pub current_step: usize,

    /// Indices of the steps already passed
    pub steps_completed: Vec<usize>,

    /// Steps skipped during the tour
    pub steps_skipped: Vec<StepId>,

    /// Attempts per step
    #[serde(with = "crate::assoc")]
    pub step_attempts: BTreeMap<StepId, u32>,

    /// When the snapshot was written
    pub updated_at: Time,
}

impl TourSnapshot {
    /// Build a snapshot of the active tour from progress state.
    pub fn from_state(tour_id: TutorialId, state: &ProgressState, now: Time) -> Self {
        Self {
            tour_id,
            current_step: state.current_step_index,
            steps_completed: (0..state.current_step_index).collect(),
            steps_skipped: state.current_skipped_steps.clone(),
            step_attempts: state.step_attempts.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_current_keeps_completed() {
        let mut state = ProgressState::default();
        state.completed_tutorials.insert(TutorialId::new("basic"));
        state.current_tutorial_id = Some(TutorialId::new("advanced"));
        state.current_step_index = 3;
        state.paused_time = Some(chrono::Utc::now());
        state.skipped_steps.push(StepId::new("intro"));
        state.current_skipped_steps.push(StepId::new("intro"));

        state.clear_current();

        assert!(!state.is_active());
        assert!(!state.is_paused());
        assert_eq!(state.current_step_index, 0);
        assert!(state.completed_tutorials.contains(&TutorialId::new("basic")));
        assert_eq!(state.skipped_steps, vec![StepId::new("intro")]);
        assert!(state.current_skipped_steps.is_empty());
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let state: ProgressState =
            serde_json::from_str(r#"{"completed_tutorials": ["basic"]}"#).unwrap();
        assert_eq!(state.completed_tutorials.len(), 1);
        assert!(state.current_tutorial_id.is_none());
    }

    #[test]
    fn test_tour_snapshot_marks_passed_steps() {
        let mut state = ProgressState::default();
        state.current_step_index = 2;
        state.current_skipped_steps.push(StepId::new("intro"));
        let snapshot = TourSnapshot::from_state(TutorialId::new("tour"), &state, chrono::Utc::now());
        assert_eq!(snapshot.steps_completed, vec![0, 1]);
        assert_eq!(snapshot.steps_skipped, vec![StepId::new("intro")]);
    }
}
