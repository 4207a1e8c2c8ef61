//! Tutorial events emitted to the host's event bus.

use serde::{Deserialize, Serialize};
use crate::id::{StepId, TutorialId};

/// Something that happened during a tutorial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TutorialEvent {
    /// A tutorial was started
    TutorialStarted {
        /// Tutorial concerned
        tutorial_id: TutorialId,
    },

    /// A step's criterion was not met
    TutorialValidationError {
        /// Tutorial concerned
        tutorial_id: TutorialId,
        /// Step concerned
        step_id: StepId,
        /// Message shown to the user
        error: String,
    },

    /// A step's timer fired before the user acted
    TutorialStepTimeout {
        /// Tutorial concerned
        tutorial_id: TutorialId,
        /// Step concerned
        step_id: StepId,
        /// Index of the step that timed out
        step_index: usize,
    },

    /// A step was passed
    TutorialStepCompleted {
        /// Tutorial concerned
        tutorial_id: TutorialId,
        /// Step concerned
        step_id: StepId,
        /// Time spent on the step
        duration_ms: u64,
    },

    /// A step was skipped
    TutorialStepSkipped {
        /// Tutorial concerned
        tutorial_id: TutorialId,
        /// Step concerned
        step_id: StepId,
    },

    /// A tutorial was finished
    TutorialCompleted {
        /// Tutorial concerned
        tutorial_id: TutorialId,
    },

    /// A tutorial was abandoned via skip
    TutorialSkipped {
        /// Tutorial concerned
        tutorial_id: TutorialId,
    },
}

impl TutorialEvent {
    /// Event name on the bus.
    pub fn name(&self) -> &'static str {
        match self {
            TutorialEvent::TutorialStarted { .. } => "tutorial_started",
            TutorialEvent::TutorialValidationError { .. } => "tutorial_validation_error",
            TutorialEvent::TutorialStepTimeout { .. } => "tutorial_step_timeout",
            TutorialEvent::TutorialStepCompleted { .. } => "tutorial_step_completed",
            TutorialEvent::TutorialStepSkipped { .. } => "tutorial_step_skipped",
            TutorialEvent::TutorialCompleted { .. } => "tutorial_completed",
            TutorialEvent::TutorialSkipped { .. } => "tutorial_skipped",
        }
    }

    /// Tutorial the event belongs to.
    pub fn tutorial_id(&self) -> &TutorialId {
        match self {
            TutorialEvent::TutorialStarted { tutorial_id }
            | TutorialEvent::TutorialValidationError { tutorial_id, .. }
            | TutorialEvent::TutorialStepTimeout { tutorial_id, .. }
            | TutorialEvent::TutorialStepCompleted { tutorial_id, .. }
            | TutorialEvent::TutorialStepSkipped { tutorial_id, .. }
            | TutorialEvent::TutorialCompleted { tutorial_id }
            | TutorialEvent::TutorialSkipped { tutorial_id } => tutorial_id,
        }
    }
}
