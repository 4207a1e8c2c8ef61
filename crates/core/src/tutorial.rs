//! Tutorial content model - tutorials, steps and action types.
//!
//! Definitions are authored content: loaded once, then shared immutably
//! (behind `Arc`) with every component that needs them.

use serde::{Deserialize, Serialize};
use crate::id::{StepId, TutorialId};
use crate::validation::{names, ValidatorName};

/// Difficulty tag of a tutorial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// First contact with the game
    #[default]
    Beginner,
    /// Assumes the basics
    Intermediate,
    /// Mastery content
    Advanced,
}

/// Variant of a tutorial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorialKind {
    /// Plain tutorial.
    #[default]
    Standard,
    /// Step-indexed tour with denormalized per-step persistence.
    GuidedTour,
}

/// A tutorial: an ordered sequence of steps teaching one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialDefinition {
    /// Unique identifier
    pub id: TutorialId,

    /// Display title
    pub title: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<StepDefinition>,

    /// Tutorials that must be completed first
    #[serde(default)]
    pub prerequisites: Vec<TutorialId>,

    /// Difficulty tag
    #[serde(default)]
    pub difficulty: Option<Difficulty>,

    /// Authored estimate of the whole tutorial, in milliseconds
    #[serde(default)]
    pub estimated_time: Option<u64>,

    /// Tutorial variant
    #[serde(default, rename = "tourType")]
    pub kind: TutorialKind,
}

impl TutorialDefinition {
    /// Create an empty standard tutorial.
    pub fn new(id: impl Into<TutorialId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            steps: Vec::new(),
            prerequisites: Vec::new(),
            difficulty: None,
            estimated_time: None,
            kind: TutorialKind::Standard,
        }
    }

    /// Append a step.
    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Add a prerequisite tutorial.
    pub fn with_prerequisite(mut self, id: impl Into<TutorialId>) -> Self {
        self.prerequisites.push(id.into());
        self
    }

    /// Tag this tutorial as a guided tour.
    pub fn into_guided_tour(mut self) -> Self {
        self.kind = TutorialKind::GuidedTour;
        self
    }

    /// Whether this is the guided-tour variant.
    pub fn is_guided_tour(&self) -> bool {
        self.kind == TutorialKind::GuidedTour
    }

    /// Number of steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step at `index`, if in range.
    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }
}

/// The action a step asks the user to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAction {
    /// Action type
    #[serde(rename = "type")]
    pub action_type: ActionType,
}

/// Closed set of step action types.
///
/// Each variant owns its default validator and the event the orchestrator
/// waits for. Content naming any other type deserializes to `Unrecognized`,
/// which has no default validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Pop a given bubble
    ClickBubble,
    /// Drag a bubble far enough
    DragBubble,
    /// Pop a bubble of a special type
    PopSpecialBubble,
    /// Build up a combo
    AchieveCombo,
    /// Open a scene
    NavigateScene,
    /// Reach a score
    ReachScore,
    /// Change a game setting
    ChangeSetting,
    /// Any type this build does not know
    #[serde(other)]
    Unrecognized,
}

/// Event waited for when neither the step nor its action names one.
pub const DEFAULT_WAIT_EVENT: &str = "user_action";

impl ActionType {
    /// Validator used when the step does not name one.
    pub fn default_validator(self) -> Option<ValidatorName> {
        let name = match self {
            ActionType::ClickBubble => names::POP_BUBBLE,
            ActionType::DragBubble => names::DRAG_BUBBLE,
            ActionType::PopSpecialBubble => names::POP_SPECIAL_BUBBLE,
            ActionType::AchieveCombo => names::REACH_COMBO,
            ActionType::NavigateScene => names::NAVIGATE_TO_SCENE,
            ActionType::ReachScore => names::REACH_SCORE,
            ActionType::ChangeSetting => names::CHANGE_SETTING,
            ActionType::Unrecognized => return None,
        };
        Some(ValidatorName::new(name))
    }

    /// Event the orchestrator listens for before validating.
    pub fn wait_event(self) -> &'static str {
        match self {
            ActionType::ClickBubble => "bubble_popped",
            ActionType::DragBubble => "bubble_dragged",
            ActionType::PopSpecialBubble => "special_bubble_popped",
            ActionType::AchieveCombo => "combo_achieved",
            ActionType::NavigateScene => "scene_changed",
            ActionType::ReachScore => "score_updated",
            ActionType::ChangeSetting => "setting_changed",
            ActionType::Unrecognized => DEFAULT_WAIT_EVENT,
        }
    }
}

/// One step of a tutorial: a required user action plus its criterion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    /// Step identifier, unique within the tutorial
    pub id: StepId,

    /// Display title
    pub title: String,

    /// Instruction text shown by the overlay
    #[serde(default)]
    pub instructions: String,

    /// Action descriptor
    #[serde(default)]
    pub action: Option<StepAction>,

    /// Explicit validator, overriding the action's default
    #[serde(default)]
    pub validation_function: Option<ValidatorName>,

    /// Explicit wait event, overriding the action's default
    #[serde(default)]
    pub wait_for: Option<String>,

    /// Minimum drag distance for drag steps
    #[serde(default)]
    pub min_drag_distance: Option<f64>,

    /// Combo counter threshold
    #[serde(default)]
    pub required_combo: Option<u32>,

    /// Score threshold
    #[serde(default)]
    pub required_score: Option<u64>,

    /// Scene the user must navigate to
    #[serde(default)]
    pub target_scene: Option<String>,

    /// Setting the user must change
    #[serde(default)]
    pub setting_key: Option<String>,

    /// Value the setting must end up with
    #[serde(default)]
    pub target_value: Option<serde_json::Value>,

    /// Step timeout override, in milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Message shown when the step times out
    #[serde(default)]
    pub timeout_message: Option<String>,

    /// Authored duration estimate, in milliseconds
    #[serde(default)]
    pub estimated_duration: Option<u64>,
}

impl StepDefinition {
    /// Create a step with no action or criterion.
    pub fn new(id: impl Into<StepId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the action type.
    pub fn with_action(mut self, action_type: ActionType) -> Self {
        self.action = Some(StepAction { action_type });
        self
    }

    /// Name the validator explicitly.
    pub fn with_validator(mut self, name: impl Into<String>) -> Self {
        self.validation_function = Some(ValidatorName::new(name));
        self
    }

    /// Set the authored duration estimate.
    pub fn with_estimated_duration(mut self, ms: u64) -> Self {
        self.estimated_duration = Some(ms);
        self
    }

    /// Set the step timeout.
    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }

    /// The step's action type, if it declares one.
    pub fn action_type(&self) -> Option<ActionType> {
        self.action.map(|a| a.action_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_action_type_deserializes() {
        let step: StepDefinition = serde_json::from_str(
            r#"{"id": "s1", "title": "Wave", "action": {"type": "wave_hands"}}"#,
        )
        .unwrap();
        assert_eq!(step.action_type(), Some(ActionType::Unrecognized));
        assert!(ActionType::Unrecognized.default_validator().is_none());
        assert_eq!(ActionType::Unrecognized.wait_event(), DEFAULT_WAIT_EVENT);
    }

    #[test]
    fn test_click_bubble_maps_to_pop_validator() {
        let name = ActionType::ClickBubble.default_validator().unwrap();
        assert_eq!(name.as_str(), names::POP_BUBBLE);
        assert_eq!(ActionType::ClickBubble.wait_event(), "bubble_popped");
    }

    #[test]
    fn test_tutorial_content_parses() {
        let json = r#"{
            "id": "advanced-bubbles",
            "title": "Advanced bubbles",
            "prerequisites": ["basic-tutorial"],
            "difficulty": "intermediate",
            "steps": [
                {"id": "drag", "title": "Drag", "action": {"type": "drag_bubble"}, "minDragDistance": 80.0},
                {"id": "score", "title": "Score", "validationFunction": "reach_score", "requiredScore": 500}
            ]
        }"#;
        let tutorial: TutorialDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(tutorial.step_count(), 2);
        assert_eq!(tutorial.prerequisites, vec![TutorialId::new("basic-tutorial")]);
        assert_eq!(tutorial.difficulty, Some(Difficulty::Intermediate));
        assert_eq!(tutorial.steps[0].min_drag_distance, Some(80.0));
        assert_eq!(tutorial.steps[1].required_score, Some(500));
        assert!(!tutorial.is_guided_tour());
    }

    #[test]
    fn test_guided_tour_tag() {
        let tour = TutorialDefinition::new("tour", "Tour").into_guided_tour();
        assert!(tour.is_guided_tour());
        let json = serde_json::to_value(&tour).unwrap();
        assert_eq!(json["tourType"], "guided_tour");
    }
}
