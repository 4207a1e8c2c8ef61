//! Validation model - action results, live bubble state and outcomes.

use serde::{Deserialize, Serialize};

/// Name under which a validator is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorName(String);

impl ValidatorName {
    /// Create a validator name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidatorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidatorName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Names of the built-in validators.
pub mod names {
    /// The referenced bubble must exist and be popped.
    pub const POP_BUBBLE: &str = "pop_bubble";
    /// The reported drag distance must reach the step minimum.
    pub const DRAG_BUBBLE: &str = "drag_bubble";
    /// The acted-on bubble must be a special bubble.
    pub const POP_SPECIAL_BUBBLE: &str = "pop_special_bubble";
    /// The combo counter must reach the step threshold.
    pub const REACH_COMBO: &str = "reach_combo";
    /// The active scene must be the step target.
    pub const NAVIGATE_TO_SCENE: &str = "navigate_to_scene";
    /// The score must reach the step threshold.
    pub const REACH_SCORE: &str = "reach_score";
    /// A named setting must hold the step's target value.
    pub const CHANGE_SETTING: &str = "change_setting";
}

/// What the host reports after the user acted on a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Set when the step timer fired instead of a user action
    #[serde(default)]
    pub timeout: bool,

    /// Bubble the action referred to
    #[serde(default)]
    pub bubble_id: Option<String>,

    /// Type of the bubble acted on
    #[serde(default)]
    pub bubble_type: Option<String>,

    /// Distance of a drag gesture
    #[serde(default)]
    pub drag_distance: Option<f64>,

    /// Anything else the host attached
    #[serde(default, flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ActionResult {
    /// An action that refers to a bubble.
    pub fn bubble(id: impl Into<String>) -> Self {
        Self {
            bubble_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// A drag gesture of the given distance.
    pub fn drag(distance: f64) -> Self {
        Self {
            drag_distance: Some(distance),
            ..Default::default()
        }
    }

    /// The synthetic result produced when a step times out.
    pub fn timed_out() -> Self {
        Self {
            timeout: true,
            ..Default::default()
        }
    }

    /// Set the bubble type.
    pub fn with_bubble_type(mut self, bubble_type: impl Into<String>) -> Self {
        self.bubble_type = Some(bubble_type.into());
        self
    }
}

/// Live state of a bubble, as reported by the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleState {
    /// Bubble identifier
    pub id: String,

    /// Bubble type (`normal`, `rainbow`, ...)
    pub bubble_type: String,

    /// Whether the bubble has been popped
    pub is_popped: bool,
}

/// Outcome of one validation call. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the step criterion holds
    pub success: bool,

    /// Human-readable reason on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Structured data the validator attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ValidationResult {
    /// A passing result.
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            details: None,
        }
    }

    /// A failing result with a reason.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: None,
        }
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_result_keeps_extra_fields() {
        let action: ActionResult =
            serde_json::from_str(r#"{"bubbleId": "b1", "combo": 4}"#).unwrap();
        assert_eq!(action.bubble_id.as_deref(), Some("b1"));
        assert_eq!(action.data.get("combo"), Some(&serde_json::json!(4)));
        assert!(!action.timeout);
    }

    #[test]
    fn test_failure_carries_message() {
        let result = ValidationResult::failure("nope");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("nope"));
        assert_eq!(ValidationResult::success().error, None);
    }
}
