//! Built-in bubble-game validators.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tutorkit_core::{names, ActionResult, StepDefinition, ValidationResult, ValidatorName};

use crate::live::LiveState;
use crate::validator::{Validator, ValidatorOutput};

/// Bubble types that count as special.
pub const SPECIAL_BUBBLE_TYPES: &[&str] = &[
    "rainbow", "pink", "clock", "electric", "poison", "spiky", "golden", "frozen", "magnetic",
    "explosive",
];

const DEFAULT_MIN_DRAG_DISTANCE: f64 = 50.0;
const DEFAULT_REQUIRED_COMBO: u32 = 3;
const DEFAULT_REQUIRED_SCORE: u64 = 100;

fn fail(message: impl Into<String>) -> anyhow::Result<ValidatorOutput> {
    Ok(ValidationResult::failure(message).into())
}

fn pass() -> anyhow::Result<ValidatorOutput> {
    Ok(ValidationResult::success().into())
}

/// The referenced bubble must exist and be popped.
pub struct PopBubble;

#[async_trait]
impl Validator for PopBubble {
    async fn validate(
        &self,
        action: &ActionResult,
        _step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        let Some(id) = action.bubble_id.as_deref() else {
            return fail("No bubble was referenced by the action");
        };
        match state.bubble(id) {
            None => fail(format!("Bubble {} was not found", id)),
            Some(bubble) if !bubble.is_popped => fail("The bubble was not popped correctly"),
            Some(_) => pass(),
        }
    }
}

/// The drag distance must reach the step minimum (default 50).
pub struct DragBubble;

#[async_trait]
impl Validator for DragBubble {
    async fn validate(
        &self,
        action: &ActionResult,
        step: &StepDefinition,
        _state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        let required = step.min_drag_distance.unwrap_or(DEFAULT_MIN_DRAG_DISTANCE);
        let distance = action.drag_distance.unwrap_or(0.0);
        let details = json!({ "distance": distance, "required": required });

        if distance >= required {
            Ok(ValidationResult::success().with_details(details).into())
        } else {
            Ok(ValidationResult::failure(format!(
                "Drag the bubble further ({:.0} of {:.0})",
                distance, required
            ))
            .with_details(details)
            .into())
        }
    }
}

/// The acted-on bubble must be one of [`SPECIAL_BUBBLE_TYPES`].
pub struct PopSpecialBubble;

#[async_trait]
impl Validator for PopSpecialBubble {
    async fn validate(
        &self,
        action: &ActionResult,
        _step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        let bubble_type = action.bubble_type.clone().or_else(|| {
            action
                .bubble_id
                .as_deref()
                .and_then(|id| state.bubble(id))
                .map(|b| b.bubble_type)
        });

        match bubble_type {
            None => fail("No bubble type was reported"),
            Some(t) if SPECIAL_BUBBLE_TYPES.contains(&t.as_str()) => pass(),
            Some(t) => fail(format!("A {} bubble is not a special bubble", t)),
        }
    }
}

/// The combo counter must reach the step threshold (default 3).
pub struct ReachCombo;

#[async_trait]
impl Validator for ReachCombo {
    async fn validate(
        &self,
        _action: &ActionResult,
        step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        let required = step.required_combo.unwrap_or(DEFAULT_REQUIRED_COMBO);
        match state.combo_count() {
            None => fail("The combo counter is not available"),
            Some(combo) if combo >= required => pass(),
            Some(combo) => fail(format!("Reach a {} combo (current: {})", required, combo)),
        }
    }
}

/// The active scene must equal the step target.
pub struct NavigateToScene;

#[async_trait]
impl Validator for NavigateToScene {
    async fn validate(
        &self,
        _action: &ActionResult,
        step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        let Some(target) = step.target_scene.as_deref() else {
            return fail("The step has no target scene");
        };
        match state.current_scene() {
            None => fail("The current scene is not available"),
            Some(scene) if scene == target => pass(),
            Some(_) => fail(format!("Go to the {} scene", target)),
        }
    }
}

/// The score must reach the step threshold (default 100).
pub struct ReachScore;

#[async_trait]
impl Validator for ReachScore {
    async fn validate(
        &self,
        _action: &ActionResult,
        step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        let required = step.required_score.unwrap_or(DEFAULT_REQUIRED_SCORE);
        match state.score() {
            None => fail("The score is not available"),
            Some(score) if score >= required => pass(),
            Some(score) => fail(format!("Reach a score of {} (current: {})", required, score)),
        }
    }
}

/// A named setting must hold the step's target value.
pub struct ChangeSetting;

#[async_trait]
impl Validator for ChangeSetting {
    async fn validate(
        &self,
        _action: &ActionResult,
        step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        let Some(key) = step.setting_key.as_deref() else {
            return fail("The step has no setting key");
        };
        let Some(target) = step.target_value.as_ref() else {
            return fail("The step has no target value");
        };
        match state.setting(key) {
            None => fail(format!("Setting {} is not available", key)),
            Some(value) if &value == target => pass(),
            Some(_) => fail(format!("Change {} to {}", key, target)),
        }
    }
}

/// Every built-in validator with the name it is registered under.
pub fn builtins() -> Vec<(ValidatorName, Arc<dyn Validator>)> {
    fn entry(name: &str, validator: impl Validator + 'static) -> (ValidatorName, Arc<dyn Validator>) {
        (ValidatorName::new(name), Arc::new(validator))
    }

    vec![
        entry(names::POP_BUBBLE, PopBubble),
        entry(names::DRAG_BUBBLE, DragBubble),
        entry(names::POP_SPECIAL_BUBBLE, PopSpecialBubble),
        entry(names::REACH_COMBO, ReachCombo),
        entry(names::NAVIGATE_TO_SCENE, NavigateToScene),
        entry(names::REACH_SCORE, ReachScore),
        entry(names::CHANGE_SETTING, ChangeSetting),
    ]
}
