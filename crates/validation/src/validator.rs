//! Validator capability and its normalized output.

use async_trait::async_trait;
use tutorkit_core::{ActionResult, StepDefinition, ValidationResult};

use crate::live::LiveState;

/// Error used when a validator fails without saying why.
pub const GENERIC_FAILURE: &str = "The step requirement was not met";

/// A named criterion deciding whether an action completes a step.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Evaluate the action against the step and the live game state.
    ///
    /// Returning `Err` (or panicking) is reported as a failed step, never
    /// propagated to the caller of the engine.
    async fn validate(
        &self,
        action: &ActionResult,
        step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput>;
}

/// What a validator may return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorOutput {
    /// Plain pass/fail
    Flag(bool),

    /// Structured outcome; a missing `success` counts as a failure
    Detailed {
        /// Whether the criterion holds
        success: Option<bool>,

        /// Reason on failure
        error: Option<String>,

        /// Extra data for the host
        details: Option<serde_json::Value>,
    },
}

impl ValidatorOutput {
    /// Normalize into a [`ValidationResult`].
    pub fn into_result(self) -> ValidationResult {
        match self {
            ValidatorOutput::Flag(true) => ValidationResult::success(),
            ValidatorOutput::Flag(false) => ValidationResult::failure(GENERIC_FAILURE),
            ValidatorOutput::Detailed { success, error, details } => {
                let success = success.unwrap_or(false);
                let error = match (success, error) {
                    (false, None) => Some(GENERIC_FAILURE.to_string()),
                    (_, error) => error,
                };
                ValidationResult { success, error, details }
            }
        }
    }
}

impl From<bool> for ValidatorOutput {
    fn from(passed: bool) -> Self {
        ValidatorOutput::Flag(passed)
    }
}

impl From<ValidationResult> for ValidatorOutput {
    fn from(result: ValidationResult) -> Self {
        ValidatorOutput::Detailed {
            success: Some(result.success),
            error: result.error,
            details: result.details,
        }
    }
}

impl From<serde_json::Value> for ValidatorOutput {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => ValidatorOutput::Flag(b),
            serde_json::Value::Object(mut map) => ValidatorOutput::Detailed {
                success: map.get("success").and_then(|v| v.as_bool()),
                error: map
                    .get("error")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                details: map.remove("details"),
            },
            _ => ValidatorOutput::Flag(false),
        }
    }
}

/// Validator backed by a synchronous closure.
pub struct FnValidator<F> {
    func: F,
}

impl<F, O> FnValidator<F>
where
    F: Fn(&ActionResult, &StepDefinition, &dyn LiveState) -> O + Send + Sync,
    O: Into<ValidatorOutput>,
{
    /// Wrap a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, O> Validator for FnValidator<F>
where
    F: Fn(&ActionResult, &StepDefinition, &dyn LiveState) -> O + Send + Sync,
    O: Into<ValidatorOutput>,
{
    async fn validate(
        &self,
        action: &ActionResult,
        step: &StepDefinition,
        state: &dyn LiveState,
    ) -> anyhow::Result<ValidatorOutput> {
        Ok((self.func)(action, step, state).into())
    }
}
