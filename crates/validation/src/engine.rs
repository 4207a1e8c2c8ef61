//! Step validation engine.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tutorkit_core::{
    ActionResult, StepDefinition, StepId, TutorialEvent, TutorialId, ValidationResult,
    ValidatorName, DEFAULT_WAIT_EVENT,
};

use crate::live::{DisconnectedState, LiveState};
use crate::registry::ValidatorRegistry;
use crate::surface::{EventSink, LogEventSink, LogPresenter, Presenter};
use crate::timer::StepTimer;
use crate::validator::Validator;

/// Message shown when a timed-out step has none of its own.
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "Time is up for this step. Give it another try.";

/// Decides whether an action completes a step and owns the step timer.
///
/// The engine never mutates progress or statistics; it only evaluates and
/// reports. Nothing raised by a validator or a surface escapes it.
pub struct ValidationEngine {
    registry: ValidatorRegistry,
    live: Arc<dyn LiveState>,
    presenter: Arc<dyn Presenter>,
    events: Arc<dyn EventSink>,
    timer: StepTimer,
}

impl ValidationEngine {
    /// Create an engine with the built-in validators registered.
    pub fn new(
        live: Arc<dyn LiveState>,
        presenter: Arc<dyn Presenter>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry: ValidatorRegistry::with_builtins(),
            live,
            presenter,
            events,
            timer: StepTimer::new(),
        }
    }

    /// Engine with no game wired in, reporting to the log.
    pub fn disconnected() -> Self {
        Self::new(
            Arc::new(DisconnectedState),
            Arc::new(LogPresenter),
            Arc::new(LogEventSink),
        )
    }

    /// Validate an action against a step.
    ///
    /// A step with no resolvable validator, or whose validator is not
    /// registered, passes.
    pub async fn validate_step(
        &self,
        step: &StepDefinition,
        action: &ActionResult,
    ) -> ValidationResult {
        let Some(name) = self.determine_validation_function(step) else {
            tracing::debug!(step = %step.id, "no validator for step");
            return ValidationResult::success();
        };
        let Some(validator) = self.registry.get(&name) else {
            tracing::debug!(step = %step.id, validator = %name, "validator not registered");
            return ValidationResult::success();
        };

        let call = validator.validate(action, step, self.live.as_ref());
        let result = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(output)) => output.into_result(),
            Ok(Err(e)) => {
                tracing::warn!(validator = %name, "validator error: {}", e);
                ValidationResult::failure(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(validator = %name, "validator panicked: {}", message);
                ValidationResult::failure(message)
            }
        };

        tracing::debug!(
            step = %step.id,
            validator = %name,
            success = result.success,
            "step validated"
        );
        result
    }

    /// The step's explicit validator, else its action type's default.
    pub fn determine_validation_function(&self, step: &StepDefinition) -> Option<ValidatorName> {
        step.validation_function
            .clone()
            .or_else(|| step.action_type().and_then(|a| a.default_validator()))
    }

    /// Event to wait for before validating the step.
    pub fn determine_wait_action(&self, step: &StepDefinition) -> String {
        if let Some(wait) = &step.wait_for {
            return wait.clone();
        }
        step.action_type()
            .map(|a| a.wait_event())
            .unwrap_or(DEFAULT_WAIT_EVENT)
            .to_string()
    }

    /// Arm the step timer, replacing any pending one.
    pub fn set_step_timer<F>(&self, timeout_ms: Option<u64>, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.timer.set(timeout_ms, on_timeout);
    }

    /// Cancel the pending step timer.
    pub fn clear_step_timer(&self) {
        self.timer.clear();
    }

    /// Whether a step timer is pending.
    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_pending()
    }

    /// Register a validator under a name, replacing any previous one.
    pub fn register_validation_function(
        &mut self,
        name: impl Into<ValidatorName>,
        validator: impl Validator + 'static,
    ) {
        let name = name.into();
        if self.registry.register(name.clone(), Arc::new(validator)).is_some() {
            tracing::debug!(validator = %name, "validator replaced");
        }
    }

    /// Remove a validator. Returns whether one was registered.
    pub fn unregister_validation_function(&mut self, name: &ValidatorName) -> bool {
        self.registry.unregister(name).is_some()
    }

    /// Names of all registered validators.
    pub fn get_registered_validation_functions(&self) -> Vec<ValidatorName> {
        self.registry.list()
    }

    /// Show a validation error and emit `tutorial_validation_error`.
    pub async fn show_validation_error(
        &self,
        tutorial_id: &TutorialId,
        step_id: &StepId,
        error: &str,
    ) {
        if let Err(e) = self.presenter.show_error(error).await {
            tracing::warn!("failed to show validation error: {}", e);
        }
        self.emit(TutorialEvent::TutorialValidationError {
            tutorial_id: tutorial_id.clone(),
            step_id: step_id.clone(),
            error: error.to_string(),
        });
    }

    /// Show a step's timeout message and emit `tutorial_step_timeout`.
    pub async fn show_timeout_message(
        &self,
        tutorial_id: &TutorialId,
        step: &StepDefinition,
        step_index: usize,
    ) {
        let message = step
            .timeout_message
            .as_deref()
            .unwrap_or(DEFAULT_TIMEOUT_MESSAGE);
        if let Err(e) = self.presenter.show_timeout(message).await {
            tracing::warn!("failed to show timeout message: {}", e);
        }
        self.emit(TutorialEvent::TutorialStepTimeout {
            tutorial_id: tutorial_id.clone(),
            step_id: step.id.clone(),
            step_index,
        });
    }

    /// Emit an event, logging failures.
    pub fn emit(&self, event: TutorialEvent) {
        let name = event.name();
        if let Err(e) = self.events.emit(event) {
            tracing::warn!(event = name, "failed to emit event: {}", e);
        }
    }

    /// Release the step timer.
    pub fn shutdown(&self) {
        self.timer.clear();
        tracing::debug!("validation engine shut down");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "validator panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::SnapshotState;
    use crate::surface::ChannelEventSink;
    use crate::validator::{FnValidator, ValidatorOutput};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tutorkit_core::{names, ActionType};

    #[derive(Default)]
    struct RecordingPresenter {
        shown: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Presenter for RecordingPresenter {
        async fn show_error(&self, message: &str) -> anyhow::Result<()> {
            self.shown.lock().unwrap().push(format!("error:{}", message));
            Ok(())
        }

        async fn show_timeout(&self, message: &str) -> anyhow::Result<()> {
            self.shown.lock().unwrap().push(format!("timeout:{}", message));
            Ok(())
        }
    }

    struct BrokenPresenter;

    #[async_trait]
    impl Presenter for BrokenPresenter {
        async fn show_error(&self, _message: &str) -> anyhow::Result<()> {
            anyhow::bail!("overlay gone")
        }

        async fn show_timeout(&self, _message: &str) -> anyhow::Result<()> {
            anyhow::bail!("overlay gone")
        }
    }

    struct FailingValidator;

    #[async_trait]
    impl Validator for FailingValidator {
        async fn validate(
            &self,
            _action: &ActionResult,
            _step: &StepDefinition,
            _state: &dyn LiveState,
        ) -> anyhow::Result<ValidatorOutput> {
            anyhow::bail!("lookup exploded")
        }
    }

    struct PanickingValidator;

    #[async_trait]
    impl Validator for PanickingValidator {
        async fn validate(
            &self,
            _action: &ActionResult,
            _step: &StepDefinition,
            _state: &dyn LiveState,
        ) -> anyhow::Result<ValidatorOutput> {
            panic!("validator bug")
        }
    }

    fn engine_with(
        live: SnapshotState,
    ) -> (
        ValidationEngine,
        Arc<RecordingPresenter>,
        mpsc::UnboundedReceiver<TutorialEvent>,
    ) {
        let presenter = Arc::new(RecordingPresenter::default());
        let (sink, rx) = ChannelEventSink::new();
        let engine = ValidationEngine::new(Arc::new(live), presenter.clone(), Arc::new(sink));
        (engine, presenter, rx)
    }

    #[tokio::test]
    async fn test_click_bubble_resolves_to_pop_validator() {
        let live = SnapshotState::new()
            .with_bubble("b1", "normal", false)
            .with_bubble("b2", "normal", true);
        let (engine, _, _) = engine_with(live);
        let step = StepDefinition::new("s1", "Pop").with_action(ActionType::ClickBubble);

        assert_eq!(
            engine.determine_validation_function(&step),
            Some(ValidatorName::new(names::POP_BUBBLE))
        );

        let failed = engine.validate_step(&step, &ActionResult::bubble("b1")).await;
        assert_eq!(
            failed,
            ValidationResult::failure("The bubble was not popped correctly")
        );

        let passed = engine.validate_step(&step, &ActionResult::bubble("b2")).await;
        assert_eq!(passed, ValidationResult::success());
    }

    #[tokio::test]
    async fn test_steps_without_criterion_pass() {
        let engine = ValidationEngine::disconnected();
        let bare = StepDefinition::new("s1", "Look around");
        let unknown: StepDefinition = serde_json::from_str(
            r#"{"id": "s2", "title": "Wave", "action": {"type": "wave_hands"}}"#,
        )
        .unwrap();
        let unregistered = StepDefinition::new("s3", "Custom").with_validator("not_there");

        for step in [&bare, &unknown, &unregistered] {
            let result = engine.validate_step(step, &ActionResult::default()).await;
            assert!(result.success, "{} should pass", step.id);
        }
        assert!(engine.determine_validation_function(&unknown).is_none());
    }

    #[tokio::test]
    async fn test_explicit_validator_wins_over_action() {
        let mut engine = ValidationEngine::disconnected();
        engine.register_validation_function("always", FnValidator::new(|_, _, _| true));
        let step = StepDefinition::new("s1", "Pop")
            .with_action(ActionType::ClickBubble)
            .with_validator("always");

        assert_eq!(
            engine.determine_validation_function(&step),
            Some(ValidatorName::new("always"))
        );
        assert!(engine.validate_step(&step, &ActionResult::default()).await.success);
    }

    #[tokio::test]
    async fn test_validator_errors_become_failures() {
        let mut engine = ValidationEngine::disconnected();
        engine.register_validation_function("failing", FailingValidator);
        engine.register_validation_function("panicking", PanickingValidator);

        let failing = StepDefinition::new("s1", "A").with_validator("failing");
        let result = engine.validate_step(&failing, &ActionResult::default()).await;
        assert_eq!(result, ValidationResult::failure("lookup exploded"));

        let panicking = StepDefinition::new("s2", "B").with_validator("panicking");
        let result = engine.validate_step(&panicking, &ActionResult::default()).await;
        assert_eq!(result, ValidationResult::failure("validator bug"));

        // still usable afterwards
        let result = engine.validate_step(&failing, &ActionResult::default()).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_missing_live_state_is_a_failure() {
        let engine = ValidationEngine::disconnected();
        let step = StepDefinition::new("s1", "Combo").with_action(ActionType::AchieveCombo);
        let result = engine.validate_step(&step, &ActionResult::default()).await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_wait_action_resolution() {
        let engine = ValidationEngine::disconnected();

        let mut explicit = StepDefinition::new("s1", "A").with_action(ActionType::DragBubble);
        explicit.wait_for = Some("custom_event".to_string());
        assert_eq!(engine.determine_wait_action(&explicit), "custom_event");

        let from_action = StepDefinition::new("s2", "B").with_action(ActionType::DragBubble);
        assert_eq!(engine.determine_wait_action(&from_action), "bubble_dragged");

        let bare = StepDefinition::new("s3", "C");
        assert_eq!(engine.determine_wait_action(&bare), DEFAULT_WAIT_EVENT);
    }

    #[test]
    fn test_registry_operations() {
        let mut engine = ValidationEngine::disconnected();
        assert_eq!(engine.get_registered_validation_functions().len(), 7);

        engine.register_validation_function("extra", FnValidator::new(|_, _, _| false));
        assert_eq!(engine.get_registered_validation_functions().len(), 8);

        assert!(engine.unregister_validation_function(&ValidatorName::new("extra")));
        assert!(!engine.unregister_validation_function(&ValidatorName::new("extra")));
    }

    #[tokio::test]
    async fn test_show_messages_emit_events() {
        let (engine, presenter, mut rx) = engine_with(SnapshotState::new());
        let tutorial = TutorialId::new("t1");
        let mut step = StepDefinition::new("s1", "A");

        engine.show_validation_error(&tutorial, &step.id, "try again").await;
        engine.show_timeout_message(&tutorial, &step, 2).await;
        step.timeout_message = Some("Too slow".to_string());
        engine.show_timeout_message(&tutorial, &step, 2).await;

        assert_eq!(
            *presenter.shown.lock().unwrap(),
            vec![
                "error:try again".to_string(),
                format!("timeout:{}", DEFAULT_TIMEOUT_MESSAGE),
                "timeout:Too slow".to_string(),
            ]
        );
        assert_eq!(
            rx.recv().await,
            Some(TutorialEvent::TutorialValidationError {
                tutorial_id: tutorial.clone(),
                step_id: step.id.clone(),
                error: "try again".to_string(),
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(TutorialEvent::TutorialStepTimeout {
                tutorial_id: tutorial.clone(),
                step_id: step.id.clone(),
                step_index: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_surface_failures_are_swallowed() {
        let (sink, rx) = ChannelEventSink::new();
        drop(rx);
        let engine = ValidationEngine::new(
            Arc::new(DisconnectedState),
            Arc::new(BrokenPresenter),
            Arc::new(sink),
        );
        let step = StepDefinition::new("s1", "A");
        engine
            .show_validation_error(&TutorialId::new("t1"), &step.id, "x")
            .await;
        engine.show_timeout_message(&TutorialId::new("t1"), &step, 0).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_timer() {
        let engine = ValidationEngine::disconnected();
        engine.set_step_timer(Some(1000), || panic!("should not fire"));
        assert!(engine.has_pending_timer());
        engine.shutdown();
        assert!(!engine.has_pending_timer());
        tokio::time::sleep(std::time::Duration::from_millis(2000)).await;
    }
}
