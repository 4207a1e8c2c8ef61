//! Tutorial session - the step-advance loop over the stores and the engine.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;
use tutorkit_core::{
    ActionResult, Difficulty, SessionId, StepDefinition, TutorialAction, TutorialConfig, TutorialDefinition,
    TutorialEvent, TutorialId, ValidationResult,
};
use tutorkit_progress::{ProgressStore, StatsStore, StepStatistics, TutorialStatistics};
use tutorkit_storage::Storage;
use tutorkit_validation::ValidationEngine;

use crate::catalog::TutorialCatalog;
use crate::error::SessionError;

/// Estimate shown for a tutorial that has none authored, in milliseconds.
pub const DEFAULT_TUTORIAL_ESTIMATE_MS: u64 = 300_000;

/// Result of handing an action (or a timeout) to the current step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step criterion held
    Passed(ValidationResult),

    /// The step criterion did not hold
    Failed(ValidationResult),

    /// The step timer fired first
    TimedOut,
}

impl StepOutcome {
    /// Whether the step was passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed(_))
    }
}

/// Where a navigation call left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Now on this step
    Step(usize),

    /// The tutorial was completed
    Completed,
}

/// A tutorial the user may start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableTutorial {
    /// Identifier
    pub id: TutorialId,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Difficulty, `beginner` when not authored
    pub difficulty: Difficulty,

    /// Estimate in milliseconds
    pub estimated_time: u64,

    /// Number of steps
    pub step_count: usize,

    /// Whether the user already completed it
    pub completed: bool,
}

/// One user's tutorial session.
///
/// The session is the only writer of both stores: every outcome is recorded
/// in progress and statistics before the next step is validated.
pub struct TutorialSession<S: Storage> {
    id: SessionId,
    config: TutorialConfig,
    catalog: TutorialCatalog,
    progress: ProgressStore<S>,
    stats: StatsStore<S>,
    engine: ValidationEngine,
    current: Option<Arc<TutorialDefinition>>,
    step_started_at: Instant,
}

impl<S: Storage> TutorialSession<S> {
    /// Create a session over a storage backend.
    pub fn new(
        storage: S,
        catalog: TutorialCatalog,
        config: TutorialConfig,
        engine: ValidationEngine,
    ) -> Self {
        let storage = Arc::new(Mutex::new(storage));
        Self {
            id: SessionId::new(),
            progress: ProgressStore::new(storage.clone()),
            stats: StatsStore::new(storage, &config),
            config,
            catalog,
            engine,
            current: None,
            step_started_at: Instant::now(),
        }
    }

    /// Restore both stores and re-enter the tutorial that was active.
    ///
    /// A saved tutorial missing from the catalog (or saved past its last
    /// step) is left untouched in storage; no tutorial is entered.
    pub async fn load(&mut self) {
        self.progress.load_user_progress().await;
        self.stats.load_stats().await;

        let Some(id) = self.progress.state().current_tutorial_id.clone() else {
            return;
        };
        match self.catalog.get(&id).cloned() {
            Some(tutorial) if self.progress.state().current_step_index < tutorial.step_count() => {
                tracing::info!(
                    tutorial = %id,
                    step = self.progress.state().current_step_index,
                    "resuming tutorial"
                );
                self.current = Some(tutorial);
                self.step_started_at = Instant::now();
            }
            _ => {
                tracing::warn!(tutorial = %id, "saved tutorial does not match the loaded content, not resuming it");
            }
        }
    }

    /// Identifier of this session.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Configuration.
    pub fn config(&self) -> &TutorialConfig {
        &self.config
    }

    /// Loaded content.
    pub fn catalog(&self) -> &TutorialCatalog {
        &self.catalog
    }

    /// Progress store.
    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    /// Statistics store.
    pub fn stats(&self) -> &StatsStore<S> {
        &self.stats
    }

    /// Validation engine.
    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Validation engine, for registering validators.
    pub fn engine_mut(&mut self) -> &mut ValidationEngine {
        &mut self.engine
    }

    /// Active tutorial.
    pub fn current_tutorial(&self) -> Option<&TutorialDefinition> {
        self.current.as_deref()
    }

    /// Index of the active step.
    pub fn current_step_index(&self) -> usize {
        self.progress.state().current_step_index
    }

    /// Active step.
    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.current
            .as_ref()
            .and_then(|t| t.step(self.current_step_index()))
    }

    /// Start a tutorial once its prerequisites are completed.
    pub async fn start_tutorial(&mut self, id: &TutorialId) -> Result<(), SessionError> {
        let tutorial = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::TutorialNotFound(id.clone()))?;

        let missing: Vec<TutorialId> = tutorial
            .prerequisites
            .iter()
            .filter(|p| !self.progress.is_completed(p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SessionError::PrerequisitesNotMet {
                tutorial: id.clone(),
                missing,
            });
        }

        self.engine.clear_step_timer();
        self.progress.start_tutorial(&tutorial).await;
        self.stats
            .record_tutorial_attempt(
                id,
                TutorialAction::Start,
                Some(serde_json::json!({ "sessionId": self.id.to_string() })),
            )
            .await;
        tracing::debug!(session = %self.id, tutorial = %id, "tutorial entered");
        self.engine.emit(TutorialEvent::TutorialStarted {
            tutorial_id: id.clone(),
        });

        self.current = Some(tutorial);
        self.step_started_at = Instant::now();
        Ok(())
    }

    /// Validate an action against the active step and record the outcome.
    ///
    /// A pass auto-advances after the configured delay when enabled.
    pub async fn submit_action(&mut self, action: &ActionResult) -> Result<StepOutcome, SessionError> {
        let (tutorial, index) = self.active()?;
        let step = self.step_at(&tutorial, index)?;

        self.engine.clear_step_timer();
        let result = self.engine.validate_step(step, action).await;
        let duration = self.step_elapsed_ms();
        self.step_started_at = Instant::now();

        self.progress.record_step_attempt(&step.id).await;
        self.stats
            .update_step_stats(&step.id, &tutorial.id, duration, result.success, false)
            .await;

        if !result.success {
            let error = result.error.as_deref().unwrap_or_default();
            self.engine
                .show_validation_error(&tutorial.id, &step.id, error)
                .await;
            return Ok(StepOutcome::Failed(result));
        }

        self.engine.emit(TutorialEvent::TutorialStepCompleted {
            tutorial_id: tutorial.id.clone(),
            step_id: step.id.clone(),
            duration_ms: duration,
        });

        if self.config.auto_advance {
            tokio::time::sleep(self.config.auto_advance_delay()).await;
            self.next_step().await?;
        }
        Ok(StepOutcome::Passed(result))
    }

    /// Wait for the next host action on the active step, racing the step
    /// timer. The step's own timeout wins over the configured default.
    pub async fn await_step_action(
        &mut self,
        actions: &mut mpsc::Receiver<ActionResult>,
    ) -> Result<StepOutcome, SessionError> {
        let (tutorial, index) = self.active()?;
        let step = self.step_at(&tutorial, index)?;
        let timeout_ms = step.timeout.unwrap_or(self.config.default_timeout_ms);

        let (fired_tx, fired_rx) = oneshot::channel();
        self.engine.set_step_timer(Some(timeout_ms), move || {
            let _ = fired_tx.send(());
        });
        // A zero timeout arms nothing and drops the sender; wait forever then.
        let timed_out = async {
            if fired_rx.await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            action = actions.recv() => match action {
                Some(action) => self.submit_action(&action).await,
                None => {
                    self.engine.clear_step_timer();
                    Err(SessionError::ActionsClosed)
                }
            },
            _ = timed_out => {
                let duration = self.step_elapsed_ms();
                self.step_started_at = Instant::now();
                tracing::info!(tutorial = %tutorial.id, step = %step.id, "step timed out");

                self.engine.show_timeout_message(&tutorial.id, step, index).await;
                self.progress.record_step_attempt(&step.id).await;
                self.stats
                    .update_step_stats(&step.id, &tutorial.id, duration, false, false)
                    .await;
                Ok(StepOutcome::TimedOut)
            }
        }
    }

    /// Move to the next step, completing the tutorial after the last one.
    pub async fn next_step(&mut self) -> Result<Navigation, SessionError> {
        let (tutorial, index) = self.active()?;
        self.engine.clear_step_timer();

        let next = index + 1;
        if next >= tutorial.step_count() {
            self.complete_current(&tutorial).await;
            return Ok(Navigation::Completed);
        }
        self.progress.advance_to_step(next).await;
        self.step_started_at = Instant::now();
        Ok(Navigation::Step(next))
    }

    /// Go back one step.
    pub async fn previous_step(&mut self) -> Result<Navigation, SessionError> {
        if !self.config.allow_back_navigation {
            return Err(SessionError::NavigationDisabled);
        }
        let (tutorial, index) = self.active()?;
        if index == 0 {
            return Err(SessionError::StepOutOfRange {
                index: 0,
                count: tutorial.step_count(),
            });
        }
        self.go_to_step(index - 1).await
    }

    /// Jump to a step of the active tutorial.
    pub async fn go_to_step(&mut self, index: usize) -> Result<Navigation, SessionError> {
        let (tutorial, _) = self.active()?;
        if index >= tutorial.step_count() {
            return Err(SessionError::StepOutOfRange {
                index,
                count: tutorial.step_count(),
            });
        }
        self.engine.clear_step_timer();
        self.progress.advance_to_step(index).await;
        self.step_started_at = Instant::now();
        Ok(Navigation::Step(index))
    }

    /// Skip the active step. A skip is recorded apart from failures.
    pub async fn skip_step(&mut self) -> Result<Navigation, SessionError> {
        if !self.config.allow_skip {
            return Err(SessionError::SkipDisabled);
        }
        let (tutorial, index) = self.active()?;
        let step = self.step_at(&tutorial, index)?;
        let duration = self.step_elapsed_ms();

        self.engine.clear_step_timer();
        self.progress.mark_step_as_skipped(&step.id).await;
        self.stats
            .update_step_stats(&step.id, &tutorial.id, duration, true, true)
            .await;
        self.engine.emit(TutorialEvent::TutorialStepSkipped {
            tutorial_id: tutorial.id.clone(),
            step_id: step.id.clone(),
        });

        self.next_step().await
    }

    /// Abandon the active tutorial, counting it as skipped.
    pub async fn skip_tutorial(&mut self) -> Result<(), SessionError> {
        let (tutorial, index) = self.active()?;
        self.stats
            .record_tutorial_attempt(
                &tutorial.id,
                TutorialAction::Skip,
                Some(serde_json::json!({ "stepIndex": index })),
            )
            .await;
        self.engine.emit(TutorialEvent::TutorialSkipped {
            tutorial_id: tutorial.id.clone(),
        });
        self.stop_tutorial().await
    }

    /// Leave the active tutorial without recording an outcome.
    pub async fn stop_tutorial(&mut self) -> Result<(), SessionError> {
        self.active()?;
        self.engine.clear_step_timer();
        self.progress.stop_tutorial().await;
        self.current = None;
        Ok(())
    }

    /// Pause the active tutorial. The step timer is cancelled.
    pub async fn pause(&mut self) -> Result<(), SessionError> {
        self.active()?;
        self.engine.clear_step_timer();
        self.progress.pause_tutorial().await;
        Ok(())
    }

    /// Resume a paused tutorial.
    pub async fn resume(&mut self) -> Result<(), SessionError> {
        self.active()?;
        self.progress.resume_tutorial().await;
        Ok(())
    }

    /// Tutorials whose prerequisites are completed.
    pub fn available_tutorials(&self) -> Vec<AvailableTutorial> {
        self.catalog
            .iter()
            .filter(|t| t.prerequisites.iter().all(|p| self.progress.is_completed(p)))
            .map(|t| AvailableTutorial {
                id: t.id.clone(),
                title: t.title.clone(),
                description: t.description.clone(),
                difficulty: t.difficulty.unwrap_or_default(),
                estimated_time: t.estimated_time.unwrap_or(DEFAULT_TUTORIAL_ESTIMATE_MS),
                step_count: t.step_count(),
                completed: self.progress.is_completed(&t.id),
            })
            .collect()
    }

    /// Aggregate statistics over the catalog.
    pub fn statistics(&self) -> TutorialStatistics {
        let current = self.current.as_deref();
        self.stats.get_tutorial_statistics(
            self.catalog.iter(),
            self.completed(),
            current.map(|t| &t.id),
            current,
        )
    }

    /// Per-step statistics of one tutorial.
    pub fn step_statistics(&self, id: &TutorialId) -> Result<Vec<StepStatistics>, SessionError> {
        let tutorial = self.lookup(id)?;
        Ok(self.stats.get_step_statistics(id, tutorial))
    }

    /// Completion rate of one tutorial.
    pub fn completion_rate(&self, id: &TutorialId) -> Result<f64, SessionError> {
        let tutorial = self.lookup(id)?;
        Ok(self.stats.calculate_completion_rate(id, tutorial, self.completed()))
    }

    /// Time left in the active tutorial, from its current step.
    pub fn estimated_time_remaining(&self) -> Option<u64> {
        let tutorial = self.current.as_deref()?;
        Some(self.stats.calculate_estimated_time_remaining(
            &tutorial.id,
            tutorial,
            self.current_step_index(),
        ))
    }

    /// Time left in any tutorial from a given step.
    pub fn estimate_from(&self, id: &TutorialId, from_step: usize) -> Result<u64, SessionError> {
        let tutorial = self.lookup(id)?;
        Ok(self
            .stats
            .calculate_estimated_time_remaining(id, tutorial, from_step))
    }

    /// Clear progress, ending any active tutorial.
    pub async fn reset_progress(&mut self) {
        self.engine.clear_step_timer();
        self.current = None;
        self.progress.reset_progress().await;
    }

    /// Clear statistics.
    pub async fn reset_stats(&mut self) {
        self.stats.reset_stats().await;
    }

    /// Cancel the timer and flush both stores.
    pub async fn shutdown(&mut self) {
        self.engine.shutdown();
        self.progress.flush().await;
        self.stats.flush().await;
        tracing::info!(session = %self.id, "tutorial session shut down");
    }

    async fn complete_current(&mut self, tutorial: &TutorialDefinition) {
        let elapsed = self.progress.elapsed_time();
        self.progress.complete_tutorial(&tutorial.id).await;
        self.stats
            .record_tutorial_attempt(
                &tutorial.id,
                TutorialAction::Complete,
                Some(serde_json::json!({ "durationMs": elapsed })),
            )
            .await;
        self.engine.emit(TutorialEvent::TutorialCompleted {
            tutorial_id: tutorial.id.clone(),
        });
        self.current = None;
    }

    fn active(&self) -> Result<(Arc<TutorialDefinition>, usize), SessionError> {
        let tutorial = self.current.clone().ok_or(SessionError::NoActiveTutorial)?;
        Ok((tutorial, self.current_step_index()))
    }

    fn step_at<'a>(
        &self,
        tutorial: &'a TutorialDefinition,
        index: usize,
    ) -> Result<&'a StepDefinition, SessionError> {
        tutorial.step(index).ok_or(SessionError::StepOutOfRange {
            index,
            count: tutorial.step_count(),
        })
    }

    fn lookup(&self, id: &TutorialId) -> Result<&TutorialDefinition, SessionError> {
        self.catalog
            .get(id)
            .map(|t| t.as_ref())
            .ok_or_else(|| SessionError::TutorialNotFound(id.clone()))
    }

    fn completed(&self) -> &BTreeSet<TutorialId> {
        &self.progress.state().completed_tutorials
    }

    fn step_elapsed_ms(&self) -> u64 {
        self.step_started_at.elapsed().as_millis() as u64
    }
}
