//! Progress store - tutorial and step lifecycle, persisted after every change.

use std::sync::Arc;
use chrono::Utc;
use tokio::sync::Mutex;
use tutorkit_core::{
    ProgressState, ProgressSummary, StepId, Time, TourSnapshot, TutorialDefinition, TutorialId,
};
use tutorkit_storage::{keys, Storage, StorageExt};

/// Owner of the session's [`ProgressState`].
///
/// Every mutating call writes the progress record before returning. Storage
/// failures are logged and swallowed: the in-memory state stays
/// authoritative for the rest of the session.
pub struct ProgressStore<S: Storage> {
    storage: Arc<Mutex<S>>,
    state: ProgressState,
}

impl<S: Storage> ProgressStore<S> {
    /// Create a store with empty state. Call [`load_user_progress`] to restore.
    ///
    /// [`load_user_progress`]: ProgressStore::load_user_progress
    pub fn new(storage: Arc<Mutex<S>>) -> Self {
        Self {
            storage,
            state: ProgressState::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Restore state from storage. A missing or unreadable record leaves
    /// the defaults in place.
    pub async fn load_user_progress(&mut self) {
        let loaded = self.storage.lock().await.load::<ProgressState>(keys::PROGRESS).await;
        match loaded {
            Ok(Some(state)) => {
                tracing::debug!(
                    completed = state.completed_tutorials.len(),
                    current = ?state.current_tutorial_id,
                    "progress loaded"
                );
                self.state = state;
            }
            Ok(None) => tracing::debug!("no saved progress"),
            Err(e) => tracing::warn!("failed to load progress, using defaults: {}", e),
        }
    }

    /// Save the full state, first syncing the step index of `current_tutorial`
    /// when it is the active one. Guided tours also get their per-tour record.
    pub async fn save_user_progress(
        &mut self,
        current_tutorial: Option<&TutorialDefinition>,
        current_step: usize,
    ) {
        if let Some(tutorial) = current_tutorial {
            if self.state.current_tutorial_id.as_ref() == Some(&tutorial.id) {
                self.state.current_step_index = current_step;
                self.state.guided_tour = tutorial.is_guided_tour();
            }
        }
        self.persist().await;
    }

    /// Begin a tutorial at step 0.
    pub async fn start_tutorial(&mut self, tutorial: &TutorialDefinition) {
        self.state.current_tutorial_id = Some(tutorial.id.clone());
        self.state.current_step_index = 0;
        self.state.start_time = Some(Utc::now());
        self.state.paused_time = None;
        self.state.step_attempts.clear();
        self.state.current_skipped_steps.clear();
        self.state.guided_tour = tutorial.is_guided_tour();

        tracing::info!(tutorial = %tutorial.id, "tutorial started");
        self.persist().await;
    }

    /// Mark a tutorial completed and clear the active tutorial.
    pub async fn complete_tutorial(&mut self, tutorial_id: &TutorialId) {
        self.state.completed_tutorials.insert(tutorial_id.clone());
        self.state.clear_current();

        tracing::info!(tutorial = %tutorial_id, "tutorial completed");
        self.persist().await;
    }

    /// Leave the active tutorial without completing it.
    pub async fn stop_tutorial(&mut self) {
        let Some(tutorial_id) = self.state.current_tutorial_id.clone() else {
            return;
        };
        self.state.clear_current();

        tracing::info!(tutorial = %tutorial_id, "tutorial stopped");
        self.persist().await;
    }

    /// Pause the active tutorial. Pausing again restarts the pause clock.
    pub async fn pause_tutorial(&mut self) {
        if !self.state.is_active() {
            tracing::debug!("pause ignored: no active tutorial");
            return;
        }
        self.state.paused_time = Some(Utc::now());
        self.persist().await;
    }

    /// Resume a paused tutorial. No-op when not paused.
    pub async fn resume_tutorial(&mut self) {
        if self.state.paused_time.take().is_none() {
            return;
        }
        self.persist().await;
    }

    /// Move to `index`. Bounds are the caller's responsibility.
    pub async fn advance_to_step(&mut self, index: usize) {
        self.state.current_step_index = index;
        tracing::debug!(step = index, "advanced to step");
        self.persist().await;
    }

    /// Remember that a step was skipped.
    pub async fn mark_step_as_skipped(&mut self, step_id: &StepId) {
        let mut changed = false;
        if !self.state.skipped_steps.contains(step_id) {
            self.state.skipped_steps.push(step_id.clone());
            changed = true;
        }
        if self.state.is_active() && !self.state.current_skipped_steps.contains(step_id) {
            self.state.current_skipped_steps.push(step_id.clone());
            changed = true;
        }
        if changed {
            self.persist().await;
        }
    }

    /// Count an attempt at a step of the active tutorial. During a guided
    /// tour the attempt time is recorded per step.
    pub async fn record_step_attempt(&mut self, step_id: &StepId) {
        *self.state.step_attempts.entry(step_id.clone()).or_insert(0) += 1;

        if self.state.guided_tour {
            if let Some(tour_id) = &self.state.current_tutorial_id {
                let key = keys::tour_step(tour_id.as_str(), step_id.as_str());
                let now = Utc::now();
                if let Err(e) = self.storage.lock().await.save(&key, &now).await {
                    tracing::warn!(key = %key, "failed to save step attempt time: {}", e);
                }
            }
        }
        self.persist().await;
    }

    /// Milliseconds spent in the active tutorial, 0 when none is active.
    pub fn elapsed_time(&self) -> u64 {
        self.elapsed_time_at(Utc::now())
    }

    /// Elapsed time as of `now`.
    ///
    /// Only the current pause span is deducted; once resumed, earlier pause
    /// spans count as elapsed again.
    pub fn elapsed_time_at(&self, now: Time) -> u64 {
        let Some(start) = self.state.start_time else {
            return 0;
        };
        if !self.state.is_active() {
            return 0;
        }
        let paused = self
            .state
            .paused_time
            .map(|p| now - p)
            .unwrap_or_else(chrono::Duration::zero);
        let elapsed = (now - start - paused).num_milliseconds();
        elapsed.max(0) as u64
    }

    /// Whether a tutorial has been completed.
    pub fn is_completed(&self, tutorial_id: &TutorialId) -> bool {
        self.state.completed_tutorials.contains(tutorial_id)
    }

    /// Summary view of the state.
    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary {
            completed_tutorials: self.state.completed_tutorials.iter().cloned().collect(),
            current_tutorial_id: self.state.current_tutorial_id.clone(),
            current_step: self.state.current_step_index,
            paused: self.state.is_paused(),
            skipped_steps: self.state.skipped_steps.clone(),
        }
    }

    /// Forget everything and delete the progress record.
    pub async fn reset_progress(&mut self) {
        self.state = ProgressState::default();
        if let Err(e) = self.storage.lock().await.remove(keys::PROGRESS).await {
            tracing::warn!("failed to delete progress record: {}", e);
        }
        tracing::info!("progress reset");
    }

    /// Read back the per-tour record.
    pub async fn load_tour_snapshot(&self, tour_id: &TutorialId) -> Option<TourSnapshot> {
        let key = keys::tour_progress(tour_id.as_str());
        match self.storage.lock().await.load(&key).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(key = %key, "failed to load tour snapshot: {}", e);
                None
            }
        }
    }

    /// When a tour step was last attempted.
    pub async fn last_step_attempt(&self, tour_id: &TutorialId, step_id: &StepId) -> Option<Time> {
        let key = keys::tour_step(tour_id.as_str(), step_id.as_str());
        match self.storage.lock().await.load(&key).await {
            Ok(at) => at,
            Err(e) => {
                tracing::warn!(key = %key, "failed to load step attempt time: {}", e);
                None
            }
        }
    }

    /// Write the state on teardown.
    pub async fn flush(&mut self) {
        self.persist().await;
    }

    async fn persist(&mut self) {
        let mut storage = self.storage.lock().await;
        if let Err(e) = storage.save(keys::PROGRESS, &self.state).await {
            tracing::warn!("failed to save progress: {}", e);
            return;
        }

        if !self.state.guided_tour {
            return;
        }
        if let Some(tour_id) = &self.state.current_tutorial_id {
            let snapshot = TourSnapshot::from_state(tour_id.clone(), &self.state, Utc::now());
            let key = keys::tour_progress(tour_id.as_str());
            if let Err(e) = storage.save(&key, &snapshot).await {
                tracing::warn!(key = %key, "failed to save tour snapshot: {}", e);
            }
        }
    }
}
