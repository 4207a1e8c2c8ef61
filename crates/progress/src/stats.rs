//! Statistics store - per-step timing, attempt, skip and failure counters.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tutorkit_core::{
    StatsState, StepId, StepKey, Time, TutorialAction, TutorialAttempts, TutorialConfig,
    TutorialDefinition, TutorialId,
};
use tutorkit_storage::{keys, Storage, StorageExt};

use crate::estimator::CompletionEstimator;

/// Aggregate statistics across all tutorials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorialStatistics {
    /// Tutorials known to the host
    pub total_tutorials: usize,

    /// Tutorials completed
    pub completed_tutorials: usize,

    /// `completed / total * 100`
    pub completion_rate: f64,

    /// Active tutorial
    pub current_tutorial: Option<TutorialId>,

    /// Completion rate of the active tutorial
    pub current_tutorial_progress: Option<f64>,

    /// Accumulated step time, in milliseconds
    pub total_time_spent: u64,

    /// Blended step durations
    pub step_average_times: BTreeMap<StepKey, f64>,

    /// Skips per step
    pub step_skip_counts: BTreeMap<StepKey, u32>,

    /// Tutorial-level counters
    pub tutorial_attempts: BTreeMap<TutorialId, TutorialAttempts>,
}

/// Per-step breakdown of one tutorial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepStatistics {
    /// Step identifier
    pub step_id: StepId,

    /// Step title
    pub title: String,

    /// Blended duration, if any attempt was recorded
    pub average_time: Option<f64>,

    /// Attempts
    pub attempts: u32,

    /// Skips
    pub skip_count: u32,

    /// Failures
    pub failure_count: u32,

    /// `(attempts - failures) / attempts * 100`, 0 without attempts
    pub success_rate: f64,
}

/// Owner of the session's [`StatsState`].
///
/// Step updates autosave once the configured interval has passed since the
/// previous save. Storage failures are logged and swallowed.
pub struct StatsStore<S: Storage> {
    storage: Arc<Mutex<S>>,
    state: StatsState,
    estimator: CompletionEstimator,
    autosave_interval: chrono::Duration,
    last_saved: Time,
}

impl<S: Storage> StatsStore<S> {
    /// Create a store with empty state.
    pub fn new(storage: Arc<Mutex<S>>, config: &TutorialConfig) -> Self {
        Self {
            storage,
            state: StatsState::default(),
            estimator: CompletionEstimator::new(config.fallback_step_duration_ms),
            autosave_interval: config.stats_autosave_interval(),
            last_saved: Utc::now(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &StatsState {
        &self.state
    }

    /// Restore state from storage. A missing or unreadable record leaves
    /// the defaults in place.
    pub async fn load_stats(&mut self) {
        let loaded = self.storage.lock().await.load::<StatsState>(keys::STATS).await;
        match loaded {
            Ok(Some(state)) => {
                tracing::debug!(steps = state.step_attempt_counts.len(), "stats loaded");
                self.state = state;
            }
            Ok(None) => tracing::debug!("no saved stats"),
            Err(e) => tracing::warn!("failed to load stats, using defaults: {}", e),
        }
    }

    /// Write the stats record.
    pub async fn save_stats(&mut self) {
        let result = self.storage.lock().await.save(keys::STATS, &self.state).await;
        match result {
            Ok(()) => self.last_saved = Utc::now(),
            Err(e) => tracing::warn!("failed to save stats: {}", e),
        }
    }

    /// Record the outcome of one step attempt.
    ///
    /// The stored duration is the previous value blended 50/50 with the new
    /// one, not a cumulative mean.
    pub async fn update_step_stats(
        &mut self,
        step_id: &StepId,
        tutorial_id: &TutorialId,
        duration_ms: u64,
        success: bool,
        skipped: bool,
    ) {
        let key = StepKey::new(tutorial_id, step_id);
        let duration = duration_ms as f64;

        let average = match self.state.step_average_times.get(&key) {
            Some(previous) => (previous + duration) / 2.0,
            None => duration,
        };
        self.state.step_average_times.insert(key.clone(), average);

        *self.state.step_attempt_counts.entry(key.clone()).or_insert(0) += 1;
        if skipped {
            *self.state.step_skip_counts.entry(key.clone()).or_insert(0) += 1;
        }
        if !success {
            *self.state.step_failure_counts.entry(key.clone()).or_insert(0) += 1;
        }
        self.state.total_time = self.state.total_time.saturating_add(duration_ms);

        let now = Utc::now();
        self.state.last_updated = Some(now);

        tracing::debug!(
            step = %key,
            duration_ms,
            success,
            skipped,
            average,
            "step stats updated"
        );

        if now - self.last_saved > self.autosave_interval {
            self.save_stats().await;
        }
    }

    /// Count a tutorial-level action, independent of the step counters.
    pub async fn record_tutorial_attempt(
        &mut self,
        tutorial_id: &TutorialId,
        action: TutorialAction,
        metadata: Option<serde_json::Value>,
    ) {
        let now = Utc::now();
        self.state
            .tutorial_attempts
            .entry(tutorial_id.clone())
            .or_default()
            .record(action, metadata, now);
        self.state.last_updated = Some(now);

        tracing::info!(tutorial = %tutorial_id, action = action.as_str(), "tutorial attempt recorded");
        self.save_stats().await;
    }

    /// Tutorial-level counters for one tutorial.
    pub fn tutorial_attempts(&self, tutorial_id: &TutorialId) -> TutorialAttempts {
        self.state
            .tutorial_attempts
            .get(tutorial_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Aggregate view across all tutorials.
    pub fn get_tutorial_statistics<'a>(
        &self,
        all_tutorials: impl IntoIterator<Item = &'a TutorialDefinition>,
        completed: &BTreeSet<TutorialId>,
        current_tutorial_id: Option<&TutorialId>,
        current_tutorial: Option<&TutorialDefinition>,
    ) -> TutorialStatistics {
        let total_tutorials = all_tutorials.into_iter().count();
        let completion_rate = if total_tutorials > 0 {
            (completed.len() as f64 / total_tutorials as f64) * 100.0
        } else {
            0.0
        };

        let current_tutorial_progress = match (current_tutorial_id, current_tutorial) {
            (Some(id), Some(tutorial)) => {
                Some(self.calculate_completion_rate(id, tutorial, completed))
            }
            _ => None,
        };

        TutorialStatistics {
            total_tutorials,
            completed_tutorials: completed.len(),
            completion_rate,
            current_tutorial: current_tutorial_id.cloned(),
            current_tutorial_progress,
            total_time_spent: self.state.total_time,
            step_average_times: self.state.step_average_times.clone(),
            step_skip_counts: self.state.step_skip_counts.clone(),
            tutorial_attempts: self.state.tutorial_attempts.clone(),
        }
    }

    /// Per-step breakdown of one tutorial.
    pub fn get_step_statistics(
        &self,
        tutorial_id: &TutorialId,
        tutorial: &TutorialDefinition,
    ) -> Vec<StepStatistics> {
        tutorial
            .steps
            .iter()
            .map(|step| {
                let key = StepKey::new(tutorial_id, &step.id);
                let attempts = self.state.attempts(&key);
                StepStatistics {
                    step_id: step.id.clone(),
                    title: step.title.clone(),
                    average_time: if attempts > 0 { self.state.average_time(&key) } else { None },
                    attempts,
                    skip_count: self.state.skips(&key),
                    failure_count: self.state.failures(&key),
                    success_rate: self.estimator.step_success_rate(&self.state, &key),
                }
            })
            .collect()
    }

    /// Percentage of a step's attempts that did not fail.
    pub fn calculate_step_success_rate(&self, tutorial_id: &TutorialId, step_id: &StepId) -> f64 {
        self.estimator
            .step_success_rate(&self.state, &StepKey::new(tutorial_id, step_id))
    }

    /// Percentage of a tutorial that is done.
    pub fn calculate_completion_rate(
        &self,
        tutorial_id: &TutorialId,
        tutorial: &TutorialDefinition,
        completed: &BTreeSet<TutorialId>,
    ) -> f64 {
        self.estimator
            .completion_rate(&self.state, tutorial_id, tutorial, completed)
    }

    /// Milliseconds left from `current_step` to the end.
    pub fn calculate_estimated_time_remaining(
        &self,
        tutorial_id: &TutorialId,
        tutorial: &TutorialDefinition,
        current_step: usize,
    ) -> u64 {
        self.estimator
            .time_remaining(&self.state, tutorial_id, tutorial, current_step)
    }

    /// Clear every counter and delete the stats record.
    pub async fn reset_stats(&mut self) {
        self.state = StatsState::default();
        if let Err(e) = self.storage.lock().await.remove(keys::STATS).await {
            tracing::warn!("failed to delete stats record: {}", e);
        }
        tracing::info!("stats reset");
    }

    /// Write the state on teardown.
    pub async fn flush(&mut self) {
        self.save_stats().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorkit_core::StepDefinition;
    use tutorkit_storage::MemoryStorage;

    fn store() -> (Arc<Mutex<MemoryStorage>>, StatsStore<MemoryStorage>) {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        let store = StatsStore::new(storage.clone(), &TutorialConfig::default());
        (storage, store)
    }

    fn ids() -> (StepId, TutorialId) {
        (StepId::new("s1"), TutorialId::new("t1"))
    }

    #[tokio::test]
    async fn test_two_sample_blend() {
        let (_, mut store) = store();
        let (s1, t1) = ids();
        store.update_step_stats(&s1, &t1, 1000, true, false).await;
        store.update_step_stats(&s1, &t1, 3000, true, false).await;

        let key = StepKey::new(&t1, &s1);
        assert_eq!(store.state().average_time(&key), Some(2000.0));
        assert_eq!(store.state().attempts(&key), 2);
        assert_eq!(store.state().failures(&key), 0);
        assert_eq!(store.state().total_time, 4000);
    }

    #[tokio::test]
    async fn test_blend_is_not_a_cumulative_mean() {
        let (_, mut store) = store();
        let (s1, t1) = ids();
        for duration in [1000, 1000, 4000] {
            store.update_step_stats(&s1, &t1, duration, true, false).await;
        }
        assert_eq!(store.state().average_time(&StepKey::new(&t1, &s1)), Some(2500.0));
    }

    #[tokio::test]
    async fn test_skip_and_failure_counters() {
        let (_, mut store) = store();
        let (s1, t1) = ids();
        store.update_step_stats(&s1, &t1, 500, false, false).await;
        store.update_step_stats(&s1, &t1, 500, false, true).await;
        store.update_step_stats(&s1, &t1, 500, true, false).await;

        let key = StepKey::new(&t1, &s1);
        assert_eq!(store.state().attempts(&key), 3);
        assert_eq!(store.state().failures(&key), 2);
        assert_eq!(store.state().skips(&key), 1);
        let rate = store.calculate_step_success_rate(&t1, &s1);
        assert!((rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_autosave_within_interval() {
        let (storage, mut store) = store();
        let (s1, t1) = ids();
        store.update_step_stats(&s1, &t1, 1000, true, false).await;
        assert!(storage.lock().await.read(keys::STATS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_autosave_after_interval() {
        let (storage, mut store) = store();
        let (s1, t1) = ids();
        store.last_saved = Utc::now() - chrono::Duration::minutes(6);
        store.update_step_stats(&s1, &t1, 1000, true, false).await;

        let saved: StatsState = storage.lock().await.load(keys::STATS).await.unwrap().unwrap();
        assert_eq!(saved.attempts(&StepKey::new(&t1, &s1)), 1);
        assert!(Utc::now() - store.last_saved < chrono::Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_save_then_load_reproduces_maps() {
        let (storage, mut store) = store();
        let t1 = TutorialId::new("t1");
        store.update_step_stats(&StepId::new("a"), &t1, 1200, true, false).await;
        store.update_step_stats(&StepId::new("b"), &t1, 800, false, true).await;
        store.record_tutorial_attempt(&t1, TutorialAction::Start, None).await;
        store.save_stats().await;

        let mut fresh = StatsStore::new(storage, &TutorialConfig::default());
        fresh.load_stats().await;

        assert_eq!(fresh.state().step_average_times, store.state().step_average_times);
        assert_eq!(fresh.state().step_skip_counts, store.state().step_skip_counts);
        assert_eq!(fresh.state().step_failure_counts, store.state().step_failure_counts);
        assert_eq!(fresh.state().step_attempt_counts, store.state().step_attempt_counts);
        assert_eq!(fresh.tutorial_attempts(&t1).start, 1);
    }

    #[tokio::test]
    async fn test_tutorial_attempts_are_separate_from_steps() {
        let (_, mut store) = store();
        let t1 = TutorialId::new("t1");
        store.record_tutorial_attempt(&t1, TutorialAction::Start, None).await;
        store
            .record_tutorial_attempt(&t1, TutorialAction::Skip, Some(serde_json::json!({"at_step": 2})))
            .await;

        let attempts = store.tutorial_attempts(&t1);
        assert_eq!(attempts.start, 1);
        assert_eq!(attempts.skip, 1);
        assert_eq!(attempts.last_metadata, Some(serde_json::json!({"at_step": 2})));
        assert!(store.state().step_attempt_counts.is_empty());
    }

    #[tokio::test]
    async fn test_tutorial_statistics() {
        let (_, mut store) = store();
        let t1 = TutorialDefinition::new("t1", "One")
            .with_step(StepDefinition::new("a", "A"))
            .with_step(StepDefinition::new("b", "B"));
        let t2 = TutorialDefinition::new("t2", "Two");
        store.update_step_stats(&StepId::new("a"), &t1.id, 1000, true, false).await;

        let mut completed = BTreeSet::new();
        completed.insert(t2.id.clone());

        let stats = store.get_tutorial_statistics([&t1, &t2], &completed, Some(&t1.id), Some(&t1));
        assert_eq!(stats.total_tutorials, 2);
        assert_eq!(stats.completed_tutorials, 1);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.current_tutorial_progress, Some(50.0));
        assert_eq!(stats.total_time_spent, 1000);
    }

    #[tokio::test]
    async fn test_tutorial_statistics_with_no_tutorials() {
        let (_, store) = store();
        let stats = store.get_tutorial_statistics(std::iter::empty(), &BTreeSet::new(), None, None);
        assert_eq!(stats.completion_rate, 0.0);
        assert!(stats.current_tutorial_progress.is_none());
    }

    #[tokio::test]
    async fn test_step_statistics() {
        let (_, mut store) = store();
        let tutorial = TutorialDefinition::new("t1", "One")
            .with_step(StepDefinition::new("a", "A"))
            .with_step(StepDefinition::new("b", "B"));
        store.update_step_stats(&StepId::new("a"), &tutorial.id, 1000, true, false).await;
        store.update_step_stats(&StepId::new("a"), &tutorial.id, 2000, false, false).await;

        let steps = store.get_step_statistics(&tutorial.id, &tutorial);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].attempts, 2);
        assert_eq!(steps[0].failure_count, 1);
        assert_eq!(steps[0].success_rate, 50.0);
        assert_eq!(steps[0].average_time, Some(1500.0));
        assert_eq!(steps[1].attempts, 0);
        assert_eq!(steps[1].success_rate, 0.0);
        assert!(steps[1].average_time.is_none());
    }

    #[tokio::test]
    async fn test_estimated_time_remaining_fallback() {
        let (_, store) = store();
        let tutorial = TutorialDefinition::new("t1", "One")
            .with_step(StepDefinition::new("a", "A"))
            .with_step(StepDefinition::new("b", "B"))
            .with_step(StepDefinition::new("c", "C"));
        let remaining = store.calculate_estimated_time_remaining(&tutorial.id, &tutorial, 0);
        assert_eq!(remaining, 60_000 * 3);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (storage, mut store) = store();
        let (s1, t1) = ids();
        store.update_step_stats(&s1, &t1, 1000, false, true).await;
        store.save_stats().await;

        store.reset_stats().await;

        assert_eq!(store.state(), &StatsState::default());
        assert!(storage.lock().await.read(keys::STATS).await.unwrap().is_none());
    }
}
