//! Completion and time-remaining estimation from recorded statistics.

use std::collections::BTreeSet;
use tutorkit_core::{StatsState, StepKey, TutorialDefinition, TutorialId};

/// Per-step estimate when neither history nor content provides one.
pub const DEFAULT_STEP_DURATION_MS: u64 = 60_000;

/// Derives rates and estimates from a [`StatsState`].
#[derive(Debug, Clone, Copy)]
pub struct CompletionEstimator {
    fallback_step_duration_ms: u64,
}

impl CompletionEstimator {
    /// Create an estimator with the given per-step fallback.
    pub fn new(fallback_step_duration_ms: u64) -> Self {
        Self {
            fallback_step_duration_ms,
        }
    }

    /// Percentage of a tutorial that is done.
    ///
    /// A completed tutorial is 100. Otherwise a step counts as done when its
    /// attempts exceed its failures.
    pub fn completion_rate(
        &self,
        stats: &StatsState,
        tutorial_id: &TutorialId,
        tutorial: &TutorialDefinition,
        completed: &BTreeSet<TutorialId>,
    ) -> f64 {
        if completed.contains(tutorial_id) {
            return 100.0;
        }
        let total = tutorial.steps.len();
        if total == 0 {
            return 0.0;
        }
        let done = tutorial
            .steps
            .iter()
            .filter(|step| {
                let key = StepKey::new(tutorial_id, &step.id);
                stats.attempts(&key) > stats.failures(&key)
            })
            .count();
        (done as f64 / total as f64) * 100.0
    }

    /// Percentage of a step's attempts that did not fail; 0 with no attempts.
    pub fn step_success_rate(&self, stats: &StatsState, key: &StepKey) -> f64 {
        let attempts = stats.attempts(key);
        if attempts == 0 {
            return 0.0;
        }
        let failures = stats.failures(key);
        (attempts.saturating_sub(failures) as f64 / attempts as f64) * 100.0
    }

    /// Milliseconds left from `current_step` to the end of the tutorial.
    ///
    /// Each remaining step contributes its recorded average when positive,
    /// else its authored estimate, else the fallback.
    pub fn time_remaining(
        &self,
        stats: &StatsState,
        tutorial_id: &TutorialId,
        tutorial: &TutorialDefinition,
        current_step: usize,
    ) -> u64 {
        let total: f64 = tutorial
            .steps
            .iter()
            .skip(current_step)
            .map(|step| {
                let key = StepKey::new(tutorial_id, &step.id);
                match stats.average_time(&key) {
                    Some(avg) if avg > 0.0 => avg,
                    _ => step
                        .estimated_duration
                        .unwrap_or(self.fallback_step_duration_ms) as f64,
                }
            })
            .sum();
        total.max(0.0).round() as u64
    }
}

impl Default for CompletionEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DURATION_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorkit_core::{StepDefinition, StepId};

    fn tutorial() -> TutorialDefinition {
        TutorialDefinition::new("t1", "Basics")
            .with_step(StepDefinition::new("s1", "One"))
            .with_step(StepDefinition::new("s2", "Two"))
            .with_step(StepDefinition::new("s3", "Three"))
            .with_step(StepDefinition::new("s4", "Four"))
    }

    fn key(step: &str) -> StepKey {
        StepKey::new(&TutorialId::new("t1"), &StepId::new(step))
    }

    #[test]
    fn test_completed_tutorial_is_100_regardless_of_counters() {
        let mut stats = StatsState::default();
        stats.step_attempt_counts.insert(key("s1"), 2);
        stats.step_failure_counts.insert(key("s1"), 5);
        let mut completed = BTreeSet::new();
        completed.insert(TutorialId::new("t1"));

        let rate = CompletionEstimator::default().completion_rate(
            &stats,
            &TutorialId::new("t1"),
            &tutorial(),
            &completed,
        );
        assert_eq!(rate, 100.0);
    }

    #[test]
    fn test_completion_rate_counts_steps_with_more_attempts_than_failures() {
        let mut stats = StatsState::default();
        stats.step_attempt_counts.insert(key("s1"), 3);
        stats.step_failure_counts.insert(key("s1"), 2);
        stats.step_attempt_counts.insert(key("s2"), 2);
        stats.step_failure_counts.insert(key("s2"), 2);

        let rate = CompletionEstimator::default().completion_rate(
            &stats,
            &TutorialId::new("t1"),
            &tutorial(),
            &BTreeSet::new(),
        );
        assert_eq!(rate, 25.0);
    }

    #[test]
    fn test_success_rate_zero_without_attempts() {
        let stats = StatsState::default();
        assert_eq!(CompletionEstimator::default().step_success_rate(&stats, &key("s1")), 0.0);
    }

    #[test]
    fn test_success_rate() {
        let mut stats = StatsState::default();
        stats.step_attempt_counts.insert(key("s1"), 4);
        stats.step_failure_counts.insert(key("s1"), 1);
        assert_eq!(CompletionEstimator::default().step_success_rate(&stats, &key("s1")), 75.0);
    }

    #[test]
    fn test_time_remaining_uses_fallback_per_step() {
        let stats = StatsState::default();
        let remaining = CompletionEstimator::default().time_remaining(
            &stats,
            &TutorialId::new("t1"),
            &tutorial(),
            1,
        );
        assert_eq!(remaining, 60_000 * 3);
    }

    #[test]
    fn test_time_remaining_prefers_history_then_authored_estimate() {
        let mut stats = StatsState::default();
        stats.step_average_times.insert(key("s2"), 1500.0);
        stats.step_average_times.insert(key("s3"), 0.0);
        let mut tutorial = tutorial();
        tutorial.steps[2].estimated_duration = Some(4000);

        let remaining = CompletionEstimator::new(10_000).time_remaining(
            &stats,
            &TutorialId::new("t1"),
            &tutorial,
            1,
        );
        assert_eq!(remaining, 1500 + 4000 + 10_000);
    }

    #[test]
    fn test_time_remaining_past_end_is_zero() {
        let remaining = CompletionEstimator::default().time_remaining(
            &StatsState::default(),
            &TutorialId::new("t1"),
            &tutorial(),
            10,
        );
        assert_eq!(remaining, 0);
    }
}
