//! Progress Tracking
//!
//! Tutorial progress state, step statistics and completion estimates.

#![warn(missing_docs)]

pub mod tracker;
pub mod stats;
pub mod estimator;

pub use tracker::ProgressStore;
pub use stats::{StatsStore, StepStatistics, TutorialStatistics};
pub use estimator::{CompletionEstimator, DEFAULT_STEP_DURATION_MS};
