//! Tutorkit core data models.
//!
//! This crate defines the content, progress, statistics and validation
//! structures shared by every tutorial component.

#![warn(missing_docs)]

// Identities
mod id;

// Content
mod tutorial;

// Mutable state
mod progress;
mod stats;

// Validation and events
mod validation;
mod event;

mod config;

pub mod assoc;

// Re-exports
pub use id::*;

pub use tutorial::{
    ActionType, Difficulty, StepAction, StepDefinition, TutorialDefinition, TutorialKind,
    DEFAULT_WAIT_EVENT,
};
pub use progress::{ProgressState, ProgressSummary, TourSnapshot};
pub use stats::{StatsState, TutorialAction, TutorialAttempts};
pub use validation::{names, ActionResult, BubbleState, ValidationResult, ValidatorName};
pub use event::TutorialEvent;
pub use config::{ConfigError, TutorialConfig};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
