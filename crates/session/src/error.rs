//! Session and catalog errors.

use tutorkit_core::TutorialId;

/// Errors raised while loading tutorial content.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Content file could not be read
    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),

    /// Content is not valid JSON
    #[error("invalid content: {0}")]
    Json(#[from] serde_json::Error),

    /// Two tutorials share an identifier
    #[error("duplicate tutorial id: {0}")]
    DuplicateId(TutorialId),
}

/// Errors raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No tutorial with this identifier is loaded
    #[error("tutorial not found: {0}")]
    TutorialNotFound(TutorialId),

    /// Some prerequisites have not been completed
    #[error("prerequisites not met for {tutorial}: {}", join(.missing))]
    PrerequisitesNotMet {
        /// Tutorial that was requested
        tutorial: TutorialId,
        /// Prerequisites still to complete
        missing: Vec<TutorialId>,
    },

    /// The operation needs an active tutorial
    #[error("no active tutorial")]
    NoActiveTutorial,

    /// Going back is disabled by configuration
    #[error("back navigation is disabled")]
    NavigationDisabled,

    /// Skipping is disabled by configuration
    #[error("skipping steps is disabled")]
    SkipDisabled,

    /// Requested step does not exist
    #[error("step {index} is out of range ({count} steps)")]
    StepOutOfRange {
        /// Requested index
        index: usize,
        /// Steps in the tutorial
        count: usize,
    },

    /// The host closed its action channel
    #[error("action channel closed")]
    ActionsClosed,
}

fn join(ids: &[TutorialId]) -> String {
    ids.iter().map(TutorialId::as_str).collect::<Vec<_>>().join(", ")
}
