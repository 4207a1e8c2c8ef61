//! Live game state the validators query.

use std::collections::HashMap;
use tutorkit_core::BubbleState;

/// Read-only view of the running game.
///
/// Every query answers `None` when the backing object is not available;
/// validators turn that into a failure message.
pub trait LiveState: Send + Sync {
    /// Look up a bubble by identifier.
    fn bubble(&self, id: &str) -> Option<BubbleState>;

    /// Current combo counter.
    fn combo_count(&self) -> Option<u32>;

    /// Current score.
    fn score(&self) -> Option<u64>;

    /// Identifier of the active scene.
    fn current_scene(&self) -> Option<String>;

    /// Current value of a named setting.
    fn setting(&self, key: &str) -> Option<serde_json::Value>;
}

/// Live state for a host that has not wired a game in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedState;

impl LiveState for DisconnectedState {
    fn bubble(&self, _id: &str) -> Option<BubbleState> {
        None
    }

    fn combo_count(&self) -> Option<u32> {
        None
    }

    fn score(&self) -> Option<u64> {
        None
    }

    fn current_scene(&self) -> Option<String> {
        None
    }

    fn setting(&self, _key: &str) -> Option<serde_json::Value> {
        None
    }
}

/// A fixed picture of the game, captured by the host.
#[derive(Debug, Clone, Default)]
pub struct SnapshotState {
    /// Bubbles by identifier
    pub bubbles: HashMap<String, BubbleState>,

    /// Combo counter
    pub combo: Option<u32>,

    /// Score
    pub score: Option<u64>,

    /// Active scene
    pub scene: Option<String>,

    /// Settings by key
    pub settings: HashMap<String, serde_json::Value>,
}

impl SnapshotState {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bubble.
    pub fn with_bubble(mut self, id: &str, bubble_type: &str, is_popped: bool) -> Self {
        self.bubbles.insert(
            id.to_string(),
            BubbleState {
                id: id.to_string(),
                bubble_type: bubble_type.to_string(),
                is_popped,
            },
        );
        self
    }

    /// Set the combo counter.
    pub fn with_combo(mut self, combo: u32) -> Self {
        self.combo = Some(combo);
        self
    }

    /// Set the score.
    pub fn with_score(mut self, score: u64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the active scene.
    pub fn with_scene(mut self, scene: &str) -> Self {
        self.scene = Some(scene.to_string());
        self
    }

    /// Set a setting value.
    pub fn with_setting(mut self, key: &str, value: serde_json::Value) -> Self {
        self.settings.insert(key.to_string(), value);
        self
    }
}

impl LiveState for SnapshotState {
    fn bubble(&self, id: &str) -> Option<BubbleState> {
        self.bubbles.get(id).cloned()
    }

    fn combo_count(&self) -> Option<u32> {
        self.combo
    }

    fn score(&self) -> Option<u64> {
        self.score
    }

    fn current_scene(&self) -> Option<String> {
        self.scene.clone()
    }

    fn setting(&self, key: &str) -> Option<serde_json::Value> {
        self.settings.get(key).cloned()
    }
}
