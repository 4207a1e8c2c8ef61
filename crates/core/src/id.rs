//! Identifiers for tutorials, steps and sessions.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of a tutorial (or guided tour), as authored in content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorialId(String);

impl TutorialId {
    /// Create a tutorial ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TutorialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TutorialId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TutorialId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a step within a tutorial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Create a step ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Key of the per-step statistics maps: `"<tutorialId>_<stepId>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepKey(String);

impl StepKey {
    /// Build the key for a step of a tutorial.
    pub fn new(tutorial_id: &TutorialId, step_id: &StepId) -> Self {
        Self(format!("{}_{}", tutorial_id, step_id))
    }

    /// Borrow the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a tutorial session (one process lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Ulid);

impl SessionId {
    /// Generate a new SessionId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tutorial_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_key_format() {
        let key = StepKey::new(&TutorialId::new("basic-tutorial"), &StepId::new("pop"));
        assert_eq!(key.as_str(), "basic-tutorial_pop");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&TutorialId::new("t1")).unwrap();
        assert_eq!(json, "\"t1\"");
        let step: StepId = serde_json::from_str("\"s1\"").unwrap();
        assert_eq!(step, StepId::new("s1"));
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert!(SessionId::new().to_string().starts_with("tutorial_"));
    }
}
