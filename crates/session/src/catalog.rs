//! Tutorial catalog - the loaded content, shared immutably.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tutorkit_core::{TutorialDefinition, TutorialId};

use crate::error::CatalogError;

/// Content file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialContent {
    /// Standard tutorials
    #[serde(default)]
    pub tutorials: Vec<TutorialDefinition>,

    /// Guided tours
    #[serde(default)]
    pub guided_tours: Vec<TutorialDefinition>,
}

/// Loaded tutorials in authored order.
#[derive(Debug, Clone, Default)]
pub struct TutorialCatalog {
    tutorials: Vec<Arc<TutorialDefinition>>,
    index: HashMap<TutorialId, usize>,
}

impl TutorialCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from parsed content. Guided tours are tagged as such.
    pub fn from_content(content: TutorialContent) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for tutorial in content.tutorials {
            catalog.insert(tutorial)?;
        }
        for tour in content.guided_tours {
            catalog.insert(tour.into_guided_tour())?;
        }
        Ok(catalog)
    }

    /// Parse content JSON.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::from_content(serde_json::from_str(json)?)
    }

    /// Read and parse a content file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), tutorials = catalog.len(), "content loaded");
        Ok(catalog)
    }

    /// Add a tutorial.
    pub fn insert(&mut self, tutorial: TutorialDefinition) -> Result<(), CatalogError> {
        if self.index.contains_key(&tutorial.id) {
            return Err(CatalogError::DuplicateId(tutorial.id));
        }
        self.index.insert(tutorial.id.clone(), self.tutorials.len());
        self.tutorials.push(Arc::new(tutorial));
        Ok(())
    }

    /// Look up a tutorial.
    pub fn get(&self, id: &TutorialId) -> Option<&Arc<TutorialDefinition>> {
        self.index.get(id).map(|&i| &self.tutorials[i])
    }

    /// All tutorials, in authored order.
    pub fn iter(&self) -> impl Iterator<Item = &TutorialDefinition> {
        self.tutorials.iter().map(|t| t.as_ref())
    }

    /// Number of tutorials.
    pub fn len(&self) -> usize {
        self.tutorials.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tutorials.is_empty()
    }
}
