//! Style vocabulary
//!
//! The ordered list of style class names that gives meaning to each position
//! of a track's genre activation vector. Loaded once from the classifier
//! metadata document (`{"classes": [...]}`) and shared read-only afterwards.

use crate::{Error, Result};
use ahash::AHashMap;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Separator between parent genre and style, e.g. `Electronic---House`
pub const PARENT_SEPARATOR: &str = "---";

#[derive(Debug, Deserialize)]
struct VocabularyDocument {
    classes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StyleVocabulary {
    classes: Vec<String>,
    index: AHashMap<String, usize>,
}

impl StyleVocabulary {
    /// Build a vocabulary from class names, rejecting empty lists and duplicates
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(Error::schema("style vocabulary has no classes"));
        }

        let mut index = AHashMap::with_capacity(classes.len());
        for (idx, name) in classes.iter().enumerate() {
            if index.insert(name.clone(), idx).is_some() {
                return Err(Error::schema(format!(
                    "style vocabulary lists '{}' more than once",
                    name
                )));
            }
        }

        Ok(Self { classes, index })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: VocabularyDocument =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::new(doc.classes)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let vocabulary = Self::from_json_str(&json)?;
        info!(
            "Loaded style vocabulary from {:?}: {} classes",
            path,
            vocabulary.len()
        );
        Ok(vocabulary)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.classes
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.classes.get(idx).map(String::as_str)
    }

    /// Parent genre of a style name: the text before the first separator,
    /// or the whole name when it has none
    pub fn parent_genre(name: &str) -> &str {
        match name.find(PARENT_SEPARATOR) {
            Some(pos) => &name[..pos],
            None => name,
        }
    }

    /// Distinct parent genres in first-appearance order
    pub fn parent_genres(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for name in &self.classes {
            let parent = Self::parent_genre(name);
            if !seen.contains(&parent) {
                seen.push(parent);
            }
        }
        seen
    }
}
