use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::artifact::ArtifactError;

/// Ordered set of distinct label strings.
///
/// Labels are appended in first-seen order over the eligible record stream;
/// a label's position is its integer class index for the whole lifetime of
/// the trained model. The persisted form is a plain JSON array of strings
/// whose array position is the authoritative class index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the class index for `label`, appending it first if unseen.
    pub fn intern(&mut self, label: &str) -> usize {
        if let Some(&idx) = self.index.get(label) {
            return idx;
        }
        let idx = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), idx);
        idx
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<String> {
        self.labels
    }

    /// Rebuilds a vocabulary from an ordered label list.
    pub fn from_labels(labels: Vec<String>) -> Self {
        let index = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        Self { labels, index }
    }

    /// Writes the vocabulary as a JSON array of strings.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.labels)?;
        Ok(())
    }

    /// Loads a vocabulary persisted by [`LabelVocabulary::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let file = File::open(path)?;
        let labels: Vec<String> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::from_labels(labels))
    }
}
