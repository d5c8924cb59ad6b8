//! Shared data types
//!
//! What collaborators hand to the learner (content items) and what flows
//! between the statistics engine and the quality regression.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::GradeThresholds;

/// Number of regression features
pub const FEATURE_COUNT: usize = 9;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "length",
    "frequency",
    "relevance",
    "noise",
    "structure",
    "context_density",
    "semantic_coherence",
    "vocabulary_diversity",
    "statistical_complexity",
];

/// Fixed-length feature vector, each entry in [0, 1]
pub type FeatureVector = [f64; FEATURE_COUNT];

/// A candidate vocabulary item to score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// The text itself (also its identity in the training set)
    pub text: String,

    /// Terms observed alongside this item
    #[serde(default)]
    pub related_terms: Vec<String>,

    /// Known frequency, if the caller has one
    #[serde(default)]
    pub frequency: Option<u64>,

    /// Externally judged relevance in [0, 1]
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

impl ContentItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            related_terms: Vec::new(),
            frequency: None,
            relevance_score: None,
        }
    }

    pub fn with_related_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_frequency(mut self, frequency: u64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance_score = Some(relevance);
        self
    }
}

/// Association statistics for one item and its related terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSignals {
    /// Frequency of the item itself (floored)
    pub frequency: u64,
    /// Neighbors of the item in the association matrix
    pub neighbor_count: usize,
    /// Distinct terms across the neighborhoods of item + related terms
    pub distinct_neighbors: usize,
    /// Neighbor entries across those neighborhoods, duplicates included
    pub total_neighbors: usize,
    /// Number of related terms supplied
    pub related_count: usize,
    /// Mean normalized PMI between the item and its related terms, in [-1, 1]
    pub mean_npmi: f64,
    /// Mean significance confidence between the item and its related terms
    pub mean_confidence: f64,
}

/// Quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl Grade {
    /// Threshold lookup
    pub fn from_score(score: f64, thresholds: &GradeThresholds) -> Self {
        if score >= thresholds.excellent {
            Grade::Excellent
        } else if score >= thresholds.good {
            Grade::Good
        } else if score >= thresholds.acceptable {
            Grade::Acceptable
        } else {
            Grade::Poor
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Acceptable => "acceptable",
            Grade::Poor => "poor",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_thresholds() {
        let t = GradeThresholds::default();
        assert_eq!(Grade::from_score(0.95, &t), Grade::Excellent);
        assert_eq!(Grade::from_score(0.8, &t), Grade::Excellent);
        assert_eq!(Grade::from_score(0.6, &t), Grade::Good);
        assert_eq!(Grade::from_score(0.45, &t), Grade::Acceptable);
        assert_eq!(Grade::from_score(0.1, &t), Grade::Poor);
    }

    #[test]
    fn test_content_item_json_defaults() {
        let item: ContentItem = serde_json::from_str(r#"{"text": "猫"}"#).unwrap();
        assert_eq!(item, ContentItem::new("猫"));
    }
}
