//! Training Set - labeled feature vectors, one per distinct content item

use chrono::{DateTime, Utc};
use lexa_core::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One labeled observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Identity of the content the features came from
    pub content_key: String,
    pub features: FeatureVector,
    /// Observed quality in [0, 1]
    pub target_quality: f64,
    pub timestamp: DateTime<Utc>,
}

impl TrainingSample {
    pub fn new(content_key: impl Into<String>, features: FeatureVector, target_quality: f64) -> Self {
        Self {
            content_key: content_key.into(),
            features,
            target_quality: target_quality.clamp(0.0, 1.0),
            timestamp: Utc::now(),
        }
    }
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New content; holds the sample count after the insert
    Inserted(usize),
    /// Known content; its sample was replaced in place
    Replaced,
}

/// Ordered samples, deduplicated by content identity
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    samples: Vec<TrainingSample>,
    /// content key → position in `samples`
    positions: HashMap<String, usize>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted samples; later duplicates win
    pub fn from_samples(samples: Vec<TrainingSample>) -> Self {
        let mut set = Self::new();
        for sample in samples {
            set.upsert(sample);
        }
        set
    }

    /// Replace the sample for known content, append otherwise
    pub fn upsert(&mut self, sample: TrainingSample) -> Upsert {
        match self.positions.get(&sample.content_key) {
            Some(&pos) => {
                self.samples[pos] = sample;
                Upsert::Replaced
            }
            None => {
                self.positions
                    .insert(sample.content_key.clone(), self.samples.len());
                self.samples.push(sample);
                Upsert::Inserted(self.samples.len())
            }
        }
    }

    pub fn get(&self, content_key: &str) -> Option<&TrainingSample> {
        self.positions.get(content_key).map(|&pos| &self.samples[pos])
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.positions.clear();
    }
}
