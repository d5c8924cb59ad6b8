//! Composite pair quality
//!
//! Blend of association strength (normalized PMI), statistical confidence,
//! raw frequency magnitude and an externally supplied part-of-speech overlap.

use lexa_core::QualityWeights;
use serde::{Deserialize, Serialize};

/// Per-component values, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityComponents {
    pub pmi: f64,
    pub significance: f64,
    pub frequency: f64,
    pub pos: f64,
}

/// Composite quality with its breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub score: f64,
    pub components: QualityComponents,
    pub weights: QualityWeights,
}

/// Map normalized PMI from [-1, 1] onto [0, 1]
pub fn pmi_quality(normalized_pmi: f64) -> f64 {
    ((normalized_pmi + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// min(1, sqrt(freq_a·freq_b) / scale)
pub fn frequency_quality(frequency_a: u64, frequency_b: u64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    ((frequency_a as f64 * frequency_b as f64).sqrt() / scale).min(1.0)
}

pub fn compose(components: QualityComponents, weights: QualityWeights) -> QualityScore {
    let score = components.pmi * weights.pmi
        + components.significance * weights.significance
        + components.frequency * weights.frequency
        + components.pos * weights.pos;

    QualityScore {
        score: score.clamp(0.0, 1.0),
        components,
        weights,
    }
}
