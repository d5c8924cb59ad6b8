//! Pointwise Mutual Information
//!
//! Marginals are Laplace-smoothed, the joint probability is the raw
//! co-occurrence count over the number of possible unordered pairs.

use serde::{Deserialize, Serialize};

/// PMI of one term pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PmiScore {
    /// log2(p(a,b) / (p(a)·p(b))), 0 when any probability is 0
    pub pmi: f64,
    /// PMI / |log2 p(a,b)|, 0 when p(a,b) is 0 or 1
    pub normalized_pmi: f64,
    pub joint_probability: f64,
    pub probability_a: f64,
    pub probability_b: f64,
    pub cooccurrence: u64,
}

/// Inputs for one PMI computation
#[derive(Debug, Clone, Copy)]
pub struct PmiInputs {
    pub frequency_a: u64,
    pub frequency_b: u64,
    pub cooccurrence: u64,
    /// Total vocabulary N
    pub vocabulary_size: u64,
    /// Laplace ε
    pub smoothing: f64,
    /// Optional cap on N·(N-1)/2
    pub max_total_pairs: Option<u64>,
}

/// p(w) = (freq(w) + ε) / (N + ε·N)
pub fn smoothed_probability(frequency: u64, vocabulary_size: u64, smoothing: f64) -> f64 {
    let n = vocabulary_size as f64;
    let denom = n + smoothing * n;
    if denom <= 0.0 {
        return 0.0;
    }
    (frequency as f64 + smoothing) / denom
}

/// N·(N-1)/2, optionally capped
pub fn total_pairs(vocabulary_size: u64, cap: Option<u64>) -> f64 {
    let n = vocabulary_size as f64;
    let pairs = n * (n - 1.0) / 2.0;
    match cap {
        Some(cap) => pairs.min(cap as f64),
        None => pairs,
    }
    .max(0.0)
}

pub fn compute(inputs: PmiInputs) -> PmiScore {
    let p_a = smoothed_probability(inputs.frequency_a, inputs.vocabulary_size, inputs.smoothing);
    let p_b = smoothed_probability(inputs.frequency_b, inputs.vocabulary_size, inputs.smoothing);

    let pairs = total_pairs(inputs.vocabulary_size, inputs.max_total_pairs);
    let joint = if pairs > 0.0 {
        inputs.cooccurrence as f64 / pairs
    } else {
        0.0
    };

    let mut score = PmiScore {
        pmi: 0.0,
        normalized_pmi: 0.0,
        joint_probability: joint,
        probability_a: p_a,
        probability_b: p_b,
        cooccurrence: inputs.cooccurrence,
    };

    if joint <= 0.0 || p_a <= 0.0 || p_b <= 0.0 {
        return score;
    }

    score.pmi = (joint / (p_a * p_b)).log2();

    let denom = joint.log2().abs();
    score.normalized_pmi = if denom > f64::EPSILON { score.pmi / denom } else { 0.0 };

    score
}
