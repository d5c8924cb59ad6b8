//! Improvement suggestions for weak features

use lexa_core::{FeatureVector, FEATURE_NAMES};
use serde::Serialize;

/// One actionable hint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub feature: &'static str,
    /// Current feature value
    pub value: f64,
    /// Estimated score gain from fixing it
    pub impact: f64,
    pub message: &'static str,
}

fn message_for(index: usize) -> &'static str {
    match index {
        0 => "Keep the item between 4 and 12 characters",
        1 => "Prefer terms that occur more often in the corpus",
        2 => "Choose an item closer to the current topic",
        3 => "Drop filler characters and punctuation",
        4 => "Mix character types for a richer structure",
        5 => "Use terms with more observed co-occurrences",
        6 => "Pair the item with terms it is strongly associated with",
        7 => "Broaden the related terms to reach more distinct neighbors",
        _ => "Prefer longer items with significant associations",
    }
}

/// Features below `threshold`, biggest estimated impact first
///
/// With trained weights the impact is |w|·(1 - value); without, the deficit alone.
pub fn suggest(features: &FeatureVector, weights: Option<&[f64]>, threshold: f64) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = features
        .iter()
        .enumerate()
        .filter(|(_, value)| **value < threshold)
        .map(|(i, value)| {
            let deficit = 1.0 - value;
            let impact = match weights {
                Some(w) => w.get(i + 1).map(|w| w.abs()).unwrap_or(0.0) * deficit,
                None => deficit,
            };
            Suggestion {
                feature: FEATURE_NAMES[i],
                value: *value,
                impact,
                message: message_for(i),
            }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.impact
            .partial_cmp(&a.impact)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_weak_features() {
        let mut features = [0.9; 9];
        features[3] = 0.2;
        features[0] = 0.4;

        let s = suggest(&features, None, 0.5);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].feature, "noise");
        assert_eq!(s[1].feature, "length");
    }

    #[test]
    fn test_weights_reorder_by_impact() {
        let mut features = [0.9; 9];
        features[3] = 0.2; // deficit 0.8
        features[0] = 0.4; // deficit 0.6
        let mut weights = vec![0.0; 10];
        weights[1] = 1.0; // length matters
        weights[4] = 0.1; // noise barely does

        let s = suggest(&features, Some(&weights), 0.5);
        assert_eq!(s[0].feature, "length");
    }
}
