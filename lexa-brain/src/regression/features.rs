//! Feature Extraction - nine numbers describing a vocabulary item
//!
//! ## Feature Vector
//!
//! 0. **Length**: peaks at 4–12 characters, 0.1 outside [2, 20]
//! 1. **Frequency**: log-scaled corpus frequency
//! 2. **Relevance**: caller-supplied, 0.5 when unknown
//! 3. **Noise** (inverted): share of filler characters and punctuation
//! 4. **Structure**: character-class diversity plus a length bonus
//! 5. **Context density**: neighbor count + significance confidence
//! 6. **Semantic coherence**: normalized PMI + significance confidence
//! 7. **Vocabulary diversity**: related terms + distinct-neighbor ratio
//! 8. **Statistical complexity**: length + significance confidence
//!
//! Every entry is clamped to [0, 1].

use lexa_core::config::FeatureWeights;
use lexa_core::{ContentItem, FeatureVector, StatisticalSignals, FEATURE_COUNT};

use crate::statistics::quality::pmi_quality;

pub const LENGTH: usize = 0;
pub const FREQUENCY: usize = 1;
pub const RELEVANCE: usize = 2;
pub const NOISE: usize = 3;
pub const STRUCTURE: usize = 4;
pub const CONTEXT_DENSITY: usize = 5;
pub const SEMANTIC_COHERENCE: usize = 6;
pub const VOCABULARY_DIVERSITY: usize = 7;
pub const STATISTICAL_COMPLEXITY: usize = 8;

/// Characters treated as filler on top of ASCII punctuation and whitespace
const FILLER_CHARS: [char; 14] = [
    '、', '。', '！', '？', '…', '・', '〜', '～', '「', '」', '（', '）', '『', '』',
];

/// Turns content + association signals into a feature vector
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    weights: FeatureWeights,
}

impl FeatureExtractor {
    pub fn new(weights: FeatureWeights) -> Self {
        Self { weights }
    }

    pub fn extract(&self, content: &ContentItem, signals: &StatisticalSignals) -> FeatureVector {
        let w = &self.weights;
        let text = content.text.as_str();
        let len = text.chars().count();
        let confidence = signals.mean_confidence.clamp(0.0, 1.0);

        let mut features = [0.0; FEATURE_COUNT];

        features[LENGTH] = length_score(len);

        let frequency = content.frequency.unwrap_or(signals.frequency);
        features[FREQUENCY] = frequency_score(frequency, w.frequency_reference);

        features[RELEVANCE] = content.relevance_score.unwrap_or(0.5);

        features[NOISE] = noise_score(text, w.noise_penalty);

        features[STRUCTURE] = structure_score(text);

        features[CONTEXT_DENSITY] = w.density_neighbors
            * saturate(signals.neighbor_count as f64, w.neighbor_saturation)
            + w.density_confidence * confidence;

        features[SEMANTIC_COHERENCE] =
            w.coherence_pmi * pmi_quality(signals.mean_npmi) + w.coherence_confidence * confidence;

        let distinct_ratio = if signals.total_neighbors > 0 {
            signals.distinct_neighbors as f64 / signals.total_neighbors as f64
        } else {
            0.0
        };
        features[VOCABULARY_DIVERSITY] = w.diversity_related
            * saturate(signals.related_count as f64, w.related_saturation)
            + w.diversity_distinct * distinct_ratio;

        features[STATISTICAL_COMPLEXITY] =
            w.complexity_length * saturate(len as f64, 20.0) + w.complexity_confidence * confidence;

        for f in features.iter_mut() {
            *f = if f.is_finite() { f.clamp(0.0, 1.0) } else { 0.0 };
        }
        features
    }
}

fn saturate(value: f64, at: f64) -> f64 {
    if at <= 0.0 {
        return 0.0;
    }
    (value / at).min(1.0)
}

/// 1.0 on [4, 12], linear down to 0.1 at 2 and 20, 0.1 beyond
pub fn length_score(len: usize) -> f64 {
    match len {
        4..=12 => 1.0,
        0 | 1 => 0.1,
        2 | 3 => 0.1 + 0.9 * (len as f64 - 2.0) / 2.0,
        13..=20 => 1.0 - 0.9 * (len as f64 - 12.0) / 8.0,
        _ => 0.1,
    }
}

/// ln(1 + freq) / ln(1 + reference)
pub fn frequency_score(frequency: u64, reference: f64) -> f64 {
    let denom = (1.0 + reference.max(0.0)).ln();
    if denom <= 0.0 {
        return 0.0;
    }
    ((1.0 + frequency as f64).ln() / denom).clamp(0.0, 1.0)
}

fn is_noise(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_whitespace() || FILLER_CHARS.contains(&c)
}

/// 1 - penalty · (noise characters / characters)
pub fn noise_score(text: &str, penalty: f64) -> f64 {
    let len = text.chars().count();
    if len == 0 {
        return 1.0;
    }
    let noise = text.chars().filter(|c| is_noise(*c)).count();
    (1.0 - penalty * noise as f64 / len as f64).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CharClass {
    Hiragana,
    Katakana,
    Kanji,
    Latin,
    Digit,
    OtherLetter,
}

fn char_class(c: char) -> Option<CharClass> {
    match c {
        '\u{3040}'..='\u{309F}' => Some(CharClass::Hiragana),
        '\u{30A0}'..='\u{30FF}' => Some(CharClass::Katakana),
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' => Some(CharClass::Kanji),
        c if c.is_ascii_alphabetic() => Some(CharClass::Latin),
        c if c.is_numeric() => Some(CharClass::Digit),
        c if c.is_alphabetic() => Some(CharClass::OtherLetter),
        _ => None,
    }
}

/// 0.7 · class diversity (saturating at 3 classes) + 0.3 · length bonus
pub fn structure_score(text: &str) -> f64 {
    let len = text.chars().count();
    if len == 0 {
        return 0.0;
    }
    let classes: std::collections::HashSet<CharClass> =
        text.chars().filter_map(char_class).collect();

    let diversity = (classes.len() as f64 / 3.0).min(1.0);
    let length_bonus = (len as f64 / 10.0).min(1.0);
    (0.7 * diversity + 0.3 * length_bonus).clamp(0.0, 1.0)
}
