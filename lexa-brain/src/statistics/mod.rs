//! Association Statistics for Lexa
//!
//! Turns co-occurrence counts plus a term-frequency table into PMI,
//! chi-square significance and a composite pair quality.
//!
//! ## Module Structure
//!
//! - `pmi` - smoothed pointwise mutual information
//! - `significance` - Yates-corrected chi-square and its p-value
//! - `quality` - weighted composite of the above
//! - `cache` - memo tables owned by the engine
//!
//! Results are memoized per unordered pair. Entries for a pair are dropped
//! when its count changes, entries for a term when its frequency changes,
//! and everything when the vocabulary size changes.

pub mod cache;
pub mod pmi;
pub mod quality;
pub mod significance;

pub use cache::{CacheStats, PairKey, StatisticsCache};
pub use pmi::PmiScore;
pub use quality::{QualityComponents, QualityScore};
pub use significance::{Significance, SignificanceReason};

use lexa_core::{SparseAssociationMatrix, StatisticalSignals, StatisticsConfig};
use std::collections::{HashMap, HashSet};

use cache::QualityKey;

/// PMI / significance / quality over one association matrix
#[derive(Debug)]
pub struct AssociationStatisticsEngine {
    config: StatisticsConfig,
    /// term → observed frequency
    frequencies: HashMap<String, u64>,
    /// Explicit vocabulary size N; defaults to the frequency table size
    vocabulary_size: Option<u64>,
    cache: StatisticsCache,
}

impl AssociationStatisticsEngine {
    pub fn new(config: StatisticsConfig) -> Self {
        Self {
            config,
            frequencies: HashMap::new(),
            vocabulary_size: None,
            cache: StatisticsCache::new(),
        }
    }

    pub fn config(&self) -> &StatisticsConfig {
        &self.config
    }

    // ========================================================================
    // FREQUENCY TABLE
    // ========================================================================

    /// Record a term's frequency
    pub fn set_frequency(&mut self, term: &str, frequency: u64) {
        let previous_len = self.frequencies.len();
        self.frequencies.insert(term.to_string(), frequency);

        if self.vocabulary_size.is_none() && self.frequencies.len() != previous_len {
            // N moved, every probability moved with it
            self.cache.clear();
        } else {
            self.cache.invalidate_term(term);
        }
    }

    /// Replace the whole frequency table
    pub fn load_frequencies<I, S>(&mut self, table: I)
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        self.frequencies = table.into_iter().map(|(t, f)| (t.into(), f)).collect();
        self.cache.clear();
        tracing::debug!("📚 Frequency table loaded: {} terms", self.frequencies.len());
    }

    /// Frequency of a term, floored for unseen or tiny counts
    pub fn frequency(&self, term: &str) -> u64 {
        self.frequencies
            .get(term)
            .copied()
            .unwrap_or(0)
            .max(self.config.frequency_floor)
    }

    /// Fix N instead of deriving it from the frequency table
    pub fn set_vocabulary_size(&mut self, size: u64) {
        if self.vocabulary_size != Some(size) {
            self.vocabulary_size = Some(size);
            self.cache.clear();
        }
    }

    /// Total vocabulary N
    pub fn vocabulary_size(&self) -> u64 {
        self.vocabulary_size
            .unwrap_or(self.frequencies.len() as u64)
    }

    /// Forget memoized results for a pair whose count changed
    pub fn invalidate_pair(&mut self, term_a: &str, term_b: &str) {
        self.cache.invalidate_pair(term_a, term_b);
    }

    // ========================================================================
    // STATISTICS
    // ========================================================================

    /// PMI and normalized PMI of a pair
    pub fn calculate_pmi(
        &mut self,
        term_a: &str,
        term_b: &str,
        matrix: &SparseAssociationMatrix,
    ) -> PmiScore {
        let key = PairKey::new(term_a, term_b);
        if let Some(score) = self.cache.pmi(&key) {
            return score;
        }

        let score = pmi::compute(pmi::PmiInputs {
            frequency_a: self.frequency(term_a),
            frequency_b: self.frequency(term_b),
            cooccurrence: matrix.get(term_a, term_b),
            vocabulary_size: self.vocabulary_size(),
            smoothing: self.config.smoothing,
            max_total_pairs: self.config.max_total_pairs,
        });

        self.cache.store_pmi(key, score);
        score
    }

    /// Chi-square significance of a pair
    pub fn calculate_significance(
        &mut self,
        term_a: &str,
        term_b: &str,
        matrix: &SparseAssociationMatrix,
    ) -> Significance {
        let key = PairKey::new(term_a, term_b);
        if let Some(sig) = self.cache.significance(&key) {
            return sig;
        }

        let sig = significance::compute(
            matrix.get(term_a, term_b),
            self.frequency(term_a),
            self.frequency(term_b),
            self.vocabulary_size(),
            self.config.min_cooccurrence,
            self.config.significance_level,
        );

        if sig.is_significant {
            tracing::debug!(
                "🔗 Significant pair {} / {} (χ²={:.2}, p={:.4})",
                term_a,
                term_b,
                sig.chi_square.unwrap_or(0.0),
                sig.p_value
            );
        }

        self.cache.store_significance(key, sig);
        sig
    }

    /// Composite quality of a pair
    ///
    /// `pos_overlap` is the part-of-speech overlap ratio from the caller's
    /// tagger, clamped to [0, 1].
    pub fn calculate_quality(
        &mut self,
        term_a: &str,
        term_b: &str,
        pos_overlap: f64,
        matrix: &SparseAssociationMatrix,
    ) -> QualityScore {
        let pos = if pos_overlap.is_finite() {
            pos_overlap.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let key = QualityKey::new(term_a, term_b, pos);
        if let Some(q) = self.cache.quality(&key) {
            return q;
        }

        let pmi = self.calculate_pmi(term_a, term_b, matrix);
        let sig = self.calculate_significance(term_a, term_b, matrix);

        let components = QualityComponents {
            pmi: quality::pmi_quality(pmi.normalized_pmi),
            significance: sig.confidence,
            frequency: quality::frequency_quality(
                self.frequency(term_a),
                self.frequency(term_b),
                self.config.frequency_scale,
            ),
            pos,
        };
        let score = quality::compose(components, self.config.quality_weights);

        self.cache.store_quality(key, score);
        score
    }

    /// Association signals for an item and the terms seen with it
    pub fn signals_for(
        &mut self,
        term: &str,
        related_terms: &[String],
        matrix: &SparseAssociationMatrix,
    ) -> StatisticalSignals {
        let neighbor_count = matrix.neighbor_count(term);

        let mut distinct: HashSet<&str> = HashSet::new();
        let mut total_neighbors = 0;
        for t in std::iter::once(term).chain(related_terms.iter().map(String::as_str)) {
            for (neighbor, _) in matrix.neighbors_of(t) {
                distinct.insert(neighbor);
                total_neighbors += 1;
            }
        }

        let mut npmi_sum = 0.0;
        let mut confidence_sum = 0.0;
        let mut pairs = 0usize;
        for related in related_terms.iter().filter(|r| r.as_str() != term) {
            npmi_sum += self.calculate_pmi(term, related, matrix).normalized_pmi;
            confidence_sum += self.calculate_significance(term, related, matrix).confidence;
            pairs += 1;
        }

        let (mean_npmi, mean_confidence) = if pairs > 0 {
            (
                (npmi_sum / pairs as f64).clamp(-1.0, 1.0),
                confidence_sum / pairs as f64,
            )
        } else {
            (0.0, 0.0)
        };

        StatisticalSignals {
            frequency: self.frequency(term),
            neighbor_count,
            distinct_neighbors: distinct.len(),
            total_neighbors,
            related_count: related_terms.len(),
            mean_npmi,
            mean_confidence,
        }
    }

    // ========================================================================
    // CACHE
    // ========================================================================

    /// Empty every memo table
    pub fn clear_caches(&mut self) {
        self.cache.clear();
        tracing::debug!("🧹 Statistics caches cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for AssociationStatisticsEngine {
    fn default() -> Self {
        Self::new(StatisticsConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
