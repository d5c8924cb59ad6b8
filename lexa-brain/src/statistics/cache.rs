//! Statistics Cache - memoized pair statistics
//!
//! Owned by one engine instance. Unbounded; emptied by `clear()` or
//! selectively when the counts behind an entry change.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use super::pmi::PmiScore;
use super::quality::QualityScore;
use super::significance::Significance;

/// Unordered term pair, stored lexicographically
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.0 == term || self.1 == term
    }
}

/// Composite quality also depends on the part-of-speech overlap it was given
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualityKey {
    pair: PairKey,
    pos_bits: u64,
}

impl QualityKey {
    pub fn new(a: &str, b: &str, pos_overlap: f64) -> Self {
        Self {
            pair: PairKey::new(a, b),
            pos_bits: pos_overlap.to_bits(),
        }
    }
}

/// Cache occupancy and effectiveness
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub pmi_entries: usize,
    pub significance_entries: usize,
    pub quality_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// The three memo tables plus hit accounting
#[derive(Debug, Default)]
pub struct StatisticsCache {
    pmi: HashMap<PairKey, PmiScore>,
    significance: HashMap<PairKey, Significance>,
    quality: HashMap<QualityKey, QualityScore>,
    hits: u64,
    misses: u64,
}

fn lookup<K: Eq + Hash, V: Clone>(
    map: &HashMap<K, V>,
    key: &K,
    hits: &mut u64,
    misses: &mut u64,
) -> Option<V> {
    match map.get(key) {
        Some(v) => {
            *hits += 1;
            Some(v.clone())
        }
        None => {
            *misses += 1;
            None
        }
    }
}

impl StatisticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pmi(&mut self, key: &PairKey) -> Option<PmiScore> {
        lookup(&self.pmi, key, &mut self.hits, &mut self.misses)
    }

    pub fn store_pmi(&mut self, key: PairKey, score: PmiScore) {
        self.pmi.insert(key, score);
    }

    pub fn significance(&mut self, key: &PairKey) -> Option<Significance> {
        lookup(&self.significance, key, &mut self.hits, &mut self.misses)
    }

    pub fn store_significance(&mut self, key: PairKey, sig: Significance) {
        self.significance.insert(key, sig);
    }

    pub fn quality(&mut self, key: &QualityKey) -> Option<QualityScore> {
        lookup(&self.quality, key, &mut self.hits, &mut self.misses)
    }

    pub fn store_quality(&mut self, key: QualityKey, score: QualityScore) {
        self.quality.insert(key, score);
    }

    /// Drop everything computed for one pair
    pub fn invalidate_pair(&mut self, a: &str, b: &str) {
        let key = PairKey::new(a, b);
        self.pmi.remove(&key);
        self.significance.remove(&key);
        self.quality.retain(|k, _| k.pair != key);
    }

    /// Drop everything involving a term
    pub fn invalidate_term(&mut self, term: &str) {
        self.pmi.retain(|k, _| !k.contains(term));
        self.significance.retain(|k, _| !k.contains(term));
        self.quality.retain(|k, _| !k.pair.contains(term));
    }

    /// Empty all tables and reset the counters
    pub fn clear(&mut self) {
        self.pmi.clear();
        self.significance.clear();
        self.quality.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            pmi_entries: self.pmi.len(),
            significance_entries: self.significance.len(),
            quality_entries: self.quality.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if lookups > 0 {
                self.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_unordered() {
        assert_eq!(PairKey::new("犬", "猫"), PairKey::new("猫", "犬"));
        assert!(PairKey::new("a", "b").contains("b"));
        assert!(!PairKey::new("a", "b").contains("c"));
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = StatisticsCache::new();
        let key = PairKey::new("a", "b");
        assert!(cache.pmi(&key).is_none());
        cache.store_pmi(key.clone(), PmiScore::default());
        assert!(cache.pmi(&key).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalidate_term() {
        let mut cache = StatisticsCache::new();
        cache.store_pmi(PairKey::new("a", "b"), PmiScore::default());
        cache.store_pmi(PairKey::new("c", "d"), PmiScore::default());
        cache.invalidate_term("a");
        assert_eq!(cache.stats().pmi_entries, 1);
    }
}
