//! Vocabulary Learner - the four components wired together
//!
//! co-occurrences → matrix → statistics → features → regression → bandit reward
//!
//! Each component sits behind its own `parking_lot::Mutex`. When two are
//! held at once the order is always matrix, then statistics. No lock is held
//! across an `.await`: persistence snapshots under the lock, drops it, then
//! does I/O.

use lexa_core::{
    ContentItem, FeatureVector, Grade, LexaConfig, LexaResult, SparseAssociationMatrix,
    StatisticalSignals, FEATURE_NAMES,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;

use crate::bandit::{BanditSelector, BanditSnapshot};
use crate::persistence::{PersistenceStatus, StateStore};
use crate::regression::{
    LearnOutcome, ModelUsed, RegressionQualityModel, RegressionSnapshot, Suggestion,
};
use crate::statistics::{AssociationStatisticsEngine, CacheStats, PmiScore, QualityScore, Significance};

/// Persisted state names
pub const BANDIT_STATE: &str = "bandit";
pub const REGRESSION_STATE: &str = "regression";

/// One named feature value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NamedFeature {
    pub name: &'static str,
    pub value: f64,
}

/// Everything `predict_quality` knows about a content item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub quality_score: f64,
    pub confidence: f64,
    pub grade: Grade,
    pub features: Vec<NamedFeature>,
    pub model_used: ModelUsed,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixDiagnostics {
    pub cells: usize,
    pub terms: usize,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BanditDiagnostics {
    pub arms: usize,
    pub total_selections: u64,
    pub exploration: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionDiagnostics {
    pub trained: bool,
    pub r_squared: f64,
    pub samples: usize,
    pub weights: Vec<(String, f64)>,
}

/// Snapshot of every component's counters
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub matrix: MatrixDiagnostics,
    pub cache: CacheStats,
    pub vocabulary_size: u64,
    pub bandit: BanditDiagnostics,
    pub regression: RegressionDiagnostics,
}

/// Thread-safe facade over matrix, statistics, bandit and regression
pub struct VocabularyLearner {
    config: LexaConfig,
    matrix: Mutex<SparseAssociationMatrix>,
    statistics: Mutex<AssociationStatisticsEngine>,
    bandit: Mutex<BanditSelector>,
    regression: Mutex<RegressionQualityModel>,
}

impl VocabularyLearner {
    pub fn new(config: LexaConfig) -> Self {
        Self {
            matrix: Mutex::new(SparseAssociationMatrix::new()),
            statistics: Mutex::new(AssociationStatisticsEngine::new(config.statistics.clone())),
            bandit: Mutex::new(BanditSelector::new(config.bandit.clone())),
            regression: Mutex::new(RegressionQualityModel::new(config.regression.clone())),
            config,
        }
    }

    pub fn config(&self) -> &LexaConfig {
        &self.config
    }

    // ========================================================================
    // OBSERVATIONS
    // ========================================================================

    /// Add `delta` co-occurrences of a pair; returns the new count
    pub fn observe_pair(&self, term_a: &str, term_b: &str, delta: u64) -> u64 {
        let mut matrix = self.matrix.lock();
        let count = matrix.increment(term_a, term_b, delta);
        self.statistics.lock().invalidate_pair(term_a, term_b);
        count
    }

    /// One co-occurrence for every unordered pair of distinct terms in a window
    ///
    /// Returns the number of pairs recorded.
    pub fn observe_window<S: AsRef<str>>(&self, terms: &[S]) -> usize {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = terms
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| !t.is_empty() && seen.insert(*t))
            .collect();

        let mut matrix = self.matrix.lock();
        let mut statistics = self.statistics.lock();
        let mut pairs = 0;
        for (i, a) in distinct.iter().enumerate() {
            for b in &distinct[i + 1..] {
                matrix.increment(a, b, 1);
                statistics.invalidate_pair(a, b);
                pairs += 1;
            }
        }
        pairs
    }

    pub fn set_term_frequency(&self, term: &str, frequency: u64) {
        self.statistics.lock().set_frequency(term, frequency);
    }

    /// Replace the term-frequency table
    pub fn load_frequencies<I, S>(&self, table: I)
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        self.statistics.lock().load_frequencies(table);
    }

    pub fn set_vocabulary_size(&self, size: u64) {
        self.statistics.lock().set_vocabulary_size(size);
    }

    pub fn cooccurrence(&self, term_a: &str, term_b: &str) -> u64 {
        self.matrix.lock().get(term_a, term_b)
    }

    // ========================================================================
    // STATISTICS
    // ========================================================================

    pub fn calculate_pmi(&self, term_a: &str, term_b: &str) -> PmiScore {
        let matrix = self.matrix.lock();
        self.statistics.lock().calculate_pmi(term_a, term_b, &matrix)
    }

    pub fn calculate_significance(&self, term_a: &str, term_b: &str) -> Significance {
        let matrix = self.matrix.lock();
        self.statistics
            .lock()
            .calculate_significance(term_a, term_b, &matrix)
    }

    pub fn calculate_quality(&self, term_a: &str, term_b: &str, pos_overlap: f64) -> QualityScore {
        let matrix = self.matrix.lock();
        self.statistics
            .lock()
            .calculate_quality(term_a, term_b, pos_overlap, &matrix)
    }

    pub fn clear_caches(&self) {
        self.statistics.lock().clear_caches();
    }

    fn signals_for(&self, content: &ContentItem) -> StatisticalSignals {
        let matrix = self.matrix.lock();
        self.statistics
            .lock()
            .signals_for(&content.text, &content.related_terms, &matrix)
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Next vocabulary item to surface; `None` for no candidates
    pub fn select_vocabulary<S: AsRef<str>>(&self, candidates: &[S]) -> Option<String> {
        self.bandit.lock().select(candidates)
    }

    /// `false` when the reward was not finite and nothing was recorded
    pub fn update_rewards(&self, term: &str, reward: f64) -> bool {
        self.bandit.lock().update(term, reward)
    }

    /// Score `content` and feed the score to `term`'s arm; returns the reward
    pub fn reward_from_quality(&self, term: &str, content: &ContentItem) -> f64 {
        let reward = self.predict_quality(content).quality_score;
        self.update_rewards(term, reward);
        reward
    }

    pub fn bandit_summary(&self) -> String {
        self.bandit.lock().summary()
    }

    // ========================================================================
    // QUALITY
    // ========================================================================

    pub fn extract_features(&self, content: &ContentItem) -> FeatureVector {
        let signals = self.signals_for(content);
        self.regression.lock().extract_features(content, &signals)
    }

    pub fn predict_quality(&self, content: &ContentItem) -> QualityReport {
        let features = self.extract_features(content);
        let regression = self.regression.lock();
        let prediction = regression.predict(&features);

        QualityReport {
            quality_score: prediction.score,
            confidence: prediction.confidence,
            grade: prediction.grade,
            features: FEATURE_NAMES
                .iter()
                .zip(features.iter())
                .map(|(name, value)| NamedFeature {
                    name: *name,
                    value: *value,
                })
                .collect(),
            model_used: prediction.model_used,
            suggestions: regression.suggestions(&features),
        }
    }

    /// Record the quality a content item actually achieved
    pub fn learn_from_response(&self, content: &ContentItem, actual_quality: f64) -> LearnOutcome {
        let features = self.extract_features(content);
        self.regression
            .lock()
            .learn(&content.text, features, actual_quality)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let matrix = {
            let m = self.matrix.lock();
            MatrixDiagnostics {
                cells: m.size(),
                terms: m.term_count(),
                total_count: m.total_count(),
            }
        };
        let (cache, vocabulary_size) = {
            let s = self.statistics.lock();
            (s.cache_stats(), s.vocabulary_size())
        };
        let bandit = {
            let b = self.bandit.lock();
            BanditDiagnostics {
                arms: b.arm_count(),
                total_selections: b.total_selections(),
                exploration: b.exploration_constant(),
            }
        };
        let regression = {
            let r = self.regression.lock();
            RegressionDiagnostics {
                trained: r.is_trained(),
                r_squared: r.accuracy(),
                samples: r.sample_count(),
                weights: r.weights_by_name(),
            }
        };

        Diagnostics {
            matrix,
            cache,
            vocabulary_size,
            bandit,
            regression,
        }
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Restore bandit and regression state; in-memory state survives failures
    pub async fn load(&self, store: &StateStore) -> PersistenceStatus {
        let bandit = match store.load_named::<BanditSnapshot>(BANDIT_STATE).await {
            Ok(Some(snapshot)) => self.bandit.lock().restore(snapshot).map(|_| true),
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };
        let regression = match store
            .load_named::<RegressionSnapshot>(REGRESSION_STATE)
            .await
        {
            Ok(Some(snapshot)) => self.regression.lock().restore(snapshot).map(|_| true),
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };

        match (bandit, regression) {
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("⚠️ Failed to load state: {}", e);
                PersistenceStatus::Failed(e.to_string())
            }
            (Ok(false), Ok(false)) => {
                tracing::info!("🌱 No saved state in {}, starting fresh", store.data_dir().display());
                PersistenceStatus::Missing
            }
            _ => {
                let d = self.diagnostics();
                tracing::info!(
                    "📂 State loaded: {} arms, {} samples, trained={}",
                    d.bandit.arms,
                    d.regression.samples,
                    d.regression.trained
                );
                PersistenceStatus::Loaded
            }
        }
    }

    /// Save bandit and regression state
    pub async fn persist(&self, store: &StateStore) -> PersistenceStatus {
        match self.try_persist(store).await {
            Ok(()) => PersistenceStatus::Saved,
            Err(e) => {
                tracing::warn!("⚠️ Failed to save state: {}", e);
                PersistenceStatus::Failed(e.to_string())
            }
        }
    }

    async fn try_persist(&self, store: &StateStore) -> LexaResult<()> {
        let bandit = self.bandit.lock().snapshot();
        let regression = self.regression.lock().snapshot();

        store.save_named(BANDIT_STATE, &bandit).await?;
        store.save_named(REGRESSION_STATE, &regression).await?;
        tracing::info!(
            "💾 State saved ({} arms, {} samples)",
            bandit.arms.len(),
            regression.sample_count
        );
        Ok(())
    }
}

impl Default for VocabularyLearner {
    fn default() -> Self {
        Self::new(LexaConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lexa_core::{LexaError, PersistenceConfig, PersistenceFormat};
    use tempfile::tempdir;

    #[test]
    fn test_observe_window_counts_distinct_pairs() {
        let learner = VocabularyLearner::default();
        let pairs = learner.observe_window(&["猫", "犬", "鳥", "猫", ""]);
        assert_eq!(pairs, 3);
        assert_eq!(learner.cooccurrence("犬", "猫"), 1);
        assert_eq!(learner.cooccurrence("鳥", "犬"), 1);
        assert_eq!(learner.diagnostics().matrix.cells, 3);
    }

    #[test]
    fn test_observation_refreshes_cached_pmi() {
        let learner = VocabularyLearner::default();
        learner.load_frequencies([("猫", 10), ("犬", 8)]);
        learner.set_vocabulary_size(100);

        learner.observe_pair("猫", "犬", 2);
        let before = learner.calculate_pmi("猫", "犬");
        learner.observe_pair("犬", "猫", 3);
        let after = learner.calculate_pmi("猫", "犬");

        assert_eq!(after.cooccurrence, 5);
        assert!(after.pmi > before.pmi);
    }

    #[test]
    fn test_pmi_symmetric_through_facade() {
        let learner = VocabularyLearner::default();
        learner.load_frequencies([("a", 20), ("b", 5)]);
        learner.set_vocabulary_size(50);
        learner.observe_pair("a", "b", 4);

        let ab = learner.calculate_pmi("a", "b");
        let ba = learner.calculate_pmi("b", "a");
        assert_eq!(ab.pmi, ba.pmi);
    }

    #[test]
    fn test_predict_untrained_is_fallback() {
        let learner = VocabularyLearner::default();
        let report = learner.predict_quality(&ContentItem::new("ねこカフェ"));

        assert_eq!(report.model_used, ModelUsed::Fallback);
        assert!((0.0..=1.0).contains(&report.quality_score));
        assert_eq!(report.features.len(), 9);
        assert_eq!(report.features[0].name, "length");
    }

    #[test]
    fn test_reward_from_quality_updates_arm() {
        let learner = VocabularyLearner::default();
        let reward = learner.reward_from_quality("猫", &ContentItem::new("猫"));

        let d = learner.diagnostics();
        assert_eq!(d.bandit.arms, 1);
        assert_eq!(d.bandit.total_selections, 1);
        assert!((0.0..=1.0).contains(&reward));
    }

    #[test]
    fn test_learn_from_response_dedups_by_text() {
        let learner = VocabularyLearner::default();
        let item = ContentItem::new("ことば");
        assert!(!learner.learn_from_response(&item, 0.4).replaced);
        assert!(learner.learn_from_response(&item, 0.6).replaced);
        assert_eq!(learner.diagnostics().regression.samples, 1);
    }

    #[tokio::test]
    async fn test_load_without_state_is_missing() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(PersistenceConfig {
            data_dir: dir.path().to_path_buf(),
            format: PersistenceFormat::Bincode,
            timeout_ms: 5_000,
        });

        let learner = VocabularyLearner::default();
        assert_eq!(learner.load(&store).await, PersistenceStatus::Missing);
    }

    #[tokio::test]
    async fn test_corrupted_state_keeps_memory_intact() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(PersistenceConfig {
            data_dir: dir.path().to_path_buf(),
            format: PersistenceFormat::Json,
            timeout_ms: 5_000,
        });
        std::fs::write(dir.path().join("bandit.json"), b"garbage").unwrap();

        let learner = VocabularyLearner::default();
        learner.update_rewards("猫", 0.5);
        let status = learner.load(&store).await;

        assert!(matches!(status, PersistenceStatus::Failed(_)));
        assert_eq!(learner.diagnostics().bandit.total_selections, 1);
    }

    #[tokio::test]
    async fn test_save_timeout_reports_failure_and_keeps_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(PersistenceConfig {
            data_dir: dir.path().to_path_buf(),
            format: PersistenceFormat::Bincode,
            timeout_ms: 20,
        });

        let learner = VocabularyLearner::default();
        learner.update_rewards("猫", 0.5);
        learner.learn_from_response(&ContentItem::new("ねこ"), 0.6);

        // A save that never finishes holds the write lock
        let stalled = store.write_lock.lock().await;
        let status = learner.persist(&store).await;
        drop(stalled);

        assert_eq!(
            status,
            PersistenceStatus::Failed(LexaError::Timeout(20).to_string())
        );
        let d = learner.diagnostics();
        assert_eq!(d.bandit.total_selections, 1);
        assert_eq!(d.regression.samples, 1);
        assert!(!dir.path().join("bandit.bin").exists());

        assert_eq!(learner.persist(&store).await, PersistenceStatus::Saved);
    }
}
