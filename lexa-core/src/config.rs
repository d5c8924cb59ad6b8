//! # Configuration - Lexa's Tunable Parameters
//!
//! One versioned struct per component, injected at construction.
//! Every default below is the documented behavior; override through
//! a JSON file (`LexaConfig::load`) or environment (`LexaConfig::from_env`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{LexaError, LexaResult};

/// Current configuration format version
pub const CONFIG_VERSION: u32 = 1;

/// Master configuration for Lexa
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LexaConfig {
    /// Format version (checked on load)
    pub version: u32,

    /// PMI / chi-square / composite quality settings
    pub statistics: StatisticsConfig,

    /// UCB1 vocabulary selection settings
    pub bandit: BanditConfig,

    /// Quality regression settings
    pub regression: RegressionConfig,

    /// Where and how state is stored
    pub persistence: PersistenceConfig,
}

impl Default for LexaConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            statistics: StatisticsConfig::default(),
            bandit: BanditConfig::default(),
            regression: RegressionConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

/// Association statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Laplace smoothing ε applied to marginal probabilities
    pub smoothing: f64,

    /// Frequency assumed for terms missing from the frequency table
    pub frequency_floor: u64,

    /// Minimum co-occurrence count before chi-square is computed
    pub min_cooccurrence: u64,

    /// p-value below which a pair is significant
    pub significance_level: f64,

    /// Composite quality blend
    pub quality_weights: QualityWeights,

    /// sqrt(freq1 * freq2) at which the frequency component saturates
    pub frequency_scale: f64,

    /// Optional cap on the pair count used as joint-probability denominator.
    /// A performance limit for huge vocabularies, not a statistical requirement.
    #[serde(default)]
    pub max_total_pairs: Option<u64>,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            smoothing: 1.0,
            frequency_floor: 1,
            min_cooccurrence: 3,
            significance_level: 0.05,
            quality_weights: QualityWeights::default(),
            frequency_scale: 100.0,
            max_total_pairs: None,
        }
    }
}

/// Weights of the composite pair quality. Must sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub pmi: f64,
    pub significance: f64,
    pub frequency: f64,
    pub pos: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            pmi: 0.3,
            significance: 0.3,
            frequency: 0.2,
            pos: 0.2,
        }
    }
}

impl QualityWeights {
    pub fn sum(&self) -> f64 {
        self.pmi + self.significance + self.frequency + self.pos
    }
}

/// UCB1 exploration schedule
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BanditConfig {
    /// Exploration constant at t = 0
    pub initial_exploration: f64,

    /// Geometric decay per total selection
    pub exploration_decay: f64,

    /// Exploration never decays below this
    pub min_exploration: f64,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            initial_exploration: std::f64::consts::SQRT_2,
            exploration_decay: 0.99,
            min_exploration: 0.1,
        }
    }
}

/// Quality regression
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegressionConfig {
    /// Training samples required per feature before a fit is attempted
    pub samples_per_feature: usize,

    /// Refit after every N new samples
    pub refit_interval: usize,

    /// Pivots smaller than this abort the matrix inversion
    pub pivot_epsilon: f64,

    /// Ridge λ when there are fewer samples than features
    pub ridge_lambda_small: f64,

    /// Ridge λ otherwise
    pub ridge_lambda: f64,

    /// Scale applied to feature/target correlation in the degraded fit
    pub fallback_correlation_scale: f64,

    /// Heuristic used while no model is trained
    pub fallback_weights: FallbackWeights,

    /// Prediction confidence blend
    pub confidence_weights: ConfidenceWeights,

    /// Score → grade lookup
    pub grade_thresholds: GradeThresholds,

    /// Blends used by feature extraction
    pub feature_weights: FeatureWeights,

    /// Features scoring below this produce an improvement suggestion
    pub suggestion_threshold: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            samples_per_feature: 5,
            refit_interval: 5,
            pivot_epsilon: 1e-10,
            ridge_lambda_small: 0.1,
            ridge_lambda: 0.001,
            fallback_correlation_scale: 0.1,
            fallback_weights: FallbackWeights::default(),
            confidence_weights: ConfidenceWeights::default(),
            grade_thresholds: GradeThresholds::default(),
            feature_weights: FeatureWeights::default(),
            suggestion_threshold: 0.5,
        }
    }
}

/// Untrained-model heuristic
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FallbackWeights {
    pub length: f64,
    pub structure: f64,
    pub noise: f64,
}

impl Default for FallbackWeights {
    fn default() -> Self {
        Self {
            length: 0.3,
            structure: 0.4,
            noise: 0.3,
        }
    }
}

/// Blend of the three confidence signals
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    /// Similarity to the nearest training sample
    pub nearest: f64,
    /// Mean similarity to all training samples
    pub mean: f64,
    /// Model R²
    pub accuracy: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            nearest: 0.4,
            mean: 0.3,
            accuracy: 0.3,
        }
    }
}

/// Lower bounds of each grade
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.8,
            good: 0.6,
            acceptable: 0.4,
        }
    }
}

/// Tunable blends for the statistics-derived features
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FeatureWeights {
    /// Frequency at which the log-scaled frequency score reaches 1
    pub frequency_reference: f64,

    /// Share of noise characters that drives the noise score to 0 is 1/penalty
    pub noise_penalty: f64,

    /// Neighbor count at which density saturates
    pub neighbor_saturation: f64,

    /// Related-term count at which diversity saturates
    pub related_saturation: f64,

    // === context density ===
    pub density_neighbors: f64,
    pub density_confidence: f64,

    // === semantic coherence ===
    pub coherence_pmi: f64,
    pub coherence_confidence: f64,

    // === vocabulary diversity ===
    pub diversity_related: f64,
    pub diversity_distinct: f64,

    // === statistical complexity ===
    pub complexity_length: f64,
    pub complexity_confidence: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            frequency_reference: 1000.0,
            noise_penalty: 2.0,
            neighbor_saturation: 20.0,
            related_saturation: 10.0,
            density_neighbors: 0.6,
            density_confidence: 0.4,
            coherence_pmi: 0.6,
            coherence_confidence: 0.4,
            diversity_related: 0.5,
            diversity_distinct: 0.5,
            complexity_length: 0.5,
            complexity_confidence: 0.5,
        }
    }
}

/// Encoding used for persisted state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistenceFormat {
    /// Compact binary (bincode)
    Bincode,
    /// Human-readable JSON
    Json,
}

/// Persistence settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the state files
    pub data_dir: PathBuf,

    /// Encoding of the state files
    pub format: PersistenceFormat,

    /// Give up on a load/save after this long
    pub timeout_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            format: PersistenceFormat::Bincode,
            timeout_ms: 5_000,
        }
    }
}

impl LexaConfig {
    /// Load an operator-authored JSON file
    ///
    /// Only for the file handed to the service at startup. The effective
    /// configuration kept alongside learned state is written by the state
    /// store, not here.
    pub fn load(path: &str) -> LexaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        if config.version != CONFIG_VERSION {
            return Err(LexaError::config(format!(
                "unsupported config version {} (expected {})",
                config.version, CONFIG_VERSION
            )));
        }
        config.validate()?;
        Ok(config)
    }

    /// Write an operator-editable JSON file, replacing `path` in one rename
    pub fn save(&self, path: &str) -> LexaResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = format!("{}.{}.tmp", path, std::process::id());
        if let Err(e) = std::fs::write(&tmp, content) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Create config from environment variables
    ///
    /// Reads:
    /// - LEXA_DATA_DIR: state directory (default: data)
    /// - LEXA_SIGNIFICANCE: significance level (default: 0.05)
    /// - LEXA_MIN_COOCCURRENCE: chi-square sample floor (default: 3)
    /// - LEXA_PERSIST_TIMEOUT_MS: persistence timeout (default: 5000)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("LEXA_DATA_DIR") {
            config.persistence.data_dir = PathBuf::from(dir);
        }
        if let Ok(val) = std::env::var("LEXA_SIGNIFICANCE") {
            if let Ok(v) = val.parse() {
                config.statistics.significance_level = v;
            }
        }
        if let Ok(val) = std::env::var("LEXA_MIN_COOCCURRENCE") {
            if let Ok(v) = val.parse() {
                config.statistics.min_cooccurrence = v;
            }
        }
        if let Ok(val) = std::env::var("LEXA_PERSIST_TIMEOUT_MS") {
            if let Ok(v) = val.parse() {
                config.persistence.timeout_ms = v;
            }
        }

        config
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> LexaResult<()> {
        let weights = &self.statistics.quality_weights;
        if (weights.sum() - 1.0).abs() > 1e-6 {
            return Err(LexaError::config(format!(
                "quality weights must sum to 1, got {:.6}",
                weights.sum()
            )));
        }
        if [weights.pmi, weights.significance, weights.frequency, weights.pos]
            .iter()
            .any(|w| *w < 0.0)
        {
            return Err(LexaError::config("quality weights must be non-negative"));
        }

        let level = self.statistics.significance_level;
        if !(0.0..=1.0).contains(&level) {
            return Err(LexaError::config(format!(
                "significance level {} outside [0, 1]",
                level
            )));
        }
        if self.statistics.smoothing < 0.0 {
            return Err(LexaError::config("smoothing must be non-negative"));
        }

        let bandit = &self.bandit;
        if bandit.min_exploration < 0.0 || bandit.exploration_decay <= 0.0 {
            return Err(LexaError::config("bandit exploration schedule must be positive"));
        }

        let grades = &self.regression.grade_thresholds;
        if !(grades.excellent >= grades.good && grades.good >= grades.acceptable) {
            return Err(LexaError::config("grade thresholds must be non-increasing"));
        }
        if self.regression.refit_interval == 0 {
            return Err(LexaError::config("refit interval must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = LexaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.statistics.min_cooccurrence, 3);
        assert!((config.bandit.initial_exploration - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_quality_weights_must_sum_to_one() {
        let mut config = LexaConfig::default();
        config.statistics.quality_weights.pos = 0.5;
        assert!(matches!(config.validate(), Err(LexaError::Config(_))));
    }

    #[test]
    fn test_grade_thresholds_must_be_ordered() {
        let mut config = LexaConfig::default();
        config.regression.grade_thresholds.good = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lexa.json");
        let path = path.to_str().unwrap();

        let mut config = LexaConfig::default();
        config.statistics.significance_level = 0.01;
        config.save(path).unwrap();

        let loaded = LexaConfig::load(path).unwrap();
        assert_eq!(loaded.statistics.significance_level, 0.01);
        assert_eq!(loaded.persistence.format, PersistenceFormat::Bincode);
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lexa.json");
        std::fs::write(&path, "{ half written").unwrap();
        let path_str = path.to_str().unwrap();

        assert!(LexaConfig::load(path_str).is_err());
        LexaConfig::default().save(path_str).unwrap();
        assert!(LexaConfig::load(path_str).is_ok());

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("lexa.json")]);
    }

    #[test]
    fn test_save_into_missing_dir_fails_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent").join("lexa.json");
        let err = LexaConfig::default().save(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LexaError::Io(_)));
        assert!(!dir.path().join("absent").exists());
    }
}
