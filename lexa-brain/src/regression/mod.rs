//! Quality Regression for Lexa
//!
//! Predicts how good a vocabulary item is from nine features, and learns
//! from the quality actually observed once the item was used.
//!
//! ## Module Structure
//!
//! - `features` - FeatureExtractor: content + association signals → vector
//! - `training` - TrainingSet: labeled samples, one per content item
//! - `model` - LinearModel: ridge fit with correlation fallback, R²
//! - `suggestions` - hints for the weakest features
//!
//! ## Fallbacks
//!
//! - Too few samples to fit: the fit is rejected and the previous state kept
//! - Near-singular normal equations: correlation heuristic, logged as degraded
//! - Non-finite labels are dropped; non-finite weights never replace a model
//! - Untrained model: fixed blend of length, structure and noise features

pub mod features;
pub mod model;
pub mod suggestions;
pub mod training;

pub use features::FeatureExtractor;
pub use model::{LinearModel, SolvePath};
pub use suggestions::Suggestion;
pub use training::{TrainingSample, TrainingSet, Upsert};

use lexa_core::{
    ContentItem, FeatureVector, GaussJordan, Grade, LexaError, LexaResult, LinearSolver,
    RegressionConfig, StatisticalSignals, FEATURE_COUNT, FEATURE_NAMES, STATE_VERSION,
};
use serde::{Deserialize, Serialize};

/// Which predictor served a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelUsed {
    Regression,
    Fallback,
}

impl ModelUsed {
    pub fn name(&self) -> &'static str {
        match self {
            ModelUsed::Regression => "regression",
            ModelUsed::Fallback => "fallback",
        }
    }
}

/// Quality prediction for one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// In [0, 1]
    pub score: f64,
    /// In [0, 1]
    pub confidence: f64,
    pub grade: Grade,
    pub model_used: ModelUsed,
}

/// Result of a fit attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitOutcome {
    Trained {
        path: SolvePath,
        r_squared: f64,
        samples: usize,
    },
    /// Not enough samples; model left as it was
    Rejected { needed: usize, available: usize },
    /// The solve produced non-finite weights; model left as it was
    NonFinite { path: SolvePath },
}

/// Result of an online learning step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LearnOutcome {
    /// False when the observation was unusable and dropped
    pub accepted: bool,
    /// True when the content was already known and its sample replaced
    pub replaced: bool,
    pub sample_count: usize,
    /// Set when this sample triggered an automatic refit
    pub refit: Option<FitOutcome>,
}

/// Persisted regression state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSnapshot {
    pub version: u32,
    pub weights: Vec<f64>,
    pub feature_names: Vec<String>,
    pub accuracy: f64,
    pub trained: bool,
    pub sample_count: usize,
    pub samples: Vec<TrainingSample>,
}

/// Feature extraction + ridge regression + online learning
pub struct RegressionQualityModel {
    config: RegressionConfig,
    extractor: FeatureExtractor,
    training: TrainingSet,
    model: LinearModel,
    solver: Box<dyn LinearSolver>,
}

impl std::fmt::Debug for RegressionQualityModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegressionQualityModel")
            .field("solver", &self.solver.name())
            .field("samples", &self.training.len())
            .field("model", &self.model)
            .finish()
    }
}

impl RegressionQualityModel {
    pub fn new(config: RegressionConfig) -> Self {
        let solver = Box::new(GaussJordan::new(config.pivot_epsilon));
        Self::with_solver(config, solver)
    }

    /// Use a different matrix-inversion backend
    pub fn with_solver(config: RegressionConfig, solver: Box<dyn LinearSolver>) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.feature_weights),
            config,
            training: TrainingSet::new(),
            model: LinearModel::default(),
            solver,
        }
    }

    pub fn extract_features(&self, content: &ContentItem, signals: &StatisticalSignals) -> FeatureVector {
        self.extractor.extract(content, signals)
    }

    // ========================================================================
    // TRAINING
    // ========================================================================

    /// Minimum samples for a fit
    pub fn required_samples(&self) -> usize {
        self.config.samples_per_feature * FEATURE_COUNT
    }

    /// Fit on the given samples
    pub fn fit(&mut self, samples: &[TrainingSample]) -> FitOutcome {
        let needed = self.required_samples();
        if samples.len() < needed {
            tracing::info!(
                "📉 Fit skipped: {} samples, need {} for {} features",
                samples.len(),
                needed,
                FEATURE_COUNT
            );
            return FitOutcome::Rejected {
                needed,
                available: samples.len(),
            };
        }

        let lambda = model::ridge_lambda(samples.len(), &self.config);
        let (weights, path) = match model::solve_ridge(samples, lambda, self.solver.as_ref()) {
            Ok(weights) => (weights, SolvePath::Ridge),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Ridge solve failed ({}), degrading to correlation heuristic",
                    e
                );
                (
                    model::solve_correlation(samples, self.config.fallback_correlation_scale),
                    SolvePath::CorrelationFallback,
                )
            }
        };

        if weights.iter().any(|w| !w.is_finite()) {
            tracing::warn!(
                "⚠️ {:?} produced non-finite weights, keeping the previous model",
                path
            );
            return FitOutcome::NonFinite { path };
        }

        let candidate = LinearModel {
            weights,
            accuracy: 0.0,
            trained: true,
        };
        let accuracy = model::r_squared(&candidate, samples);
        self.model = LinearModel {
            accuracy: if accuracy.is_finite() { accuracy } else { 0.0 },
            ..candidate
        };

        tracing::info!(
            "📊 Quality model trained: {} samples, path {:?}, R² {:.3}",
            samples.len(),
            path,
            self.model.accuracy
        );

        FitOutcome::Trained {
            path,
            r_squared: self.model.accuracy,
            samples: samples.len(),
        }
    }

    /// Fit on the accumulated training set
    pub fn refit(&mut self) -> FitOutcome {
        let samples = self.training.samples().to_vec();
        self.fit(&samples)
    }

    /// Upsert an observation; every `refit_interval`-th new sample refits
    pub fn learn(&mut self, content_key: &str, features: FeatureVector, observed_quality: f64) -> LearnOutcome {
        if !observed_quality.is_finite() || features.iter().any(|f| !f.is_finite()) {
            tracing::warn!(
                "⚠️ Dropping non-finite observation for '{}' (quality {})",
                content_key,
                observed_quality
            );
            return LearnOutcome {
                accepted: false,
                replaced: false,
                sample_count: self.training.len(),
                refit: None,
            };
        }

        let sample = TrainingSample::new(content_key, features, observed_quality);
        match self.training.upsert(sample) {
            Upsert::Replaced => LearnOutcome {
                accepted: true,
                replaced: true,
                sample_count: self.training.len(),
                refit: None,
            },
            Upsert::Inserted(count) => {
                let interval = self.config.refit_interval.max(1);
                let refit = if count >= interval && count % interval == 0 {
                    Some(self.refit())
                } else {
                    None
                };
                LearnOutcome {
                    accepted: true,
                    replaced: false,
                    sample_count: count,
                    refit,
                }
            }
        }
    }

    // ========================================================================
    // PREDICTION
    // ========================================================================

    pub fn predict(&self, features: &FeatureVector) -> Prediction {
        let (score, model_used) = if self.model.trained {
            (self.model.score(features), ModelUsed::Regression)
        } else {
            (self.fallback_score(features), ModelUsed::Fallback)
        };

        Prediction {
            score,
            confidence: self.confidence(features),
            grade: Grade::from_score(score, &self.config.grade_thresholds),
            model_used,
        }
    }

    /// Heuristic used while untrained
    fn fallback_score(&self, features: &FeatureVector) -> f64 {
        let w = &self.config.fallback_weights;
        (w.length * features[features::LENGTH]
            + w.structure * features[features::STRUCTURE]
            + w.noise * features[features::NOISE])
            .clamp(0.0, 1.0)
    }

    /// Nearest-sample similarity, mean similarity and R², blended
    fn confidence(&self, features: &FeatureVector) -> f64 {
        let samples = self.training.samples();
        let (nearest, mean) = if samples.is_empty() {
            (0.0, 0.0)
        } else {
            let similarities: Vec<f64> = samples
                .iter()
                .map(|s| (-euclidean(features, &s.features)).exp())
                .collect();
            let nearest = similarities.iter().cloned().fold(0.0, f64::max);
            let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
            (nearest, mean)
        };

        let w = &self.config.confidence_weights;
        let blended = w.nearest * nearest + w.mean * mean + w.accuracy * self.model.accuracy;
        if blended.is_finite() {
            blended.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Hints for the features dragging the score down
    pub fn suggestions(&self, features: &FeatureVector) -> Vec<Suggestion> {
        let weights = self.model.trained.then_some(self.model.weights.as_slice());
        suggestions::suggest(features, weights, self.config.suggestion_threshold)
    }

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================

    pub fn is_trained(&self) -> bool {
        self.model.trained
    }

    /// R² of the last fit
    pub fn accuracy(&self) -> f64 {
        self.model.accuracy
    }

    pub fn weights(&self) -> &[f64] {
        &self.model.weights
    }

    /// ("bias", w0) followed by each feature's weight
    pub fn weights_by_name(&self) -> Vec<(String, f64)> {
        std::iter::once("bias")
            .chain(FEATURE_NAMES.iter().copied())
            .zip(self.model.weights.iter().copied())
            .map(|(name, w)| (name.to_string(), w))
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        self.training.len()
    }

    pub fn training_set(&self) -> &TrainingSet {
        &self.training
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn snapshot(&self) -> RegressionSnapshot {
        RegressionSnapshot {
            version: STATE_VERSION,
            weights: self.model.weights.clone(),
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            accuracy: self.model.accuracy,
            trained: self.model.trained,
            sample_count: self.training.len(),
            samples: self.training.samples().to_vec(),
        }
    }

    /// Replace in-memory state with a snapshot; nothing changes on error
    pub fn restore(&mut self, snapshot: RegressionSnapshot) -> LexaResult<()> {
        if snapshot.version != STATE_VERSION {
            return Err(LexaError::persistence(format!(
                "regression snapshot version {} (expected {})",
                snapshot.version, STATE_VERSION
            )));
        }
        if snapshot.feature_names.len() != FEATURE_COUNT
            || snapshot
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(a, b)| a != b)
        {
            return Err(LexaError::persistence(format!(
                "regression snapshot features {:?} do not match {:?}",
                snapshot.feature_names, FEATURE_NAMES
            )));
        }
        if snapshot.weights.iter().any(|w| !w.is_finite())
            || snapshot.samples.iter().any(|s| !s.target_quality.is_finite())
        {
            return Err(LexaError::persistence(
                "regression snapshot holds non-finite values",
            ));
        }
        if snapshot.weights.len() != FEATURE_COUNT + 1 {
            return Err(LexaError::persistence(format!(
                "regression snapshot has {} weights (expected {})",
                snapshot.weights.len(),
                FEATURE_COUNT + 1
            )));
        }

        self.model = LinearModel {
            weights: snapshot.weights,
            accuracy: if snapshot.accuracy.is_finite() {
                snapshot.accuracy.clamp(0.0, 1.0)
            } else {
                0.0
            },
            trained: snapshot.trained,
        };
        self.training = TrainingSet::from_samples(snapshot.samples);
        Ok(())
    }
}

impl Default for RegressionQualityModel {
    fn default() -> Self {
        Self::new(RegressionConfig::default())
    }
}

fn euclidean(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

// ============================================================================
// TESTS
// ============================================================================
