//! Linear Model - ridge regression from features to quality
//!
//! Weights are `[bias, w_1, .., w_9]`. The normal equations are solved
//! through a [`LinearSolver`]; if the solver reports a near-singular system
//! the fit degrades to a per-feature correlation heuristic so there is always
//! a weight vector of the same length.

use lexa_core::linalg::{self, LinearSolver};
use lexa_core::{FeatureVector, LexaError, RegressionConfig, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

use super::training::TrainingSample;

/// Which path produced the weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvePath {
    /// (XᵀX + λI)⁻¹ Xᵀy
    Ridge,
    /// bias = mean(y), w_i = corr(x_i, y) · scale
    CorrelationFallback,
}

/// Weights plus fit quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Index 0 is the intercept
    pub weights: Vec<f64>,
    /// R² over the samples the model was fitted on
    pub accuracy: f64,
    pub trained: bool,
}

impl Default for LinearModel {
    fn default() -> Self {
        Self {
            weights: vec![0.0; FEATURE_COUNT + 1],
            accuracy: 0.0,
            trained: false,
        }
    }
}

impl LinearModel {
    /// bias + Σ wᵢ·xᵢ, unclamped
    pub fn raw(&self, features: &FeatureVector) -> f64 {
        let bias = self.weights.first().copied().unwrap_or(0.0);
        bias + self
            .weights
            .iter()
            .skip(1)
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
    }

    /// Prediction clamped to [0, 1]
    pub fn score(&self, features: &FeatureVector) -> f64 {
        let raw = self.raw(features);
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Ridge weights. Errors only when the solver does.
pub fn solve_ridge(
    samples: &[TrainingSample],
    lambda: f64,
    solver: &dyn LinearSolver,
) -> Result<Vec<f64>, LexaError> {
    let x: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| {
            let mut row = Vec::with_capacity(FEATURE_COUNT + 1);
            row.push(1.0);
            row.extend_from_slice(&s.features);
            row
        })
        .collect();
    let y: Vec<f64> = samples.iter().map(|s| s.target_quality).collect();

    let mut xtx = linalg::gram(&x);
    // The intercept is not regularized
    for (i, row) in xtx.iter_mut().enumerate().skip(1) {
        row[i] += lambda;
    }
    let xty = linalg::transpose_times(&x, &y);

    let inverse = solver.invert(&xtx)?;
    let weights = linalg::mat_vec(&inverse, &xty);

    if weights.iter().any(|w| !w.is_finite()) {
        return Err(LexaError::NumericInstability { pivot: f64::NAN });
    }
    Ok(weights)
}

/// Degraded weights from single-variable correlations
pub fn solve_correlation(samples: &[TrainingSample], scale: f64) -> Vec<f64> {
    let y: Vec<f64> = samples.iter().map(|s| s.target_quality).collect();
    let mean_y = if y.is_empty() {
        0.0
    } else {
        y.iter().sum::<f64>() / y.len() as f64
    };

    let mut weights = Vec::with_capacity(FEATURE_COUNT + 1);
    weights.push(mean_y);
    for i in 0..FEATURE_COUNT {
        let column: Vec<f64> = samples.iter().map(|s| s.features[i]).collect();
        weights.push(linalg::correlation(&column, &y) * scale);
    }
    weights
}

/// R² = 1 - SSres/SStot, clamped to [0, 1]; 0 for a constant target
pub fn r_squared(model: &LinearModel, samples: &[TrainingSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean = samples.iter().map(|s| s.target_quality).sum::<f64>() / samples.len() as f64;

    let ss_tot: f64 = samples
        .iter()
        .map(|s| (s.target_quality - mean).powi(2))
        .sum();
    if ss_tot < 1e-12 {
        return 0.0;
    }
    let ss_res: f64 = samples
        .iter()
        .map(|s| (s.target_quality - model.score(&s.features)).powi(2))
        .sum();

    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

/// λ for a given sample count
pub fn ridge_lambda(sample_count: usize, config: &RegressionConfig) -> f64 {
    if sample_count < FEATURE_COUNT {
        config.ridge_lambda_small
    } else {
        config.ridge_lambda
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexa_core::GaussJordan;

    fn sample(features: FeatureVector, target: f64) -> TrainingSample {
        TrainingSample::new(format!("{:?}", features), features, target)
    }

    #[test]
    fn test_raw_and_score() {
        let mut model = LinearModel::default();
        model.weights[0] = 0.2;
        model.weights[1] = 2.0;
        let mut x = [0.0; FEATURE_COUNT];
        x[0] = 0.5;
        assert!((model.raw(&x) - 1.2).abs() < 1e-12);
        assert_eq!(model.score(&x), 1.0);
    }

    #[test]
    fn test_constant_features_fall_back() {
        // Every sample identical → singular XᵀX even with tiny ridge on the bias
        let samples: Vec<_> = (0..50)
            .map(|i| {
                let mut s = sample([0.5; FEATURE_COUNT], (i % 2) as f64);
                s.content_key = i.to_string();
                s
            })
            .collect();

        let result = solve_ridge(&samples, 0.0, &GaussJordan::default());
        assert!(matches!(result, Err(LexaError::NumericInstability { .. })));

        let weights = solve_correlation(&samples, 0.1);
        assert_eq!(weights.len(), FEATURE_COUNT + 1);
        assert!((weights[0] - 0.5).abs() < 1e-12);
        assert!(weights[1..].iter().all(|w| *w == 0.0));
    }

    #[test]
    fn test_r_squared_degenerate_target() {
        let samples = vec![sample([0.1; FEATURE_COUNT], 0.5), sample([0.9; FEATURE_COUNT], 0.5)];
        assert_eq!(r_squared(&LinearModel::default(), &samples), 0.0);
    }

    #[test]
    fn test_lambda_choice() {
        let config = RegressionConfig::default();
        assert_eq!(ridge_lambda(3, &config), 0.1);
        assert_eq!(ridge_lambda(45, &config), 0.001);
    }
}
