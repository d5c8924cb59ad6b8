//! Chi-square significance
//!
//! One-cell chi-square with Yates' continuity correction, turned into an
//! approximate two-tailed p-value through the standard normal CDF.

use serde::{Deserialize, Serialize};

/// Why a significance result looks the way it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceReason {
    /// Fewer co-occurrences than the configured minimum
    InsufficientSamples,
    /// Expected count is zero (empty vocabulary)
    ZeroExpectation,
    /// Statistic computed normally
    Computed,
}

impl SignificanceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignificanceReason::InsufficientSamples => "insufficient_samples",
            SignificanceReason::ZeroExpectation => "zero_expectation",
            SignificanceReason::Computed => "computed",
        }
    }
}

/// Significance test result for one term pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Significance {
    pub observed: u64,
    pub expected: f64,
    /// `None` when the statistic was not computed
    pub chi_square: Option<f64>,
    pub p_value: f64,
    /// clamp(1 - p, 0, 1)
    pub confidence: f64,
    pub is_significant: bool,
    pub reason: SignificanceReason,
}

impl Significance {
    pub fn insufficient(observed: u64) -> Self {
        Self {
            observed,
            expected: 0.0,
            chi_square: None,
            p_value: 1.0,
            confidence: 0.0,
            is_significant: false,
            reason: SignificanceReason::InsufficientSamples,
        }
    }
}

/// Standard normal CDF, Abramowitz & Stegun 26.2.17 (|error| < 7.5e-8)
pub fn normal_cdf(x: f64) -> f64 {
    const B1: f64 = 0.319_381_530;
    const B2: f64 = -0.356_563_782;
    const B3: f64 = 1.781_477_937;
    const B4: f64 = -1.821_255_978;
    const B5: f64 = 1.330_274_429;
    const P: f64 = 0.231_641_9;

    if x < 0.0 {
        return 1.0 - normal_cdf(-x);
    }

    let t = 1.0 / (1.0 + P * x);
    let density = (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let poly = t * (B1 + t * (B2 + t * (B3 + t * (B4 + t * B5))));
    1.0 - density * poly
}

/// Test one pair
///
/// `vocabulary_size` is N; frequencies are already floored by the caller.
pub fn compute(
    observed: u64,
    frequency_a: u64,
    frequency_b: u64,
    vocabulary_size: u64,
    min_samples: u64,
    significance_level: f64,
) -> Significance {
    if observed < min_samples {
        return Significance::insufficient(observed);
    }

    let n = vocabulary_size as f64;
    let expected = if n > 0.0 {
        frequency_a as f64 * frequency_b as f64 / n
    } else {
        0.0
    };

    if expected <= 0.0 {
        return Significance {
            observed,
            expected,
            chi_square: None,
            p_value: 1.0,
            confidence: 0.0,
            is_significant: false,
            reason: SignificanceReason::ZeroExpectation,
        };
    }

    let deviation = (observed as f64 - expected).abs() - 0.5;
    let chi_square = deviation * deviation / expected;
    let p_value = (2.0 * (1.0 - normal_cdf(chi_square.sqrt()))).clamp(0.0, 1.0);

    Significance {
        observed,
        expected,
        chi_square: Some(chi_square),
        p_value,
        confidence: (1.0 - p_value).clamp(0.0, 1.0),
        is_significant: p_value < significance_level,
        reason: SignificanceReason::Computed,
    }
}
