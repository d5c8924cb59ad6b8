//! # Linear Algebra
//!
//! The small amount of dense linear algebra the quality regression needs:
//! normal-equation products and a matrix inverse.
//!
//! Inversion sits behind [`LinearSolver`] so a vetted numerical library can
//! replace [`GaussJordan`] without touching the regression model.

use crate::error::{LexaError, LexaResult};

/// Row-major dense matrix
pub type DenseMatrix = Vec<Vec<f64>>;

/// Matrix inversion strategy
pub trait LinearSolver: Send + Sync {
    /// Invert a square matrix.
    ///
    /// Returns `LexaError::NumericInstability` when the matrix is
    /// (numerically) singular.
    fn invert(&self, matrix: &[Vec<f64>]) -> LexaResult<DenseMatrix>;

    /// Name of this solver (for logging)
    fn name(&self) -> &'static str;
}

/// Gauss-Jordan elimination with partial pivoting
#[derive(Debug, Clone, Copy)]
pub struct GaussJordan {
    /// Pivots with magnitude below this abort the inversion
    pub pivot_epsilon: f64,
}

impl Default for GaussJordan {
    fn default() -> Self {
        Self {
            pivot_epsilon: 1e-10,
        }
    }
}

impl GaussJordan {
    pub fn new(pivot_epsilon: f64) -> Self {
        Self { pivot_epsilon }
    }
}

impl LinearSolver for GaussJordan {
    fn invert(&self, matrix: &[Vec<f64>]) -> LexaResult<DenseMatrix> {
        let n = matrix.len();
        if matrix.iter().any(|row| row.len() != n) {
            return Err(LexaError::invalid_state("cannot invert a non-square matrix"));
        }

        // Augmented [A | I]
        let mut aug: DenseMatrix = matrix
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut r = Vec::with_capacity(2 * n);
                r.extend_from_slice(row);
                r.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
                r
            })
            .collect();

        for col in 0..n {
            // Partial pivoting: largest magnitude at or below the diagonal
            let pivot_row = (col..n)
                .max_by(|&a, &b| {
                    aug[a][col]
                        .abs()
                        .partial_cmp(&aug[b][col].abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(col);

            let pivot = aug[pivot_row][col];
            if !pivot.is_finite() || pivot.abs() < self.pivot_epsilon {
                return Err(LexaError::NumericInstability { pivot: pivot.abs() });
            }
            aug.swap(col, pivot_row);

            for value in aug[col].iter_mut() {
                *value /= pivot;
            }

            let pivot_values = aug[col].clone();
            for (r, row) in aug.iter_mut().enumerate() {
                if r == col {
                    continue;
                }
                let factor = row[col];
                if factor == 0.0 {
                    continue;
                }
                for (value, p) in row.iter_mut().zip(pivot_values.iter()) {
                    *value -= factor * p;
                }
            }
        }

        Ok(aug.into_iter().map(|row| row[n..].to_vec()).collect())
    }

    fn name(&self) -> &'static str {
        "gauss-jordan"
    }
}

/// Xᵀ·X for a design matrix with rows as samples
pub fn gram(x: &[Vec<f64>]) -> DenseMatrix {
    let cols = x.first().map(|r| r.len()).unwrap_or(0);
    let mut out = vec![vec![0.0; cols]; cols];
    for row in x {
        for i in 0..cols {
            for j in i..cols {
                out[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..cols {
        for j in 0..i {
            out[i][j] = out[j][i];
        }
    }
    out
}

/// Xᵀ·y
pub fn transpose_times(x: &[Vec<f64>], y: &[f64]) -> Vec<f64> {
    let cols = x.first().map(|r| r.len()).unwrap_or(0);
    let mut out = vec![0.0; cols];
    for (row, target) in x.iter().zip(y) {
        for (o, v) in out.iter_mut().zip(row) {
            *o += v * target;
        }
    }
    out
}

/// A·v
pub fn mat_vec(a: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(v).map(|(x, y)| x * y).sum())
        .collect()
}

/// Pearson correlation; 0 when either side has no variance
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        cov / denom
    }
}
