//! Jansen and Martinez Monte Carlo estimators of Sobol' indices.
//!
//! All functions work on one output lane: the values of a single state
//! variable at a single time, one entry per sample row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Which closed-form estimator to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Estimator {
    /// Jansen (1999): differences of squared outputs
    Jansen,
    /// Martinez (2011): correlation coefficients
    #[default]
    Martinez,
}

impl Estimator {
    pub fn name(&self) -> &'static str {
        match self {
            Estimator::Jansen => "Jansen",
            Estimator::Martinez => "Martinez",
        }
    }

    /// Estimate indices for one lane.
    ///
    /// `y_mixed[j]` is the output of the mixed matrix for parameter j, built
    /// as [`crate::matrices::DesignMatrices::build`] does for this estimator.
    pub fn estimate(&self, y_a: &[f64], y_b: &[f64], y_mixed: &[Vec<f64>]) -> LaneIndices {
        match self {
            Estimator::Jansen => jansen(y_a, y_b, y_mixed),
            Estimator::Martinez => martinez(y_a, y_b, y_mixed),
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Estimator {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jansen" => Ok(Estimator::Jansen),
            "martinez" => Ok(Estimator::Martinez),
            _ => Err(ConfigurationError::UnknownEstimator(s.to_string())),
        }
    }
}

/// First- and total-order indices for every parameter of one lane
#[derive(Debug, Clone, PartialEq)]
pub struct LaneIndices {
    pub first_order: Vec<f64>,
    pub total_order: Vec<f64>,
}

/// Jansen estimator with `y_mixed[j]` = f(B with column j from A).
///
/// S_j = (var(y_A) - mean((y_A - y_Cj)^2) / 2) / V
/// T_j = mean((y_B - y_Cj)^2) / 2 / V
///
/// where V is the variance of the pooled A and B outputs.
pub fn jansen(y_a: &[f64], y_b: &[f64], y_mixed: &[Vec<f64>]) -> LaneIndices {
    let pooled: Vec<f64> = y_a.iter().chain(y_b).copied().collect();
    let total_variance = variance(&pooled);
    let var_a = variance(y_a);

    let mut first_order = Vec::with_capacity(y_mixed.len());
    let mut total_order = Vec::with_capacity(y_mixed.len());
    for y_c in y_mixed {
        let first = var_a - 0.5 * mean_squared_difference(y_a, y_c);
        let total = 0.5 * mean_squared_difference(y_b, y_c);
        first_order.push(first / total_variance);
        total_order.push(total / total_variance);
    }

    LaneIndices {
        first_order,
        total_order,
    }
}

/// Martinez estimator with `y_mixed[j]` = f(A with column j from B).
///
/// S_j = corr(y_B, y_Dj), T_j = 1 - corr(y_A, y_Dj)
pub fn martinez(y_a: &[f64], y_b: &[f64], y_mixed: &[Vec<f64>]) -> LaneIndices {
    LaneIndices {
        first_order: y_mixed.iter().map(|y_d| correlation(y_b, y_d)).collect(),
        total_order: y_mixed
            .iter()
            .map(|y_d| 1.0 - correlation(y_a, y_d))
            .collect(),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> f64 {
    covariance(values, values)
}

/// Unbiased sample covariance (n - 1 denominator)
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let (mx, my) = (mean(x), mean(y));
    let sum: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    sum / (x.len() as f64 - 1.0)
}

/// Pearson correlation. NaN when either input has zero variance.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    covariance(x, y) / (variance(x) * variance(y)).sqrt()
}

fn mean_squared_difference(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / x.len() as f64
}
