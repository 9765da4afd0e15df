//! Sensitivity indices produced by an analysis.

use serde::Serialize;

use crate::deviation::DeviationWarning;
use crate::estimator::Estimator;
use crate::grid::IndexGrid;

/// Indices for one state variable.
///
/// Both grids have shape `[times, parameters]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSensitivity {
    pub name: String,
    pub first_order: IndexGrid<f64>,
    pub total_order: IndexGrid<f64>,
}

impl StateSensitivity {
    pub(crate) fn new(name: String, n_times: usize, n_params: usize) -> Self {
        Self {
            name,
            first_order: IndexGrid::new(vec![n_times, n_params], f64::NAN),
            total_order: IndexGrid::new(vec![n_times, n_params], f64::NAN),
        }
    }

    /// First-order index of every parameter at one time
    pub fn first_order_at(&self, time: usize) -> Option<&[f64]> {
        self.first_order.outer(time)
    }

    /// Total-order index of every parameter at one time
    pub fn total_order_at(&self, time: usize) -> Option<&[f64]> {
        self.total_order.outer(time)
    }
}

/// Outcome of a Sobol' analysis. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityResult {
    pub(crate) estimator: Estimator,
    pub(crate) n: usize,
    pub(crate) parameters: Vec<String>,
    pub(crate) times: Vec<f64>,
    pub(crate) states: Vec<StateSensitivity>,
    pub(crate) warnings: Vec<DeviationWarning>,
}

impl SensitivityResult {
    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    /// Monte Carlo sample size used
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Output times in ascending order
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[StateSensitivity] {
        &self.states
    }

    pub fn state(&self, name: &str) -> Option<&StateSensitivity> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn warnings(&self) -> &[DeviationWarning] {
        &self.warnings
    }

    pub fn first_order(&self, state: usize, time: usize, parameter: usize) -> Option<f64> {
        self.states
            .get(state)?
            .first_order
            .get(&[time, parameter])
            .copied()
    }

    pub fn total_order(&self, state: usize, time: usize, parameter: usize) -> Option<f64> {
        self.states
            .get(state)?
            .total_order
            .get(&[time, parameter])
            .copied()
    }

    /// Number of index values: states × times × parameters × 2
    pub fn len(&self) -> usize {
        self.states
            .iter()
            .map(|s| s.first_order.len() + s.total_order.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
