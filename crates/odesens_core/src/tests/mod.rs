//! Integration tests for the sensitivity analysis pipeline
//!
//! Tests are organized by topic:
//! - `pipeline` - End-to-end analyses on closed-form models
//! - `estimators` - Estimator accuracy and deviation handling on known outputs
//! - `validation` - Request validation and error reporting
//! - `parallel` - Parallel evaluation determinism and failure propagation

mod validation;

use crate::config::{SobolConfig, StateVariable};
use crate::ode::OdeFn;
use crate::sampling::ParameterDistribution;

/// dx/dt = -p0·x with `extra` parameters the output ignores
pub(crate) fn decay_with_inert(
    extra: usize,
) -> OdeFn<impl Fn(f64, &[f64], &[f64], &mut [f64]) + Sync> {
    OdeFn::new(1, 1 + extra, |_t, y: &[f64], p: &[f64], dy: &mut [f64]| {
        dy[0] = -p[0] * y[0];
    })
}

pub(crate) fn decay_config(parameters: &[&str], times: Vec<f64>, n: usize) -> SobolConfig {
    SobolConfig::new(
        parameters.iter().map(|s| s.to_string()).collect(),
        vec![StateVariable::new("x", 1.0)],
        times,
    )
    .distributions(vec![ParameterDistribution::uniform(0.5, 1.5).unwrap()])
    .samples(n)
    .seed(42)
}
