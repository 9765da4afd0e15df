//! Analysis request configuration and its validation.
//!
//! `SobolConfig` is the full description of one sensitivity analysis apart
//! from the model itself. Validation happens up front in
//! [`SobolConfig::validate`]; nothing is sampled or integrated until every
//! check has passed.
//!
//! ```ignore
//! use odesens_core::{ParameterDistribution, SobolConfig, StateVariable, Estimator};
//!
//! let config = SobolConfig::new(
//!     vec!["k".into()],
//!     vec![StateVariable::new("x", 1.0)],
//!     vec![1.0, 2.0, 5.0],
//! )
//! .distributions(vec![ParameterDistribution::uniform(0.5, 1.5)?])
//! .samples(1000)
//! .estimator(Estimator::Jansen)
//! .parallel(Some(4))
//! .seed(42);
//! ```

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::estimator::Estimator;
use crate::evaluate::Execution;
use crate::ode::{IntegrationMethod, OdeModel, SolverOptions};
use crate::sampling::{ParameterDistribution, broadcast_distributions};

/// Named state variable and its value at t = 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVariable {
    pub name: String,
    pub initial: f64,
}

impl StateVariable {
    pub fn new(name: impl Into<String>, initial: f64) -> Self {
        Self {
            name: name.into(),
            initial,
        }
    }
}

/// Observation times: positive, finite, unique and ascending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeGrid(Vec<f64>);

impl TimeGrid {
    /// Validate and sort. Unsorted input is accepted.
    pub fn new(mut times: Vec<f64>) -> Result<Self, ConfigurationError> {
        if times.is_empty() {
            return Err(ConfigurationError::EmptyTimes);
        }
        if let Some(&bad) = times.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
            return Err(ConfigurationError::InvalidTime(bad));
        }
        times.sort_by(f64::total_cmp);
        if let Some(w) = times.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigurationError::DuplicateTime(w[0]));
        }
        Ok(Self(times))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Complete description of a Sobol' analysis, excluding the model
#[derive(Debug, Clone)]
pub struct SobolConfig {
    /// Parameter names; defines the column order of every sample matrix
    pub parameters: Vec<String>,
    /// One distribution for all parameters, or one per parameter
    pub distributions: Vec<ParameterDistribution>,
    pub initial_state: Vec<StateVariable>,
    /// Output times (any order; sorted during validation)
    pub times: Vec<f64>,
    /// Monte Carlo sample size n
    pub n: usize,
    pub estimator: Estimator,
    pub method: IntegrationMethod,
    pub solver: SolverOptions,
    pub parallel: bool,
    /// Worker count for parallel evaluation (defaults to 1)
    pub workers: Option<usize>,
    /// RNG seed; `None` seeds from the operating system
    pub seed: Option<u64>,
}

fn default_distributions() -> Vec<ParameterDistribution> {
    ParameterDistribution::uniform(0.0, 1.0)
        .map(|d| vec![d])
        .unwrap_or_default()
}

impl SobolConfig {
    /// Defaults: U(0, 1) for every parameter, n = 1000, Martinez, ode45,
    /// sequential evaluation.
    pub fn new(parameters: Vec<String>, initial_state: Vec<StateVariable>, times: Vec<f64>) -> Self {
        Self {
            parameters,
            distributions: default_distributions(),
            initial_state,
            times,
            n: 1000,
            estimator: Estimator::default(),
            method: IntegrationMethod::default(),
            solver: SolverOptions::default(),
            parallel: false,
            workers: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn distributions(mut self, distributions: Vec<ParameterDistribution>) -> Self {
        self.distributions = distributions;
        self
    }

    #[must_use]
    pub fn samples(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    #[must_use]
    pub fn estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    #[must_use]
    pub fn method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    /// Enable parallel evaluation with the given worker count
    #[must_use]
    pub fn parallel(mut self, workers: Option<usize>) -> Self {
        self.parallel = true;
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the request against itself and against the model dimensions.
    pub fn validate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
    ) -> Result<ValidatedConfig<'_>, ConfigurationError> {
        if self.n < 2 {
            return Err(ConfigurationError::SampleSizeTooSmall(self.n));
        }

        if self.parameters.is_empty() {
            return Err(ConfigurationError::NoParameters);
        }
        let mut seen = FxHashSet::default();
        for name in &self.parameters {
            if !seen.insert(name.as_str()) {
                return Err(ConfigurationError::DuplicateParameter(name.clone()));
            }
        }

        if self.initial_state.is_empty() {
            return Err(ConfigurationError::NoStateVariables);
        }
        let mut seen = FxHashSet::default();
        for state in &self.initial_state {
            if !seen.insert(state.name.as_str()) {
                return Err(ConfigurationError::DuplicateStateVariable(
                    state.name.clone(),
                ));
            }
            if !state.initial.is_finite() {
                return Err(ConfigurationError::InvalidInitialValue {
                    name: state.name.clone(),
                    value: state.initial,
                });
            }
        }

        let times = TimeGrid::new(self.times.clone())?;
        let distributions = broadcast_distributions(&self.distributions, self.parameters.len())?;
        self.solver.validate()?;
        let execution = Execution::from_flags(self.parallel, self.workers)?;

        if model.state_dim() != self.initial_state.len() {
            return Err(ConfigurationError::StateDimensionMismatch {
                model: model.state_dim(),
                initial_state: self.initial_state.len(),
            });
        }
        if model.param_dim() != self.parameters.len() {
            return Err(ConfigurationError::ParameterDimensionMismatch {
                model: model.param_dim(),
                parameters: self.parameters.len(),
            });
        }

        Ok(ValidatedConfig {
            config: self,
            times,
            distributions,
            initial_values: self.initial_state.iter().map(|s| s.initial).collect(),
            execution,
        })
    }
}

/// A request that passed validation, with derived values resolved
#[derive(Debug)]
pub struct ValidatedConfig<'a> {
    pub config: &'a SobolConfig,
    pub times: TimeGrid,
    /// Exactly one distribution per parameter
    pub distributions: Vec<&'a ParameterDistribution>,
    pub initial_values: Vec<f64>,
    pub execution: Execution,
}
