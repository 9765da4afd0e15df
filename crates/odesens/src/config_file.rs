//! YAML analysis description.
//!
//! ```yaml
//! model: lotka_volterra
//! times: [1.0, 5.0, 10.0]
//! n: 2000
//! estimator: Jansen
//! method: ode45
//! distributions:
//!   - name: unif
//!     args: { min: 0.9, max: 1.1 }
//! initial_state:
//!   prey: 20.0
//! parallel: true
//! workers: 4
//! seed: 7
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use odesens_core::{
    BuiltinModel, ConfigurationError, Estimator, IntegrationMethod, ParameterDistribution,
    SobolConfig, SolverOptions, StateVariable,
};
use serde::{Deserialize, Serialize};

/// A distribution name with its named arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionEntry {
    pub name: String,
    #[serde(default)]
    pub args: BTreeMap<String, f64>,
}

impl DistributionEntry {
    pub fn to_distribution(&self) -> Result<ParameterDistribution, ConfigurationError> {
        ParameterDistribution::new(&self.name, self.args.iter().map(|(k, v)| (k.clone(), *v)))
    }
}

/// Solver settings; missing fields keep the library defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverSection {
    pub step: Option<f64>,
    pub max_step: Option<f64>,
    pub rtol: Option<f64>,
    pub atol: Option<f64>,
    pub max_steps: Option<usize>,
}

impl SolverSection {
    pub fn to_options(&self) -> SolverOptions {
        let defaults = SolverOptions::default();
        SolverOptions {
            step: self.step.unwrap_or(defaults.step),
            max_step: self.max_step.or(defaults.max_step),
            rtol: self.rtol.unwrap_or(defaults.rtol),
            atol: self.atol.unwrap_or(defaults.atol),
            max_steps: self.max_steps.unwrap_or(defaults.max_steps),
        }
    }
}

fn default_samples() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisFile {
    /// Built-in model name (see `odesens models`)
    pub model: String,
    /// Parameter names; defaults to the model's own names
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
    /// One entry for all parameters, or one per parameter
    #[serde(default)]
    pub distributions: Vec<DistributionEntry>,
    /// Initial values by state name; unnamed states keep the model default
    #[serde(default)]
    pub initial_state: BTreeMap<String, f64>,
    pub times: Vec<f64>,
    #[serde(default = "default_samples")]
    pub n: usize,
    #[serde(default)]
    pub estimator: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub solver: SolverSection,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AnalysisFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).wrap_err_with(|| format!("Failed to parse {}", path.display()))
    }

    /// Resolve names against the registries and build the request.
    ///
    /// Only name resolution happens here; the request itself is validated
    /// when the analysis starts.
    pub fn to_request(&self) -> Result<(BuiltinModel, SobolConfig), ConfigurationError> {
        let model: BuiltinModel = self.model.parse()?;

        let mut initial_state = model.default_initial_state();
        for (name, &value) in &self.initial_state {
            let state = initial_state
                .iter_mut()
                .find(|s| &s.name == name)
                .ok_or_else(|| ConfigurationError::UnknownStateVariable(name.clone()))?;
            *state = StateVariable::new(name.clone(), value);
        }

        let parameters = match &self.parameters {
            Some(names) => names.clone(),
            None => model
                .parameter_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let mut config = SobolConfig::new(parameters, initial_state, self.times.clone())
            .samples(self.n)
            .solver(self.solver.to_options());

        if !self.distributions.is_empty() {
            let distributions = self
                .distributions
                .iter()
                .map(DistributionEntry::to_distribution)
                .collect::<Result<Vec<_>, _>>()?;
            config = config.distributions(distributions);
        }
        if let Some(estimator) = &self.estimator {
            config = config.estimator(estimator.parse::<Estimator>()?);
        }
        if let Some(method) = &self.method {
            config = config.method(method.parse::<IntegrationMethod>()?);
        }
        config.parallel = self.parallel;
        config.workers = self.workers;
        config.seed = self.seed;

        Ok((model, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odesens_core::DistributionKind;
    use std::fs;
    use tempfile::tempdir;

    const LOTKA_VOLTERRA: &str = r#"
model: lotka_volterra
times: [5.0, 1.0]
n: 200
estimator: jansen
method: rk4
distributions:
  - name: unif
    args: { min: 0.9, max: 1.1 }
  - name: norm
    args: { mean: 0.1, sd: 0.005 }
  - name: unif
    args: { min: 0.045, max: 0.055 }
  - name: triangle
    args: { min: 0.4, max: 0.6, mode: 0.5 }
initial_state:
  prey: 20.0
solver:
  step: 0.005
parallel: true
workers: 2
seed: 3
"#;

    #[test]
    fn test_full_file() {
        let file = AnalysisFile::from_yaml(LOTKA_VOLTERRA).unwrap();
        let (model, config) = file.to_request().unwrap();

        assert_eq!(model, BuiltinModel::LotkaVolterra);
        assert_eq!(config.n, 200);
        assert_eq!(config.estimator, Estimator::Jansen);
        assert_eq!(config.method, IntegrationMethod::Rk4);
        assert_eq!(config.solver.step, 0.005);
        assert_eq!(config.solver.rtol, SolverOptions::default().rtol);
        assert_eq!(config.distributions.len(), 4);
        assert_eq!(config.distributions[3].kind(), DistributionKind::Triangular);
        assert_eq!(
            config.initial_state,
            vec![
                StateVariable::new("prey", 20.0),
                StateVariable::new("predator", 5.0)
            ]
        );
        assert_eq!(config.parameters.len(), 4);
        assert!(config.parallel);
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.seed, Some(3));
        assert!(config.validate(&model).is_ok());
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let file = AnalysisFile::from_yaml("model: decay\ntimes: [1.0]\n").unwrap();
        let (model, config) = file.to_request().unwrap();
        assert_eq!(model, BuiltinModel::Decay);
        assert_eq!(config.n, 1000);
        assert_eq!(config.estimator, Estimator::Martinez);
        assert_eq!(config.method, IntegrationMethod::Ode45);
        assert_eq!(config.parameters, vec!["k".to_string()]);
        assert!(!config.parallel);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_unknown_names() {
        let file = AnalysisFile::from_yaml("model: brusselator\ntimes: [1.0]\n").unwrap();
        assert!(matches!(
            file.to_request().unwrap_err(),
            ConfigurationError::UnknownModel(_)
        ));

        let file =
            AnalysisFile::from_yaml("model: decay\ntimes: [1.0]\nestimator: sobol\n").unwrap();
        assert!(matches!(
            file.to_request().unwrap_err(),
            ConfigurationError::UnknownEstimator(_)
        ));

        let file =
            AnalysisFile::from_yaml("model: decay\ntimes: [1.0]\ninitial_state: { y: 2.0 }\n")
                .unwrap();
        assert_eq!(
            file.to_request().unwrap_err(),
            ConfigurationError::UnknownStateVariable("y".to_string())
        );

        let file = AnalysisFile::from_yaml(
            "model: decay\ntimes: [1.0]\ndistributions:\n  - name: cauchy\n",
        )
        .unwrap();
        assert!(matches!(
            file.to_request().unwrap_err(),
            ConfigurationError::UnknownDistribution(_)
        ));
    }

    #[test]
    fn test_negative_spread_rejected() {
        for entry in [
            "{ name: norm, args: { sd: -1.0 } }",
            "{ name: lnorm, args: { sdlog: -1.0 } }",
        ] {
            let yaml = format!("model: decay\ntimes: [1.0]\ndistributions:\n  - {entry}\n");
            let file = AnalysisFile::from_yaml(&yaml).unwrap();
            assert!(
                matches!(
                    file.to_request().unwrap_err(),
                    ConfigurationError::InvalidDistributionParameters { .. }
                ),
                "{entry}"
            );
        }
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AnalysisFile::from_yaml("model: decay\ntimes: [1.0]\nsamples: 10\n").is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        fs::write(&path, LOTKA_VOLTERRA).unwrap();

        let file = AnalysisFile::load(&path).unwrap();
        assert_eq!(file.model, "lotka_volterra");
        assert_eq!(file.times, vec![5.0, 1.0]);

        assert!(AnalysisFile::load(&dir.path().join("missing.yaml")).is_err());
    }
}
