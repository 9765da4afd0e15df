//! Request validation and error reporting
//!
//! Every failure here must surface as a configuration error before any
//! trajectory is evaluated.

use super::{decay_config, decay_with_inert};
use crate::analysis::analyze_with_progress;
use crate::config::StateVariable;
use crate::error::{ConfigurationError, SobolError};
use crate::estimator::Estimator;
use crate::ode::{IntegrationMethod, SolverOptions};
use crate::progress::AnalysisProgress;
use crate::sampling::ParameterDistribution;

fn configuration_error(result: crate::error::Result<crate::results::SensitivityResult>) -> ConfigurationError {
    match result {
        Err(SobolError::Configuration(err)) => err,
        other => panic!("expected configuration error, got {other:?}"),
    }
}

/// Runs the analysis and checks that no row was evaluated
fn rejected(config: &crate::config::SobolConfig, extra: usize) -> ConfigurationError {
    let model = decay_with_inert(extra);
    let progress = AnalysisProgress::new(0);
    let err = configuration_error(analyze_with_progress(&model, config, Some(&progress)));
    assert_eq!(progress.completed(), 0);
    err
}

#[test]
fn test_sample_size_below_two_rejected() {
    for n in [0, 1] {
        let config = decay_config(&["p"], vec![1.0], n);
        assert_eq!(rejected(&config, 0), ConfigurationError::SampleSizeTooSmall(n));
    }
}

#[test]
fn test_time_zero_rejected() {
    let config = decay_config(&["p"], vec![0.0, 1.0], 10);
    assert_eq!(rejected(&config, 0), ConfigurationError::InvalidTime(0.0));

    let config = decay_config(&["p"], vec![], 10);
    assert_eq!(rejected(&config, 0), ConfigurationError::EmptyTimes);

    let config = decay_config(&["p"], vec![1.0, 1.0], 10);
    assert_eq!(rejected(&config, 0), ConfigurationError::DuplicateTime(1.0));
}

#[test]
fn test_distribution_count_mismatch_rejected() {
    let distribution = ParameterDistribution::uniform(0.5, 1.5).unwrap();
    let config = decay_config(&["a", "b", "c", "d", "e"], vec![1.0], 10)
        .distributions(vec![distribution.clone(), distribution.clone(), distribution]);
    assert_eq!(
        rejected(&config, 4),
        ConfigurationError::DistributionCountMismatch {
            parameters: 5,
            distributions: 3,
        }
    );
}

#[test]
fn test_per_parameter_distributions_accepted() {
    let model = decay_with_inert(1);
    let config = decay_config(&["p", "q"], vec![1.0], 10).distributions(vec![
        ParameterDistribution::uniform(0.5, 1.5).unwrap(),
        ParameterDistribution::new("lnorm", [("sdlog", 0.5)]).unwrap(),
    ]);
    assert!(analyze_with_progress(&model, &config, None).is_ok());
}

#[test]
fn test_distribution_construction_errors() {
    assert_eq!(
        ParameterDistribution::new("weibull", [("shape", 2.0)]).unwrap_err(),
        ConfigurationError::UnknownDistribution("weibull".to_string())
    );
    assert!(matches!(
        ParameterDistribution::uniform(2.0, 1.0).unwrap_err(),
        ConfigurationError::InvalidDistributionParameters { .. }
    ));
    assert!(matches!(
        ParameterDistribution::new("unif", [("lower", 0.0)]).unwrap_err(),
        ConfigurationError::UnknownDistributionArgument { .. }
    ));
    assert!(matches!(
        ParameterDistribution::new("gamma", [("rate", 2.0)]).unwrap_err(),
        ConfigurationError::MissingDistributionArgument {
            argument: "shape",
            ..
        }
    ));
}

/// Building the request and running it stops at the distribution
#[test]
fn test_negative_spread_rejected_before_analysis() {
    let model = decay_with_inert(0);
    for (name, arg) in [("norm", "sd"), ("lnorm", "sdlog")] {
        let progress = AnalysisProgress::new(0);
        let result = ParameterDistribution::new(name, [(arg, -1.0)])
            .map_err(SobolError::from)
            .and_then(|distribution| {
                let config = decay_config(&["p"], vec![1.0], 10).distributions(vec![distribution]);
                analyze_with_progress(&model, &config, Some(&progress))
            });
        assert!(
            matches!(
                configuration_error(result),
                ConfigurationError::InvalidDistributionParameters { .. }
            ),
            "{name} with {arg} = -1"
        );
        assert_eq!(progress.completed(), 0);
    }
}

/// Output times a few ulps apart are still a valid grid
#[test]
fn test_adjacent_times_accepted_by_every_method() {
    let model = decay_with_inert(0);
    let times = vec![1.0, 1.0 + 4.0 * f64::EPSILON];
    for method in IntegrationMethod::ALL {
        let config = decay_config(&["p"], times.clone(), 10).method(method);
        let result = analyze_with_progress(&model, &config, None)
            .unwrap_or_else(|e| panic!("{method}: {e}"));
        assert_eq!(result.times().len(), 2);
        let (early, late) = (
            result.first_order(0, 0, 0).unwrap(),
            result.first_order(0, 1, 0).unwrap(),
        );
        assert!((early - late).abs() < 1e-9, "{method}: {early} vs {late}");
    }
}

#[test]
fn test_unknown_names_rejected() {
    assert_eq!(
        "sobol".parse::<Estimator>().unwrap_err(),
        ConfigurationError::UnknownEstimator("sobol".to_string())
    );
    assert_eq!(
        "lsoda".parse::<IntegrationMethod>().unwrap_err(),
        ConfigurationError::UnknownIntegrationMethod("lsoda".to_string())
    );
}

#[test]
fn test_duplicate_names_rejected() {
    let config = decay_config(&["p", "p"], vec![1.0], 10);
    assert_eq!(
        rejected(&config, 1),
        ConfigurationError::DuplicateParameter("p".to_string())
    );
}

#[test]
fn test_dimension_mismatch_rejected() {
    let mut config = decay_config(&["p"], vec![1.0], 10);
    config.initial_state.push(StateVariable::new("y", 0.0));
    assert!(matches!(
        rejected(&config, 0),
        ConfigurationError::StateDimensionMismatch {
            model: 1,
            initial_state: 2
        }
    ));
}

#[test]
fn test_solver_options_rejected() {
    let config = decay_config(&["p"], vec![1.0], 10).solver(SolverOptions {
        step: 0.0,
        ..SolverOptions::default()
    });
    assert!(matches!(
        rejected(&config, 0),
        ConfigurationError::InvalidSolverOptions(_)
    ));
}

#[test]
fn test_zero_workers_rejected() {
    let config = decay_config(&["p"], vec![1.0], 10).parallel(Some(0));
    assert_eq!(rejected(&config, 0), ConfigurationError::ZeroWorkers);
}
