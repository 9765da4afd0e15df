//! End-to-end Sobol' analysis pipeline.
//!
//! Sampler → matrix builder → trajectory evaluation → estimator → deviation
//! correction. Only trajectory evaluation runs in parallel; every other
//! stage is sequential and deterministic for a given seed.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::SobolConfig;
use crate::deviation::{DeviationWarning, IndexKind, correct};
use crate::error::{ConfigurationError, Result};
use crate::estimator::Estimator;
use crate::evaluate::{TrajectoryBatch, TrajectoryEvaluator, WorkerPool};
use crate::matrices::DesignMatrices;
use crate::ode::OdeModel;
use crate::progress::AnalysisProgress;
use crate::results::{SensitivityResult, StateSensitivity};
use crate::sampling::sample_base_matrices;

/// Run a Sobol' analysis of `model`.
pub fn analyze<M: OdeModel + ?Sized>(model: &M, config: &SobolConfig) -> Result<SensitivityResult> {
    analyze_with_progress(model, config, None)
}

/// Run a Sobol' analysis, reporting evaluated rows to `progress`.
///
/// The progress total is reset to n·(k+2) once the request is validated.
pub fn analyze_with_progress<M: OdeModel + ?Sized>(
    model: &M,
    config: &SobolConfig,
    progress: Option<&AnalysisProgress>,
) -> Result<SensitivityResult> {
    let validated = config.validate(model)?;

    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let (a, b) = sample_base_matrices(
        &config.parameters,
        &validated.distributions,
        config.n,
        &mut rng,
    );
    tracing::debug!(n = config.n, k = config.parameters.len(), "base matrices sampled");

    let design = DesignMatrices::build(config.estimator, a, b);
    tracing::debug!(
        estimator = %config.estimator,
        rows = design.total_rows(),
        "design matrices built"
    );
    if let Some(progress) = progress {
        progress.reset(design.total_rows());
    }

    let batches = {
        let pool = WorkerPool::new(validated.execution)?;
        let evaluator = TrajectoryEvaluator::new(
            model,
            &validated.initial_values,
            validated.times.as_slice(),
            config.method,
            &config.solver,
        );
        design
            .iter()
            .map(|matrix| evaluator.evaluate(matrix, &pool, progress))
            .collect::<std::result::Result<Vec<_>, _>>()?
    };
    tracing::debug!(
        method = %config.method,
        workers = validated.execution.workers(),
        "trajectories evaluated"
    );

    let state_names: Vec<String> = config.initial_state.iter().map(|s| s.name.clone()).collect();
    let result = compute_indices(
        config.estimator,
        &batches,
        &config.parameters,
        validated.times.as_slice(),
        &state_names,
        config.n,
    )?;

    for warning in &result.warnings {
        tracing::warn!("{warning}");
    }
    tracing::info!(
        estimator = %result.estimator,
        states = result.states.len(),
        times = result.times.len(),
        parameters = result.parameters.len(),
        warnings = result.warnings.len(),
        "sensitivity analysis complete"
    );

    Ok(result)
}

/// Estimate and correct indices from evaluated batches.
///
/// `batches` holds the outputs for A, B and then the mixed matrices in
/// parameter order, as produced by [`DesignMatrices::iter`]. Every batch must
/// have `n` rows and one lane per time and state.
pub fn compute_indices(
    estimator: Estimator,
    batches: &[TrajectoryBatch],
    parameters: &[String],
    times: &[f64],
    state_names: &[String],
    n: usize,
) -> std::result::Result<SensitivityResult, ConfigurationError> {
    let expected = parameters.len() + 2;
    if batches.len() != expected {
        return Err(ConfigurationError::BatchCountMismatch {
            expected,
            found: batches.len(),
        });
    }
    let shape = [n, times.len(), state_names.len()];
    for (batch, b) in batches.iter().enumerate() {
        let found = [b.n_samples(), b.n_times(), b.n_states()];
        if found != shape {
            return Err(ConfigurationError::BatchShapeMismatch {
                batch,
                expected: shape,
                found,
            });
        }
    }

    let mut states: Vec<StateSensitivity> = state_names
        .iter()
        .map(|name| StateSensitivity::new(name.clone(), times.len(), parameters.len()))
        .collect();
    let mut warnings = Vec::new();

    let (y_a, y_b, mixed) = (&batches[0], &batches[1], &batches[2..]);
    for (v, state) in states.iter_mut().enumerate() {
        for (t, &time) in times.iter().enumerate() {
            // In range after the shape check
            let lane = |batch: &TrajectoryBatch| batch.output(t, v).unwrap_or_default();
            let mixed_lanes: Vec<Vec<f64>> = mixed.iter().map(&lane).collect();
            let raw = estimator.estimate(&lane(y_a), &lane(y_b), &mixed_lanes);

            for ((j, parameter), (&first, &total)) in parameters
                .iter()
                .enumerate()
                .zip(raw.first_order.iter().zip(&raw.total_order))
            {
                for (kind, value, grid) in [
                    (IndexKind::FirstOrder, first, &mut state.first_order),
                    (IndexKind::TotalOrder, total, &mut state.total_order),
                ] {
                    let corrected = correct(value, kind);
                    grid.set(&[t, j], corrected.value);
                    if corrected.flagged {
                        warnings.push(DeviationWarning {
                            state: state.name.clone(),
                            time,
                            parameter: parameter.clone(),
                            kind,
                            value: corrected.value,
                        });
                    }
                }
            }
        }
    }

    Ok(SensitivityResult {
        estimator,
        n,
        parameters: parameters.to_vec(),
        times: times.to_vec(),
        states,
        warnings,
    })
}
