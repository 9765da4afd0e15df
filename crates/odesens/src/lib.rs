//! Command-line front end for odesens_core
//!
//! Reads an analysis description from YAML, runs the Sobol' analysis on one
//! of the built-in models and writes the indices as JSON.

pub mod config_file;
pub mod logging;
pub mod report;

use std::path::Path;
use std::thread;
use std::time::Duration;

use color_eyre::eyre::WrapErr;
use odesens_core::{AnalysisProgress, SensitivityResult, analyze_with_progress};

pub use config_file::{AnalysisFile, DistributionEntry, SolverSection};
pub use logging::init_logging;
pub use report::{atomic_write, models_listing, write_result};

/// Interval between progress log lines
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub seed: Option<u64>,
}

/// Load `path`, run the analysis and return the result.
///
/// Progress is logged at debug level from the calling thread while the
/// analysis runs on a scoped thread.
pub fn run_file(path: &Path, overrides: &Overrides) -> color_eyre::Result<SensitivityResult> {
    let file = AnalysisFile::load(path)?;
    let (model, mut config) = file
        .to_request()
        .wrap_err_with(|| format!("Invalid analysis file {}", path.display()))?;

    if let Some(workers) = overrides.workers {
        config = config.parallel(Some(workers));
    }
    if let Some(seed) = overrides.seed {
        config = config.seed(seed);
    }

    tracing::info!(
        model = %model,
        n = config.n,
        estimator = %config.estimator,
        method = %config.method,
        "starting analysis"
    );

    let progress = AnalysisProgress::new(0);
    let result = thread::scope(|scope| {
        let worker = scope.spawn(|| analyze_with_progress(&model, &config, Some(&progress)));
        while !worker.is_finished() {
            thread::sleep(PROGRESS_INTERVAL);
            tracing::debug!(
                completed = progress.completed(),
                total = progress.total(),
                "{:.0}% of trajectories evaluated",
                progress.fraction() * 100.0
            );
        }
        worker.join()
    });

    match result {
        Ok(result) => result.wrap_err("Sensitivity analysis failed"),
        Err(_) => Err(color_eyre::eyre::eyre!("Analysis thread panicked")),
    }
}
