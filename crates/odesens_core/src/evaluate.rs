//! Trajectory evaluation over sample matrices.
//!
//! Every row of a sample matrix is integrated independently. With parallel
//! execution the rows are split into one contiguous chunk per worker and
//! evaluated on a thread pool owned by the caller; chunks are reassembled
//! by chunk index, so the batch row order never depends on scheduling.

use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ConfigurationError, IntegrationError, IntegrationFailure};
use crate::grid::IndexGrid;
use crate::matrices::SampleMatrix;
use crate::ode::{IntegrationMethod, OdeModel, SolverOptions};
use crate::progress::AnalysisProgress;

/// Trajectories for every row of one sample matrix.
///
/// Axis 0 is the sample row, axis 1 the output time, axis 2 the state
/// variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryBatch {
    grid: IndexGrid<f64>,
}

impl TrajectoryBatch {
    /// Assemble from per-row trajectories, each row-major `[time][state]`.
    pub fn from_trajectories(
        trajectories: &[Vec<f64>],
        n_times: usize,
        n_states: usize,
    ) -> Option<Self> {
        if trajectories.iter().any(|t| t.len() != n_times * n_states) {
            return None;
        }
        Some(Self::assemble(trajectories, n_times, n_states))
    }

    fn assemble(trajectories: &[Vec<f64>], n_times: usize, n_states: usize) -> Self {
        let width = n_times * n_states;
        let mut grid = IndexGrid::new(vec![trajectories.len(), n_times, n_states], 0.0);
        if width > 0 {
            for (dst, src) in grid.data_mut().chunks_exact_mut(width).zip(trajectories) {
                dst.copy_from_slice(src);
            }
        }
        Self { grid }
    }

    pub fn n_samples(&self) -> usize {
        self.grid.shape()[0]
    }

    pub fn n_times(&self) -> usize {
        self.grid.shape()[1]
    }

    pub fn n_states(&self) -> usize {
        self.grid.shape()[2]
    }

    pub fn value(&self, sample: usize, time: usize, state: usize) -> Option<f64> {
        self.grid.get(&[sample, time, state]).copied()
    }

    /// Output of one state variable at one time across all samples
    pub fn output(&self, time: usize, state: usize) -> Option<Vec<f64>> {
        self.grid.axis(0, &[None, Some(time), Some(state)])
    }
}

/// How trajectory evaluation is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Sequential,
    Parallel {
        workers: usize,
    },
}

impl Execution {
    /// Resolve the request flags. A parallel request without a worker count
    /// uses a single worker.
    pub fn from_flags(parallel: bool, workers: Option<usize>) -> Result<Self, ConfigurationError> {
        match (parallel, workers) {
            (false, _) => Ok(Execution::Sequential),
            (true, Some(0)) => Err(ConfigurationError::ZeroWorkers),
            (true, workers) => Ok(Execution::Parallel {
                workers: workers.unwrap_or(1),
            }),
        }
    }

    pub fn workers(&self) -> usize {
        match self {
            Execution::Sequential => 1,
            Execution::Parallel { workers } => *workers,
        }
    }
}

/// Worker pool scoped to a single analysis call.
///
/// Threads are started in [`WorkerPool::new`] and released when the pool is
/// dropped, whether the analysis succeeded or not.
pub struct WorkerPool {
    workers: usize,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    pub fn new(execution: Execution) -> Result<Self, ConfigurationError> {
        let workers = execution.workers();

        #[cfg(feature = "parallel")]
        let pool = match execution {
            Execution::Sequential => None,
            Execution::Parallel { workers } => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("odesens-worker-{i}"))
                    .build()
                    .map_err(|e| ConfigurationError::WorkerPool(e.to_string()))?,
            ),
        };

        #[cfg(not(feature = "parallel"))]
        if matches!(execution, Execution::Parallel { .. }) {
            tracing::debug!("parallel feature disabled; evaluating rows sequentially");
        }

        Ok(Self {
            workers,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Evaluate `f` on `0..len` and return the results in index order.
    ///
    /// Stops at the first error of any chunk.
    pub fn map_ordered<T, E, F>(&self, len: usize, f: F) -> Result<Vec<T>, E>
    where
        T: Send,
        E: Send,
        F: Fn(usize) -> Result<T, E> + Sync,
    {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            let chunks = partition(len, self.workers);
            let per_chunk: Vec<Vec<T>> = pool.install(|| {
                chunks
                    .into_par_iter()
                    .map(|range| range.map(&f).collect::<Result<Vec<T>, E>>())
                    .collect::<Result<Vec<_>, E>>()
            })?;
            return Ok(per_chunk.into_iter().flatten().collect());
        }

        (0..len).map(f).collect()
    }
}

/// Split `0..len` into at most `workers` contiguous, non-empty ranges
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let chunk = len.div_ceil(workers.clamp(1, len));
    (0..len)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(len))
        .collect()
}

/// Integrates a model for the rows of sample matrices.
pub struct TrajectoryEvaluator<'a, M: ?Sized> {
    model: &'a M,
    initial_state: &'a [f64],
    times: &'a [f64],
    method: IntegrationMethod,
    options: &'a SolverOptions,
}

impl<'a, M: OdeModel + ?Sized> TrajectoryEvaluator<'a, M> {
    pub fn new(
        model: &'a M,
        initial_state: &'a [f64],
        times: &'a [f64],
        method: IntegrationMethod,
        options: &'a SolverOptions,
    ) -> Self {
        Self {
            model,
            initial_state,
            times,
            method,
            options,
        }
    }

    /// Trajectory for a single parameter row
    pub fn trajectory(&self, params: &[f64]) -> Result<Vec<f64>, IntegrationFailure> {
        self.method.integrate(
            self.model,
            params,
            self.initial_state,
            self.times,
            self.options,
        )
    }

    /// Trajectories for every row of `matrix`, in row order.
    pub fn evaluate(
        &self,
        matrix: &SampleMatrix,
        pool: &WorkerPool,
        progress: Option<&AnalysisProgress>,
    ) -> Result<TrajectoryBatch, IntegrationError> {
        let trajectories = pool.map_ordered(matrix.nrows(), |row| {
            let params = matrix.row(row);
            let trajectory = self.trajectory(params).map_err(|cause| IntegrationError {
                row,
                parameters: params.to_vec(),
                cause,
            })?;
            if let Some(progress) = progress {
                progress.increment();
            }
            Ok(trajectory)
        })?;

        tracing::trace!(rows = matrix.nrows(), workers = pool.workers(), "batch evaluated");

        Ok(TrajectoryBatch::assemble(
            &trajectories,
            self.times.len(),
            self.initial_state.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::OdeFn;

    fn growth_model() -> OdeFn<impl Fn(f64, &[f64], &[f64], &mut [f64]) + Sync> {
        // x' = p0 * x, y' = p1
        OdeFn::new(2, 2, |_t, y: &[f64], p: &[f64], dy: &mut [f64]| {
            dy[0] = p[0] * y[0];
            dy[1] = p[1];
        })
    }

    fn matrix(rows: usize) -> SampleMatrix {
        let data: Vec<f64> = (0..rows)
            .flat_map(|i| [0.01 * i as f64, 0.5 + i as f64])
            .collect();
        SampleMatrix::from_rows(vec!["r".into(), "s".into()], data).unwrap()
    }

    #[test]
    fn test_partition_covers_range() {
        assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
        assert_eq!(partition(2, 8), vec![0..1, 1..2]);
        assert_eq!(partition(5, 1), vec![0..5]);
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_execution_flags() {
        assert_eq!(
            Execution::from_flags(false, Some(8)).unwrap(),
            Execution::Sequential
        );
        assert_eq!(
            Execution::from_flags(true, None).unwrap(),
            Execution::Parallel { workers: 1 }
        );
        assert_eq!(
            Execution::from_flags(true, Some(0)).unwrap_err(),
            ConfigurationError::ZeroWorkers
        );
    }

    #[test]
    fn test_batch_layout() {
        let model = growth_model();
        let options = SolverOptions::default();
        let times = [1.0, 2.0, 3.0];
        let y0 = [1.0, 0.0];
        let evaluator =
            TrajectoryEvaluator::new(&model, &y0, &times, IntegrationMethod::Rk4, &options);
        let pool = WorkerPool::new(Execution::Sequential).unwrap();
        let m = matrix(4);

        let batch = evaluator.evaluate(&m, &pool, None).unwrap();
        assert_eq!(batch.n_samples(), 4);
        assert_eq!(batch.n_times(), 3);
        assert_eq!(batch.n_states(), 2);

        // y(t) = p1 * t exactly
        for row in 0..4 {
            for (ti, t) in times.iter().enumerate() {
                let y = batch.value(row, ti, 1).unwrap();
                assert!((y - m.get(row, 1) * t).abs() < 1e-9);
            }
        }
        let lane = batch.output(2, 1).unwrap();
        assert_eq!(lane.len(), 4);
        assert_eq!(lane[1], batch.value(1, 2, 1).unwrap());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = growth_model();
        let options = SolverOptions::default();
        let times = [0.5, 1.5];
        let y0 = [1.0, 0.0];
        let evaluator =
            TrajectoryEvaluator::new(&model, &y0, &times, IntegrationMethod::Ode45, &options);
        let m = matrix(37);

        let sequential = WorkerPool::new(Execution::Sequential).unwrap();
        let expected = evaluator.evaluate(&m, &sequential, None).unwrap();

        for workers in [1, 2, 3, 8] {
            let pool = WorkerPool::new(Execution::Parallel { workers }).unwrap();
            let progress = AnalysisProgress::new(37);
            let batch = evaluator.evaluate(&m, &pool, Some(&progress)).unwrap();
            assert_eq!(batch, expected, "workers = {workers}");
            assert_eq!(progress.completed(), 37);
        }
    }

    #[test]
    fn test_failure_reports_row() {
        // Blows up only for positive p0
        let model = OdeFn::new(1, 1, |_t, y: &[f64], p: &[f64], dy: &mut [f64]| {
            dy[0] = p[0] * y[0] * y[0];
        });
        let options = SolverOptions::default();
        let times = [5.0];
        let y0 = [1.0];
        let evaluator =
            TrajectoryEvaluator::new(&model, &y0, &times, IntegrationMethod::Rk4, &options);
        let m = SampleMatrix::from_rows(vec!["p".into()], vec![-1.0, -0.5, 1.0, -2.0]).unwrap();

        for execution in [Execution::Sequential, Execution::Parallel { workers: 2 }] {
            let pool = WorkerPool::new(execution).unwrap();
            let err = evaluator.evaluate(&m, &pool, None).unwrap_err();
            assert_eq!(err.row, 2);
            assert_eq!(err.parameters, vec![1.0]);
        }
    }

    #[test]
    fn test_from_trajectories_checks_width() {
        assert!(TrajectoryBatch::from_trajectories(&[vec![1.0, 2.0]], 1, 3).is_none());
        let batch =
            TrajectoryBatch::from_trajectories(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2, 1).unwrap();
        assert_eq!(batch.value(1, 0, 0), Some(3.0));
        assert_eq!(batch.output(1, 0), Some(vec![2.0, 4.0]));
    }
}
