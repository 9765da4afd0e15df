//! Variance-based sensitivity analysis of ODE models
//!
//! This crate estimates Sobol' sensitivity indices of every state variable of
//! a parametric ODE system, at every requested time, with respect to each
//! model parameter. It supports:
//! - Jansen and Martinez Monte Carlo estimators (first- and total-order)
//! - A registry of parameter distributions (uniform, normal, log-normal, ...)
//! - Fixed-step (Euler, RK4) and adaptive (ode23, ode45) integrators
//! - Order-preserving parallel trajectory evaluation on a per-call pool
//! - Clamping of small numerical deviations with warnings for larger ones
//!
//! # Example
//!
//! ```ignore
//! use odesens_core::{BuiltinModel, Estimator, ParameterDistribution, analyze};
//!
//! let model = BuiltinModel::Decay;
//! let config = model
//!     .config(vec![1.0, 2.0, 5.0])
//!     .distributions(vec![ParameterDistribution::uniform(0.5, 1.5)?])
//!     .samples(2000)
//!     .estimator(Estimator::Martinez)
//!     .parallel(Some(4))
//!     .seed(7);
//!
//! let result = analyze(&model, &config)?;
//! let s = result.first_order(0, 0, 0);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Pipeline stages
// ============================================================================

pub mod analysis;
pub mod deviation;
pub mod estimator;
pub mod evaluate;
pub mod matrices;
pub mod ode;
pub mod sampling;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod error;
pub mod grid;
pub mod models;
pub mod progress;
pub mod results;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{analyze, analyze_with_progress};
pub use config::{SobolConfig, StateVariable, TimeGrid};
pub use deviation::{DeviationWarning, IndexKind};
pub use error::{ConfigurationError, IntegrationError, IntegrationFailure, Result, SobolError};
pub use estimator::Estimator;
pub use evaluate::{Execution, TrajectoryBatch};
pub use grid::IndexGrid;
pub use models::BuiltinModel;
pub use ode::{IntegrationMethod, OdeFn, OdeModel, SolverOptions};
pub use progress::AnalysisProgress;
pub use results::{SensitivityResult, StateSensitivity};
pub use sampling::{DistributionKind, ParameterDistribution};
