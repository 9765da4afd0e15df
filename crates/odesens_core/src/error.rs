use std::fmt;

/// Errors raised while validating an analysis request.
///
/// Every variant is detected before any sampling or integration starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Fewer than two Monte Carlo samples were requested
    SampleSizeTooSmall(usize),
    NoParameters,
    DuplicateParameter(String),
    NoStateVariables,
    DuplicateStateVariable(String),
    UnknownStateVariable(String),
    InvalidInitialValue {
        name: String,
        value: f64,
    },
    EmptyTimes,
    /// A time that is zero, negative or not finite
    InvalidTime(f64),
    DuplicateTime(f64),
    UnknownDistribution(String),
    UnknownDistributionArgument {
        distribution: &'static str,
        argument: String,
    },
    MissingDistributionArgument {
        distribution: &'static str,
        argument: &'static str,
    },
    InvalidDistributionParameters {
        distribution: &'static str,
        reason: String,
    },
    /// Distribution list length is neither 1 nor the parameter count
    DistributionCountMismatch {
        parameters: usize,
        distributions: usize,
    },
    UnknownEstimator(String),
    UnknownIntegrationMethod(String),
    UnknownModel(String),
    InvalidSolverOptions(&'static str),
    ZeroWorkers,
    StateDimensionMismatch {
        model: usize,
        initial_state: usize,
    },
    ParameterDimensionMismatch {
        model: usize,
        parameters: usize,
    },
    /// The per-call worker pool could not be started
    WorkerPool(String),
    /// Evaluated batch count is not parameters + 2
    BatchCountMismatch {
        expected: usize,
        found: usize,
    },
    /// A batch's `[samples, times, states]` shape disagrees with the request
    BatchShapeMismatch {
        batch: usize,
        expected: [usize; 3],
        found: [usize; 3],
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::SampleSizeTooSmall(n) => {
                write!(f, "sample size must be at least 2 (got {n})")
            }
            ConfigurationError::NoParameters => write!(f, "at least one parameter is required"),
            ConfigurationError::DuplicateParameter(name) => {
                write!(f, "parameter {name:?} is listed more than once")
            }
            ConfigurationError::NoStateVariables => {
                write!(f, "at least one state variable is required")
            }
            ConfigurationError::DuplicateStateVariable(name) => {
                write!(f, "state variable {name:?} is listed more than once")
            }
            ConfigurationError::UnknownStateVariable(name) => {
                write!(f, "model has no state variable named {name:?}")
            }
            ConfigurationError::InvalidInitialValue { name, value } => {
                write!(f, "initial value of {name:?} must be finite (got {value})")
            }
            ConfigurationError::EmptyTimes => write!(f, "at least one timepoint is required"),
            ConfigurationError::InvalidTime(t) => {
                write!(f, "timepoints must be positive and finite (got {t})")
            }
            ConfigurationError::DuplicateTime(t) => write!(f, "timepoint {t} appears more than once"),
            ConfigurationError::UnknownDistribution(name) => {
                write!(f, "unknown distribution {name:?}")
            }
            ConfigurationError::UnknownDistributionArgument {
                distribution,
                argument,
            } => write!(f, "{distribution} distribution has no argument {argument:?}"),
            ConfigurationError::MissingDistributionArgument {
                distribution,
                argument,
            } => write!(f, "{distribution} distribution requires argument {argument:?}"),
            ConfigurationError::InvalidDistributionParameters {
                distribution,
                reason,
            } => write!(f, "invalid {distribution} parameters: {reason}"),
            ConfigurationError::DistributionCountMismatch {
                parameters,
                distributions,
            } => write!(
                f,
                "expected 1 or {parameters} distributions, got {distributions}"
            ),
            ConfigurationError::UnknownEstimator(name) => {
                write!(f, "unknown estimator {name:?} (expected Jansen or Martinez)")
            }
            ConfigurationError::UnknownIntegrationMethod(name) => {
                write!(f, "unknown integration method {name:?}")
            }
            ConfigurationError::UnknownModel(name) => write!(f, "unknown model {name:?}"),
            ConfigurationError::InvalidSolverOptions(reason) => {
                write!(f, "invalid solver options: {reason}")
            }
            ConfigurationError::ZeroWorkers => write!(f, "worker count must be at least 1"),
            ConfigurationError::StateDimensionMismatch {
                model,
                initial_state,
            } => write!(
                f,
                "model expects {model} state variables, initial state has {initial_state}"
            ),
            ConfigurationError::ParameterDimensionMismatch { model, parameters } => write!(
                f,
                "model expects {model} parameters, request names {parameters}"
            ),
            ConfigurationError::WorkerPool(msg) => write!(f, "failed to start worker pool: {msg}"),
            ConfigurationError::BatchCountMismatch { expected, found } => {
                write!(f, "expected {expected} trajectory batches, got {found}")
            }
            ConfigurationError::BatchShapeMismatch {
                batch,
                expected,
                found,
            } => write!(
                f,
                "trajectory batch {batch} has shape {found:?}, expected {expected:?}"
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Why a single integration run stopped
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationFailure {
    /// The state vector contained NaN or infinity
    NonFinite { time: f64 },
    StepSizeUnderflow { time: f64, step: f64 },
    MaxStepsExceeded { time: f64, max_steps: usize },
}

impl fmt::Display for IntegrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationFailure::NonFinite { time } => {
                write!(f, "state became non-finite at t={time}")
            }
            IntegrationFailure::StepSizeUnderflow { time, step } => {
                write!(f, "step size underflow at t={time} (h={step:e})")
            }
            IntegrationFailure::MaxStepsExceeded { time, max_steps } => {
                write!(f, "exceeded {max_steps} steps before t={time}")
            }
        }
    }
}

impl std::error::Error for IntegrationFailure {}

/// The solver failed for one sample row.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationError {
    /// Row index within the sample matrix being evaluated
    pub row: usize,
    /// Parameter values of the failing row, in parameter order
    pub parameters: Vec<f64>,
    pub cause: IntegrationFailure,
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "integration failed for sample row {} (parameters {:?}): {}",
            self.row, self.parameters, self.cause
        )
    }
}

impl std::error::Error for IntegrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Top-level error of a sensitivity analysis
#[derive(Debug, Clone, PartialEq)]
pub enum SobolError {
    Configuration(ConfigurationError),
    Integration(IntegrationError),
}

impl fmt::Display for SobolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SobolError::Configuration(e) => write!(f, "configuration error: {e}"),
            SobolError::Integration(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SobolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SobolError::Configuration(e) => Some(e),
            SobolError::Integration(e) => Some(e),
        }
    }
}

impl From<ConfigurationError> for SobolError {
    fn from(err: ConfigurationError) -> Self {
        SobolError::Configuration(err)
    }
}

impl From<IntegrationError> for SobolError {
    fn from(err: IntegrationError) -> Self {
        SobolError::Integration(err)
    }
}

pub type Result<T> = std::result::Result<T, SobolError>;
