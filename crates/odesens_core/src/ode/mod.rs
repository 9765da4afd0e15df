//! ODE models and the integrators that produce their trajectories.
//!
//! The analysis only relies on [`IntegrationMethod::integrate`]: given a
//! model, a parameter row, an initial state and the output times, return
//! the state at every output time. Integration always starts at t = 0.

mod adaptive;
mod fixed;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, IntegrationFailure};

/// Right-hand side of a parametric ODE system `dy/dt = f(t, y, p)`.
///
/// Models are shared read-only across worker threads, hence `Sync`.
pub trait OdeModel: Sync {
    /// Number of state variables
    fn state_dim(&self) -> usize;

    /// Number of parameters
    fn param_dim(&self) -> usize;

    /// Write `f(t, state, params)` into `dydt`.
    fn rhs(&self, t: f64, state: &[f64], params: &[f64], dydt: &mut [f64]);
}

/// Adapter turning a closure into an [`OdeModel`]
pub struct OdeFn<F> {
    state_dim: usize,
    param_dim: usize,
    f: F,
}

impl<F> OdeFn<F>
where
    F: Fn(f64, &[f64], &[f64], &mut [f64]) + Sync,
{
    pub fn new(state_dim: usize, param_dim: usize, f: F) -> Self {
        Self {
            state_dim,
            param_dim,
            f,
        }
    }
}

impl<F> OdeModel for OdeFn<F>
where
    F: Fn(f64, &[f64], &[f64], &mut [f64]) + Sync,
{
    fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn param_dim(&self) -> usize {
        self.param_dim
    }

    fn rhs(&self, t: f64, state: &[f64], params: &[f64], dydt: &mut [f64]) {
        (self.f)(t, state, params, dydt)
    }
}

/// Tolerances and step limits shared by all integration methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Step size upper bound for the fixed-step methods
    pub step: f64,
    /// Step size cap for the adaptive methods (`None` = unbounded)
    pub max_step: Option<f64>,
    pub rtol: f64,
    pub atol: f64,
    /// Step limit per output interval
    pub max_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            step: 0.01,
            max_step: None,
            rtol: 1e-6,
            atol: 1e-8,
            max_steps: 100_000,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(ConfigurationError::InvalidSolverOptions(
                "step must be positive and finite",
            ));
        }
        if let Some(h) = self.max_step
            && !(h > 0.0)
        {
            return Err(ConfigurationError::InvalidSolverOptions(
                "max_step must be positive",
            ));
        }
        if !(self.rtol > 0.0 && self.atol >= 0.0) {
            return Err(ConfigurationError::InvalidSolverOptions(
                "rtol must be positive and atol non-negative",
            ));
        }
        if self.max_steps == 0 {
            return Err(ConfigurationError::InvalidSolverOptions(
                "max_steps must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Registry of the available integration methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntegrationMethod {
    /// Explicit Euler, fixed step
    Euler,
    /// Classical fourth-order Runge-Kutta, fixed step
    Rk4,
    /// Bogacki-Shampine 3(2), adaptive step
    Ode23,
    /// Dormand-Prince 5(4), adaptive step
    #[default]
    Ode45,
}

impl IntegrationMethod {
    pub const ALL: [IntegrationMethod; 4] = [
        IntegrationMethod::Euler,
        IntegrationMethod::Rk4,
        IntegrationMethod::Ode23,
        IntegrationMethod::Ode45,
    ];

    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(IntegrationMethod::Euler),
            "rk4" => Ok(IntegrationMethod::Rk4),
            "ode23" => Ok(IntegrationMethod::Ode23),
            "ode45" => Ok(IntegrationMethod::Ode45),
            _ => Err(ConfigurationError::UnknownIntegrationMethod(
                name.to_string(),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntegrationMethod::Euler => "euler",
            IntegrationMethod::Rk4 => "rk4",
            IntegrationMethod::Ode23 => "ode23",
            IntegrationMethod::Ode45 => "ode45",
        }
    }

    /// Integrate from t = 0 and return the state at each of `times`.
    ///
    /// `times` must be positive and strictly increasing. The result is
    /// row-major `[time][state]`, i.e. `times.len() * y0.len()` values.
    pub fn integrate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        params: &[f64],
        y0: &[f64],
        times: &[f64],
        options: &SolverOptions,
    ) -> Result<Vec<f64>, IntegrationFailure> {
        match self {
            IntegrationMethod::Euler => {
                fixed::integrate(model, params, y0, times, options, fixed::euler_step)
            }
            IntegrationMethod::Rk4 => {
                fixed::integrate(model, params, y0, times, options, fixed::rk4_step)
            }
            IntegrationMethod::Ode23 => adaptive::integrate(
                model,
                params,
                y0,
                times,
                options,
                &adaptive::BOGACKI_SHAMPINE,
            ),
            IntegrationMethod::Ode45 => adaptive::integrate(
                model,
                params,
                y0,
                times,
                options,
                &adaptive::DORMAND_PRINCE,
            ),
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegrationMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

fn check_finite(state: &[f64], time: f64) -> Result<(), IntegrationFailure> {
    if state.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(IntegrationFailure::NonFinite { time })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay() -> OdeFn<impl Fn(f64, &[f64], &[f64], &mut [f64]) + Sync> {
        OdeFn::new(1, 1, |_t, y: &[f64], p: &[f64], dy: &mut [f64]| {
            dy[0] = -p[0] * y[0];
        })
    }

    /// x'' = -x written as a first-order system
    fn harmonic() -> OdeFn<impl Fn(f64, &[f64], &[f64], &mut [f64]) + Sync> {
        OdeFn::new(2, 0, |_t, y: &[f64], _p: &[f64], dy: &mut [f64]| {
            dy[0] = y[1];
            dy[1] = -y[0];
        })
    }

    #[test]
    fn test_method_registry() {
        assert_eq!(
            IntegrationMethod::from_name("RK4").unwrap(),
            IntegrationMethod::Rk4
        );
        assert_eq!(
            "ode45".parse::<IntegrationMethod>().unwrap(),
            IntegrationMethod::Ode45
        );
        assert!(matches!(
            IntegrationMethod::from_name("lsoda"),
            Err(ConfigurationError::UnknownIntegrationMethod(_))
        ));
        assert_eq!(IntegrationMethod::default(), IntegrationMethod::Ode45);
    }

    #[test]
    fn test_all_methods_solve_decay() {
        let model = decay();
        let options = SolverOptions::default();
        let times = [0.5, 1.0, 2.0];
        for method in IntegrationMethod::ALL {
            let out = method
                .integrate(&model, &[0.8], &[1.0], &times, &options)
                .unwrap();
            assert_eq!(out.len(), 3);
            let tol = if method == IntegrationMethod::Euler {
                1e-2
            } else {
                1e-5
            };
            for (t, y) in times.iter().zip(&out) {
                let exact = (-0.8 * t).exp();
                assert!(
                    (y - exact).abs() < tol,
                    "{method}: y({t}) = {y}, expected {exact}"
                );
            }
        }
    }

    #[test]
    fn test_adaptive_harmonic_oscillator() {
        let model = harmonic();
        let options = SolverOptions::default();
        let times = [1.0, std::f64::consts::PI, 10.0];
        for method in [IntegrationMethod::Ode23, IntegrationMethod::Ode45] {
            let out = method
                .integrate(&model, &[], &[1.0, 0.0], &times, &options)
                .unwrap();
            for (i, t) in times.iter().enumerate() {
                assert!((out[2 * i] - t.cos()).abs() < 1e-3, "{method} x({t})");
                assert!((out[2 * i + 1] + t.sin()).abs() < 1e-3, "{method} v({t})");
            }
        }
    }

    #[test]
    fn test_output_times_closer_than_step_resolution() {
        let model = decay();
        let times = [1.0, 1.0 + 4.0 * f64::EPSILON, 2.0];
        for method in IntegrationMethod::ALL {
            let out = method
                .integrate(&model, &[0.8], &[1.0], &times, &SolverOptions::default())
                .unwrap_or_else(|e| panic!("{method}: {e}"));
            assert_eq!(out.len(), 3);
            assert!((out[0] - out[1]).abs() < 1e-12, "{method}");
            assert!((out[2] - (-1.6f64).exp()).abs() < 1e-2, "{method}");
        }
    }

    #[test]
    fn test_blow_up_reports_failure() {
        // y' = y^2 with y(0) = 1 explodes at t = 1
        let model = OdeFn::new(1, 0, |_t, y: &[f64], _p: &[f64], dy: &mut [f64]| {
            dy[0] = y[0] * y[0];
        });
        for method in IntegrationMethod::ALL {
            let result = method.integrate(&model, &[], &[1.0], &[2.0], &SolverOptions::default());
            assert!(result.is_err(), "{method} should fail");
        }
    }

    #[test]
    fn test_max_steps_exceeded() {
        let model = decay();
        let options = SolverOptions {
            step: 1e-4,
            max_steps: 10,
            ..Default::default()
        };
        let err = IntegrationMethod::Rk4
            .integrate(&model, &[1.0], &[1.0], &[1.0], &options)
            .unwrap_err();
        assert!(matches!(err, IntegrationFailure::MaxStepsExceeded { .. }));
    }

    #[test]
    fn test_options_validation() {
        assert!(SolverOptions::default().validate().is_ok());
        let bad = SolverOptions {
            step: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = SolverOptions {
            max_step: Some(-1.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = SolverOptions {
            rtol: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
