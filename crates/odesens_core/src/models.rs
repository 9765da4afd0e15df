//! Built-in example ODE models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{SobolConfig, StateVariable};
use crate::error::ConfigurationError;
use crate::ode::OdeModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinModel {
    /// dx/dt = -k·x
    Decay,
    /// dx/dt = r·x·(1 - x/K)
    Logistic,
    /// Prey/predator system
    LotkaVolterra,
    /// Excitable membrane with voltage V and recovery R
    FitzhughNagumo,
    /// Damped spring: x'' + c·x' + k·x = 0
    LinearOscillator,
}

impl BuiltinModel {
    pub const ALL: [BuiltinModel; 5] = [
        BuiltinModel::Decay,
        BuiltinModel::Logistic,
        BuiltinModel::LotkaVolterra,
        BuiltinModel::FitzhughNagumo,
        BuiltinModel::LinearOscillator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinModel::Decay => "decay",
            BuiltinModel::Logistic => "logistic",
            BuiltinModel::LotkaVolterra => "lotka_volterra",
            BuiltinModel::FitzhughNagumo => "fitzhugh_nagumo",
            BuiltinModel::LinearOscillator => "linear_oscillator",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuiltinModel::Decay => "exponential decay, dx/dt = -k*x",
            BuiltinModel::Logistic => "logistic growth, dx/dt = r*x*(1 - x/K)",
            BuiltinModel::LotkaVolterra => {
                "predator-prey, prey' = alpha*prey - beta*prey*predator, \
                 predator' = delta*prey*predator - gamma*predator"
            }
            BuiltinModel::FitzhughNagumo => {
                "FitzHugh-Nagumo, V' = s*(V - V^3/3 + R), R' = -(V - a + b*R)/s"
            }
            BuiltinModel::LinearOscillator => "damped oscillator, x' = v, v' = -c*v - k*x",
        }
    }

    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            BuiltinModel::Decay => &["k"],
            BuiltinModel::Logistic => &["r", "K"],
            BuiltinModel::LotkaVolterra => &["alpha", "beta", "delta", "gamma"],
            BuiltinModel::FitzhughNagumo => &["a", "b", "s"],
            BuiltinModel::LinearOscillator => &["c", "k"],
        }
    }

    pub fn state_names(&self) -> &'static [&'static str] {
        match self {
            BuiltinModel::Decay | BuiltinModel::Logistic => &["x"],
            BuiltinModel::LotkaVolterra => &["prey", "predator"],
            BuiltinModel::FitzhughNagumo => &["V", "R"],
            BuiltinModel::LinearOscillator => &["x", "v"],
        }
    }

    pub fn default_initial_values(&self) -> &'static [f64] {
        match self {
            BuiltinModel::Decay => &[1.0],
            BuiltinModel::Logistic => &[0.1],
            BuiltinModel::LotkaVolterra => &[10.0, 5.0],
            BuiltinModel::FitzhughNagumo => &[-1.0, 1.0],
            BuiltinModel::LinearOscillator => &[1.0, 0.0],
        }
    }

    pub fn default_initial_state(&self) -> Vec<StateVariable> {
        self.state_names()
            .iter()
            .zip(self.default_initial_values())
            .map(|(name, &value)| StateVariable::new(*name, value))
            .collect()
    }

    /// Request skeleton using the model's own names and initial state
    pub fn config(&self, times: Vec<f64>) -> SobolConfig {
        SobolConfig::new(
            self.parameter_names().iter().map(|s| s.to_string()).collect(),
            self.default_initial_state(),
            times,
        )
    }
}

impl fmt::Display for BuiltinModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuiltinModel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| ConfigurationError::UnknownModel(s.to_string()))
    }
}

impl OdeModel for BuiltinModel {
    fn state_dim(&self) -> usize {
        self.state_names().len()
    }

    fn param_dim(&self) -> usize {
        self.parameter_names().len()
    }

    fn rhs(&self, _t: f64, y: &[f64], p: &[f64], dydt: &mut [f64]) {
        match self {
            BuiltinModel::Decay => {
                dydt[0] = -p[0] * y[0];
            }
            BuiltinModel::Logistic => {
                let (r, capacity) = (p[0], p[1]);
                dydt[0] = r * y[0] * (1.0 - y[0] / capacity);
            }
            BuiltinModel::LotkaVolterra => {
                let (alpha, beta, delta, gamma) = (p[0], p[1], p[2], p[3]);
                let (prey, predator) = (y[0], y[1]);
                dydt[0] = alpha * prey - beta * prey * predator;
                dydt[1] = delta * prey * predator - gamma * predator;
            }
            BuiltinModel::FitzhughNagumo => {
                let (a, b, s) = (p[0], p[1], p[2]);
                let (v, r) = (y[0], y[1]);
                dydt[0] = s * (v - v.powi(3) / 3.0 + r);
                dydt[1] = -(v - a + b * r) / s;
            }
            BuiltinModel::LinearOscillator => {
                let (c, k) = (p[0], p[1]);
                dydt[0] = y[1];
                dydt[1] = -c * y[1] - k * y[0];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for model in BuiltinModel::ALL {
            assert_eq!(model.name().parse::<BuiltinModel>().unwrap(), model);
            assert_eq!(model.state_dim(), model.default_initial_values().len());
        }
        assert_eq!(
            "Lotka-Volterra".parse::<BuiltinModel>().unwrap(),
            BuiltinModel::LotkaVolterra
        );
        assert_eq!(
            "brusselator".parse::<BuiltinModel>().unwrap_err(),
            ConfigurationError::UnknownModel("brusselator".to_string())
        );
    }

    #[test]
    fn test_rhs_values() {
        let mut dy = [0.0; 2];
        BuiltinModel::LotkaVolterra.rhs(0.0, &[10.0, 5.0], &[1.0, 0.1, 0.05, 0.5], &mut dy);
        assert!((dy[0] - 5.0).abs() < 1e-12);
        assert!((dy[1] - 0.0).abs() < 1e-12);

        BuiltinModel::LinearOscillator.rhs(0.0, &[1.0, 2.0], &[0.5, 4.0], &mut dy);
        assert_eq!(dy, [2.0, -5.0]);

        let mut dx = [0.0];
        BuiltinModel::Logistic.rhs(0.0, &[0.5], &[2.0, 1.0], &mut dx);
        assert!((dx[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_config_skeleton_validates() {
        let model = BuiltinModel::FitzhughNagumo;
        let config = model.config(vec![1.0, 2.0]);
        assert!(config.validate(&model).is_ok());
    }
}
