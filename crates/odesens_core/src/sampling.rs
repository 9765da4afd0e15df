//! Parameter sampling: a fixed registry of named distributions and the
//! draw of the two independent base design matrices.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::matrices::SampleMatrix;

/// Distributions that parameters can be sampled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionKind {
    Uniform,
    Normal,
    LogNormal,
    Exponential,
    Gamma,
    Beta,
    Triangular,
}

impl DistributionKind {
    pub const ALL: [DistributionKind; 7] = [
        DistributionKind::Uniform,
        DistributionKind::Normal,
        DistributionKind::LogNormal,
        DistributionKind::Exponential,
        DistributionKind::Gamma,
        DistributionKind::Beta,
        DistributionKind::Triangular,
    ];

    /// Resolve an identifier. Both the short (`unif`, `norm`, ...) and the
    /// long (`uniform`, `normal`, ...) spellings are accepted.
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "unif" | "uniform" => Ok(DistributionKind::Uniform),
            "norm" | "normal" => Ok(DistributionKind::Normal),
            "lnorm" | "lognormal" => Ok(DistributionKind::LogNormal),
            "exp" | "exponential" => Ok(DistributionKind::Exponential),
            "gamma" => Ok(DistributionKind::Gamma),
            "beta" => Ok(DistributionKind::Beta),
            "triangle" | "triangular" => Ok(DistributionKind::Triangular),
            _ => Err(ConfigurationError::UnknownDistribution(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DistributionKind::Uniform => "uniform",
            DistributionKind::Normal => "normal",
            DistributionKind::LogNormal => "lognormal",
            DistributionKind::Exponential => "exponential",
            DistributionKind::Gamma => "gamma",
            DistributionKind::Beta => "beta",
            DistributionKind::Triangular => "triangular",
        }
    }

    /// Accepted argument names with their defaults (`None` = required)
    pub fn arguments(&self) -> &'static [(&'static str, Option<f64>)] {
        match self {
            DistributionKind::Uniform => &[("min", Some(0.0)), ("max", Some(1.0))],
            DistributionKind::Normal => &[("mean", Some(0.0)), ("sd", Some(1.0))],
            DistributionKind::LogNormal => &[("meanlog", Some(0.0)), ("sdlog", Some(1.0))],
            DistributionKind::Exponential => &[("rate", Some(1.0))],
            DistributionKind::Gamma => &[("shape", None), ("rate", Some(1.0))],
            DistributionKind::Beta => &[("shape1", None), ("shape2", None)],
            DistributionKind::Triangular => &[("min", None), ("max", None), ("mode", None)],
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistributionKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Validated sampler backed by a `rand_distr` distribution
#[derive(Debug, Clone)]
enum Sampler {
    Uniform(Uniform<f64>),
    Normal(rand_distr::Normal<f64>),
    LogNormal(rand_distr::LogNormal<f64>),
    Exponential(rand_distr::Exp<f64>),
    Gamma(rand_distr::Gamma<f64>),
    Beta(rand_distr::Beta<f64>),
    Triangular(rand_distr::Triangular<f64>),
}

impl Sampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Normal(d) => d.sample(rng),
            Sampler::LogNormal(d) => d.sample(rng),
            Sampler::Exponential(d) => d.sample(rng),
            Sampler::Gamma(d) => d.sample(rng),
            Sampler::Beta(d) => d.sample(rng),
            Sampler::Triangular(d) => d.sample(rng),
        }
    }
}

/// A distribution together with its resolved arguments.
///
/// Construction validates the argument names against the distribution and
/// the values against the underlying sampler, so a `ParameterDistribution`
/// can always be sampled.
#[derive(Debug, Clone)]
pub struct ParameterDistribution {
    kind: DistributionKind,
    args: BTreeMap<String, f64>,
    sampler: Sampler,
}

impl ParameterDistribution {
    pub fn new<I, K>(name: &str, args: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::from_kind(DistributionKind::from_name(name)?, args)
    }

    pub fn from_kind<I, K>(kind: DistributionKind, args: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let accepted = kind.arguments();
        let mut given = BTreeMap::new();
        for (key, value) in args {
            let key = key.into();
            if !accepted.iter().any(|(name, _)| *name == key) {
                return Err(ConfigurationError::UnknownDistributionArgument {
                    distribution: kind.name(),
                    argument: key,
                });
            }
            given.insert(key, value);
        }

        let mut resolved = BTreeMap::new();
        for &(name, default) in accepted {
            let value = match (given.get(name), default) {
                (Some(v), _) => *v,
                (None, Some(d)) => d,
                (None, None) => {
                    return Err(ConfigurationError::MissingDistributionArgument {
                        distribution: kind.name(),
                        argument: name,
                    });
                }
            };
            resolved.insert(name.to_string(), value);
        }

        let sampler = build_sampler(kind, &resolved)?;
        Ok(Self {
            kind,
            args: resolved,
            sampler,
        })
    }

    /// Uniform on `[min, max)`
    pub fn uniform(min: f64, max: f64) -> Result<Self, ConfigurationError> {
        Self::from_kind(DistributionKind::Uniform, [("min", min), ("max", max)])
    }

    pub fn normal(mean: f64, sd: f64) -> Result<Self, ConfigurationError> {
        Self::from_kind(DistributionKind::Normal, [("mean", mean), ("sd", sd)])
    }

    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    /// All arguments, including defaults that were filled in
    pub fn args(&self) -> &BTreeMap<String, f64> {
        &self.args
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sampler.sample(rng)
    }

    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.sampler.sample(rng)).collect()
    }
}

fn build_sampler(
    kind: DistributionKind,
    args: &BTreeMap<String, f64>,
) -> Result<Sampler, ConfigurationError> {
    let arg = |name: &str| args.get(name).copied().unwrap_or(f64::NAN);
    let invalid = |reason: String| ConfigurationError::InvalidDistributionParameters {
        distribution: kind.name(),
        reason,
    };

    match kind {
        DistributionKind::Uniform => {
            let (min, max) = (arg("min"), arg("max"));
            if !(min.is_finite() && max.is_finite()) {
                return Err(invalid(format!("bounds must be finite (min={min}, max={max})")));
            }
            Uniform::new(min, max)
                .map(Sampler::Uniform)
                .map_err(|e| invalid(format!("min={min}, max={max}: {e}")))
        }
        DistributionKind::Normal => {
            let (mean, sd) = (arg("mean"), arg("sd"));
            if !(sd >= 0.0 && sd.is_finite()) {
                return Err(invalid(format!("sd must be non-negative and finite (got {sd})")));
            }
            rand_distr::Normal::new(mean, sd)
                .map(Sampler::Normal)
                .map_err(|e| invalid(format!("mean={mean}, sd={sd}: {e}")))
        }
        DistributionKind::LogNormal => {
            let (meanlog, sdlog) = (arg("meanlog"), arg("sdlog"));
            if !(sdlog >= 0.0 && sdlog.is_finite()) {
                return Err(invalid(format!(
                    "sdlog must be non-negative and finite (got {sdlog})"
                )));
            }
            rand_distr::LogNormal::new(meanlog, sdlog)
                .map(Sampler::LogNormal)
                .map_err(|e| invalid(format!("meanlog={meanlog}, sdlog={sdlog}: {e}")))
        }
        DistributionKind::Exponential => {
            let rate = arg("rate");
            rand_distr::Exp::new(rate)
                .map(Sampler::Exponential)
                .map_err(|e| invalid(format!("rate={rate}: {e}")))
        }
        DistributionKind::Gamma => {
            let (shape, rate) = (arg("shape"), arg("rate"));
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(invalid(format!("rate must be positive (got {rate})")));
            }
            rand_distr::Gamma::new(shape, 1.0 / rate)
                .map(Sampler::Gamma)
                .map_err(|e| invalid(format!("shape={shape}, rate={rate}: {e}")))
        }
        DistributionKind::Beta => {
            let (a, b) = (arg("shape1"), arg("shape2"));
            rand_distr::Beta::new(a, b)
                .map(Sampler::Beta)
                .map_err(|e| invalid(format!("shape1={a}, shape2={b}: {e}")))
        }
        DistributionKind::Triangular => {
            let (min, max, mode) = (arg("min"), arg("max"), arg("mode"));
            rand_distr::Triangular::new(min, max, mode)
                .map(Sampler::Triangular)
                .map_err(|e| invalid(format!("min={min}, max={max}, mode={mode}: {e}")))
        }
    }
}

/// Expand a distribution list of length 1 or `k` to one entry per parameter.
pub fn broadcast_distributions(
    distributions: &[ParameterDistribution],
    k: usize,
) -> Result<Vec<&ParameterDistribution>, ConfigurationError> {
    match distributions.len() {
        1 => Ok(vec![&distributions[0]; k]),
        len if len == k => Ok(distributions.iter().collect()),
        len => Err(ConfigurationError::DistributionCountMismatch {
            parameters: k,
            distributions: len,
        }),
    }
}

/// Draw the base matrices A and B.
///
/// A is filled completely before B, column by column, so the two matrices
/// never share draws.
pub fn sample_base_matrices<R: Rng + ?Sized>(
    parameters: &[String],
    distributions: &[&ParameterDistribution],
    n: usize,
    rng: &mut R,
) -> (SampleMatrix, SampleMatrix) {
    let a = sample_matrix(parameters, distributions, n, rng);
    let b = sample_matrix(parameters, distributions, n, rng);
    (a, b)
}

fn sample_matrix<R: Rng + ?Sized>(
    parameters: &[String],
    distributions: &[&ParameterDistribution],
    n: usize,
    rng: &mut R,
) -> SampleMatrix {
    let columns: Vec<Vec<f64>> = distributions.iter().map(|d| d.sample_n(rng, n)).collect();
    SampleMatrix::from_columns(parameters.to_vec(), &columns)
}
