//! Correction of small numerical artifacts in estimated indices.
//!
//! Monte Carlo estimates can land slightly outside [0, 1]. First-order
//! values just below 0 are clamped to 0 and total-order values just above 1
//! are clamped to 1. Larger deviations in those directions are kept as-is
//! and flagged. Deviations in the opposite directions (first-order above 1,
//! total-order below 0) are left untouched without a flag.

use serde::{Deserialize, Serialize};

/// Width of the band that is silently clamped
pub const MINOR_DEVIATION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    FirstOrder,
    TotalOrder,
}

impl IndexKind {
    pub fn label(&self) -> &'static str {
        match self {
            IndexKind::FirstOrder => "first-order",
            IndexKind::TotalOrder => "total-order",
        }
    }
}

/// Result of correcting a single index value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub value: f64,
    /// The value deviates by more than [`MINOR_DEVIATION`]
    pub flagged: bool,
}

/// Apply the clamping rules to one raw index.
///
/// Idempotent: correcting an already-corrected value changes nothing.
pub fn correct(raw: f64, kind: IndexKind) -> Correction {
    match kind {
        IndexKind::FirstOrder if raw < -MINOR_DEVIATION => Correction {
            value: raw,
            flagged: true,
        },
        IndexKind::FirstOrder if raw < 0.0 => Correction {
            value: 0.0,
            flagged: false,
        },
        IndexKind::TotalOrder if raw > 1.0 + MINOR_DEVIATION => Correction {
            value: raw,
            flagged: true,
        },
        IndexKind::TotalOrder if raw > 1.0 => Correction {
            value: 1.0,
            flagged: false,
        },
        _ => Correction {
            value: raw,
            flagged: false,
        },
    }
}

/// Deviation that survived correction, reported alongside the result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationWarning {
    pub state: String,
    pub time: f64,
    pub parameter: String,
    pub kind: IndexKind,
    pub value: f64,
}

impl std::fmt::Display for DeviationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = match self.kind {
            IndexKind::FirstOrder => "below 0",
            IndexKind::TotalOrder => "above 1",
        };
        write!(
            f,
            "{} index of parameter {:?} for state {:?} at t={} is {} ({}); \
             consider increasing the sample size",
            self.kind.label(),
            self.parameter,
            self.state,
            self.time,
            self.value,
            bound
        )
    }
}
