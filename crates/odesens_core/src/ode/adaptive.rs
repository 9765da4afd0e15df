//! Embedded Runge-Kutta pairs with local error control.

use super::{OdeModel, SolverOptions, check_finite};
use crate::error::IntegrationFailure;

/// Butcher tableau of an explicit embedded pair.
///
/// `b` propagates the solution; `e = b - b_hat` gives the local error
/// estimate. `order` is the order of the lower-order member.
pub(super) struct Tableau {
    c: &'static [f64],
    a: &'static [&'static [f64]],
    b: &'static [f64],
    e: &'static [f64],
    order: i32,
}

pub(super) const BOGACKI_SHAMPINE: Tableau = Tableau {
    c: &[0.0, 0.5, 0.75, 1.0],
    a: &[&[], &[0.5], &[0.0, 0.75], &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0]],
    b: &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
    e: &[
        2.0 / 9.0 - 7.0 / 24.0,
        1.0 / 3.0 - 1.0 / 4.0,
        4.0 / 9.0 - 1.0 / 3.0,
        -1.0 / 8.0,
    ],
    order: 2,
};

pub(super) const DORMAND_PRINCE: Tableau = Tableau {
    c: &[0.0, 0.2, 0.3, 0.8, 8.0 / 9.0, 1.0, 1.0],
    a: &[
        &[],
        &[0.2],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
        &[
            19372.0 / 6561.0,
            -25360.0 / 2187.0,
            64448.0 / 6561.0,
            -212.0 / 729.0,
        ],
        &[
            9017.0 / 3168.0,
            -355.0 / 33.0,
            46732.0 / 5247.0,
            49.0 / 176.0,
            -5103.0 / 18656.0,
        ],
        &[
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
        ],
    ],
    b: &[
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ],
    e: &[
        35.0 / 384.0 - 5179.0 / 57600.0,
        0.0,
        500.0 / 1113.0 - 7571.0 / 16695.0,
        125.0 / 192.0 - 393.0 / 640.0,
        -2187.0 / 6784.0 + 92097.0 / 339200.0,
        11.0 / 84.0 - 187.0 / 2100.0,
        -1.0 / 40.0,
    ],
    order: 4,
};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

struct Stepper<'a, M: ?Sized> {
    model: &'a M,
    params: &'a [f64],
    tableau: &'a Tableau,
    k: Vec<Vec<f64>>,
    tmp: Vec<f64>,
    y_new: Vec<f64>,
}

impl<'a, M: OdeModel + ?Sized> Stepper<'a, M> {
    fn new(model: &'a M, params: &'a [f64], tableau: &'a Tableau, dim: usize) -> Self {
        Self {
            model,
            params,
            tableau,
            k: vec![vec![0.0; dim]; tableau.c.len()],
            tmp: vec![0.0; dim],
            y_new: vec![0.0; dim],
        }
    }

    /// Attempt one step from (t, y). Leaves the candidate in `y_new` and
    /// returns the scaled RMS error norm.
    fn attempt(&mut self, t: f64, h: f64, y: &[f64], options: &SolverOptions) -> f64 {
        let tab = self.tableau;
        let dim = y.len();

        for s in 0..tab.c.len() {
            for i in 0..dim {
                let mut acc = 0.0;
                for (j, a) in tab.a[s].iter().enumerate() {
                    acc += a * self.k[j][i];
                }
                self.tmp[i] = y[i] + h * acc;
            }
            let (_, rest) = self.k.split_at_mut(s);
            self.model
                .rhs(t + tab.c[s] * h, &self.tmp, self.params, &mut rest[0]);
        }

        let mut sum = 0.0;
        for i in 0..dim {
            let mut inc = 0.0;
            let mut err = 0.0;
            for s in 0..tab.c.len() {
                inc += tab.b[s] * self.k[s][i];
                err += tab.e[s] * self.k[s][i];
            }
            self.y_new[i] = y[i] + h * inc;
            let scale = options.atol + options.rtol * y[i].abs().max(self.y_new[i].abs());
            let ratio = h * err / scale;
            sum += ratio * ratio;
        }

        if dim == 0 {
            0.0
        } else {
            (sum / dim as f64).sqrt()
        }
    }
}

pub(super) fn integrate<M: OdeModel + ?Sized>(
    model: &M,
    params: &[f64],
    y0: &[f64],
    times: &[f64],
    options: &SolverOptions,
    tableau: &Tableau,
) -> Result<Vec<f64>, IntegrationFailure> {
    let dim = y0.len();
    let mut stepper = Stepper::new(model, params, tableau, dim);
    let mut y = y0.to_vec();
    let mut out = Vec::with_capacity(times.len() * dim);
    let mut t = 0.0;
    let h_cap = options.max_step.unwrap_or(f64::INFINITY);
    let exponent = -1.0 / f64::from(tableau.order + 1);

    let mut h = times
        .first()
        .map_or(h_cap, |&t1| (0.01 * t1).min(h_cap));

    for &t_out in times {
        let mut steps = 0;
        while t < t_out {
            if steps >= options.max_steps {
                return Err(IntegrationFailure::MaxStepsExceeded {
                    time: t,
                    max_steps: options.max_steps,
                });
            }
            steps += 1;

            let tiny = 16.0 * f64::EPSILON * t.abs().max(1.0);
            let remaining = t_out - t;
            if remaining <= tiny {
                // Output time is indistinguishable from t
                t = t_out;
                break;
            }
            if h.min(h_cap) <= tiny {
                return Err(IntegrationFailure::StepSizeUnderflow {
                    time: t,
                    step: h.min(h_cap),
                });
            }
            let h_try = h.min(h_cap).min(remaining);

            let err = stepper.attempt(t, h_try, &y, options);
            if err.is_finite() && err <= 1.0 {
                // Land exactly on the output time to avoid drift
                t = if h_try == remaining || t_out - (t + h_try) <= tiny {
                    t_out
                } else {
                    t + h_try
                };
                y.copy_from_slice(&stepper.y_new);
                check_finite(&y, t)?;
                let factor = if err == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err.powf(exponent)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                // Shortened final steps should not shrink the next step
                h = if h_try < h { h } else { h_try * factor };
            } else {
                let factor = if err.is_finite() {
                    (SAFETY * err.powf(exponent)).clamp(MIN_FACTOR, 1.0)
                } else {
                    MIN_FACTOR
                };
                h = h_try * factor;
            }
        }
        out.extend_from_slice(&y);
    }

    Ok(out)
}
