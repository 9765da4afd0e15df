//! Fixed-step explicit integrators.
//!
//! Each output interval is split into the smallest number of equal steps
//! not exceeding `SolverOptions::step`, so output times are hit exactly.

use super::{OdeModel, SolverOptions, check_finite};
use crate::error::IntegrationFailure;

/// Scratch buffers reused across steps
pub(super) struct Workspace {
    k: [Vec<f64>; 4],
    tmp: Vec<f64>,
}

impl Workspace {
    fn new(dim: usize) -> Self {
        Self {
            k: std::array::from_fn(|_| vec![0.0; dim]),
            tmp: vec![0.0; dim],
        }
    }
}

pub(super) fn euler_step<M: OdeModel + ?Sized>(
    model: &M,
    t: f64,
    h: f64,
    y: &mut [f64],
    params: &[f64],
    ws: &mut Workspace,
) {
    let k = &mut ws.k[0];
    model.rhs(t, y, params, k);
    for (yi, ki) in y.iter_mut().zip(k.iter()) {
        *yi += h * ki;
    }
}

pub(super) fn rk4_step<M: OdeModel + ?Sized>(
    model: &M,
    t: f64,
    h: f64,
    y: &mut [f64],
    params: &[f64],
    ws: &mut Workspace,
) {
    let [k1, k2, k3, k4] = &mut ws.k;
    let tmp = &mut ws.tmp;

    model.rhs(t, y, params, k1);

    for i in 0..y.len() {
        tmp[i] = y[i] + 0.5 * h * k1[i];
    }
    model.rhs(t + 0.5 * h, tmp, params, k2);

    for i in 0..y.len() {
        tmp[i] = y[i] + 0.5 * h * k2[i];
    }
    model.rhs(t + 0.5 * h, tmp, params, k3);

    for i in 0..y.len() {
        tmp[i] = y[i] + h * k3[i];
    }
    model.rhs(t + h, tmp, params, k4);

    for i in 0..y.len() {
        y[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
}

pub(super) fn integrate<M: OdeModel + ?Sized>(
    model: &M,
    params: &[f64],
    y0: &[f64],
    times: &[f64],
    options: &SolverOptions,
    step: fn(&M, f64, f64, &mut [f64], &[f64], &mut Workspace),
) -> Result<Vec<f64>, IntegrationFailure> {
    let dim = y0.len();
    let mut ws = Workspace::new(dim);
    let mut y = y0.to_vec();
    let mut out = Vec::with_capacity(times.len() * dim);
    let mut t = 0.0;

    for &t_out in times {
        let span = t_out - t;
        let steps = (span / options.step).ceil().max(1.0);
        if steps > options.max_steps as f64 {
            return Err(IntegrationFailure::MaxStepsExceeded {
                time: t_out,
                max_steps: options.max_steps,
            });
        }
        let steps = steps as usize;
        let h = span / steps as f64;

        for i in 0..steps {
            step(model, t + i as f64 * h, h, &mut y, params, &mut ws);
            check_finite(&y, t + (i + 1) as f64 * h)?;
        }

        t = t_out;
        out.extend_from_slice(&y);
    }

    Ok(out)
}
