//! Epsilon scaling on top of the log-stabilized solver.
//!
//! A small `reg` makes Sinkhorn slow and fragile from a cold start. Epsilon
//! scaling anneals the regularization from `epsilon0` down to the target,
//!
//! ```text
//! reg(n) = (epsilon0 - reg) · exp(-n) + reg
//! ```
//!
//! and runs a short stabilized solve at every step, warm-started from the
//! potentials the previous step ended on. Dropping that warm start would
//! restart each step cold and lose the point of annealing.
//!
//! Reference: Schmitzer (2016), Algorithm 3.2.

use crate::params::{EpsilonScalingParams, StabilizedParams};
use crate::report::{Recorder, SolveLog, Warmstart};
use crate::stabilized;
use crate::{
    check_marginals, check_regularization, marginal_or_uniform, squared_error, Error, Result,
};
use ndarray::{Array1, Array2, Axis};

/// Minimum number of outer steps; `exp(-35)` is below double precision
/// relative to `epsilon0`, so the last steps run at the target `reg`.
pub const NUM_ITER_MIN: usize = 35;

const INNER_STOP_THR: f64 = 1e-9;
const INNER_TAU: f64 = 1e3;
const INNER_PRINT_PERIOD: usize = 20;

/// Regularization used at outer step `n` of the annealing schedule.
pub fn annealed_reg(epsilon0: f64, reg: f64, n: usize) -> f64 {
    (epsilon0 - reg) * (-(n as f64)).exp() + reg
}

/// Entropic OT with log stabilization and epsilon scaling.
///
/// Runs at least [`NUM_ITER_MIN`] + 1 outer steps whatever the error says.
/// The outer error combines both marginals,
/// `‖γᵀ1 - b‖² + ‖γ1 - a‖²`, sampled every `params.print_period` steps.
///
/// # Returns
///
/// The plan of the final inner solve and, when `params.log` is set, a
/// [`SolveLog`] with the outer error trace, the outer step count and the
/// final potentials.
///
/// # Example
///
/// ```rust
/// use bregman::{sinkhorn_epsilon_scaling, EpsilonScalingParams, NUM_ITER_MIN};
/// use ndarray::array;
///
/// let a = array![0.7, 0.3];
/// let b = array![0.4, 0.6];
/// let cost = array![[0.0, 1.0], [1.0, 0.0]];
/// let params = EpsilonScalingParams::default().with_log(true);
///
/// let (plan, log) = sinkhorn_epsilon_scaling(&a, &b, &cost, 0.2, &params).unwrap();
/// assert!(log.unwrap().niter > NUM_ITER_MIN);
/// assert!((plan.sum() - 1.0).abs() < 1e-6);
/// ```
pub fn sinkhorn_epsilon_scaling(
    a: &Array1<f64>,
    b: &Array1<f64>,
    cost: &Array2<f64>,
    reg: f64,
    params: &EpsilonScalingParams,
) -> Result<(Array2<f64>, Option<SolveLog>)> {
    let (na, nb) = cost.dim();
    check_regularization(reg)?;
    check_regularization(params.epsilon0)?;
    let a = marginal_or_uniform(a, na);
    let b = marginal_or_uniform(b, nb);
    check_marginals(&a, &b, cost)?;

    let max_iter = params.max_iter.max(NUM_ITER_MIN);

    let mut potentials = match &params.warmstart {
        Some(ws) => {
            if ws.alpha.len() != na {
                return Err(Error::LengthMismatch(na, ws.alpha.len()));
            }
            if ws.beta.len() != nb {
                return Err(Error::LengthMismatch(nb, ws.beta.len()));
            }
            ws.clone()
        }
        None => Warmstart::zeros(na, nb),
    };

    let print_period = params.print_period.max(1);
    let mut recorder = Recorder::new(params.log, params.verbose, print_period * 10);
    let mut cpt = 0;
    let mut err = 1.0;

    let plan = loop {
        let reg_i = annealed_reg(params.epsilon0, reg, cpt);
        let inner = StabilizedParams {
            max_iter: params.inner_max_iter,
            tau: INNER_TAU,
            stop_thr: INNER_STOP_THR,
            warmstart: Some(potentials),
            verbose: false,
            print_period: INNER_PRINT_PERIOD,
            log: false,
        };
        let step = stabilized::solve(&a, &b, cost, reg_i, &inner)?;
        potentials = step.potentials;

        let capped = cpt >= max_iter;

        if cpt % print_period == 0 {
            err = squared_error(&step.plan.sum_axis(Axis(0)), &b)
                + squared_error(&step.plan.sum_axis(Axis(1)), &a);
            recorder.record(cpt, err);
        }

        let converged = err <= params.stop_thr && cpt > NUM_ITER_MIN;

        cpt += 1;
        if capped || converged {
            break step.plan;
        }
    };
    log::debug!(
        "sinkhorn_epsilon_scaling: stopped after {} outer steps, err={:e}",
        cpt,
        err
    );

    Ok((plan, recorder.finish(cpt, Some(potentials))))
}
