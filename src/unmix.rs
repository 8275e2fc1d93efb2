//! Wasserstein unmixing of an observation over a dictionary.
//!
//! Find mixture weights `h` such that `D h` reconstructs the observation `a`
//! under one entropic OT geometry while `h` stays close to a prior `h0`
//! under another:
//!
//! ```text
//! h = argmin_h (1 - alpha) W_{M,reg}(a, D h) + alpha W_{M0,reg0}(h0, h)
//! ```
//!
//! Two kernels are scaled jointly: `K` (d × d) on the data side and `K0`
//! (n × n) on the prior side. Each step projects their columns onto `a` and
//! `h0`, blends the two row-marginal estimates geometrically, projects the
//! rows of `K` onto the blend and pulls `K0` along through `Dᵀ`.
//!
//! Reference: Nakhostin et al. (2016), Supervised Planetary Unmixing with
//! Optimal Transport.

use crate::kernel::{gibbs_kernel, proj_c, proj_r};
use crate::params::UnmixParams;
use crate::report::{Recorder, SolveLog};
use crate::{all_finite, check_regularization, marginal_or_uniform, Error, Result};
use ndarray::{Array1, Array2, Axis, Zip};

/// Unmix the observation `a` over the columns of `dictionary`.
///
/// # Arguments
///
/// * `a` - Observed histogram (length d); empty means uniform
/// * `dictionary` - Atoms D (d × n), one histogram per column
/// * `cost` - Data-fitting cost M (d × d)
/// * `cost0` - Prior cost M0 (n × n) between atoms
/// * `h0` - Prior mixture (length n); empty means uniform
/// * `reg` - Data-fitting regularization, > 0
/// * `reg0` - Prior regularization, > 0
/// * `alpha` - Trust in the prior, in `[0, 1]`: 0 fits the data only, 1
///   returns the prior only
///
/// # Returns
///
/// The mixture `h` (length n) and, when `params.log` is set, a [`SolveLog`]
/// with the per-iteration change of the prior-side row sums.
///
/// Non-finite iterates (a zero row in `D` against a positive `alpha`, for
/// instance) stop the loop with a warning and the last finite mixture is
/// returned.
#[allow(clippy::too_many_arguments)]
pub fn unmix(
    a: &Array1<f64>,
    dictionary: &Array2<f64>,
    cost: &Array2<f64>,
    cost0: &Array2<f64>,
    h0: &Array1<f64>,
    reg: f64,
    reg0: f64,
    alpha: f64,
    params: &UnmixParams,
) -> Result<(Array1<f64>, Option<SolveLog>)> {
    let (d, n) = dictionary.dim();
    check_regularization(reg)?;
    check_regularization(reg0)?;
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::InvalidTradeoff(alpha));
    }
    if cost.dim() != (d, d) {
        return Err(Error::CostShapeMismatch(d, d, cost.nrows(), cost.ncols()));
    }
    if cost0.dim() != (n, n) {
        return Err(Error::CostShapeMismatch(n, n, cost0.nrows(), cost0.ncols()));
    }
    let a = marginal_or_uniform(a, d);
    if a.len() != d {
        return Err(Error::DictionaryShapeMismatch {
            expected: a.len(),
            rows: d,
        });
    }
    let h0 = marginal_or_uniform(h0, n);
    if h0.len() != n {
        return Err(Error::LengthMismatch(n, h0.len()));
    }

    let mut k = gibbs_kernel(cost, reg);
    let mut k0 = gibbs_kernel(cost0, reg0);
    let mut old = h0.clone();

    let mut recorder = Recorder::new(params.log, params.verbose, 200);
    let mut cpt = 0;
    let mut err = 1.0;

    while err > params.stop_thr && cpt < params.max_iter {
        let k_fit = proj_c(&k, &a);
        let k_prior = proj_c(&k0, &h0);
        let new = k_prior.sum_axis(Axis(1));
        // Current selection recombined from the dictionary.
        let inv_new = dictionary.dot(&new);
        let other = k_fit.sum_axis(Axis(1));

        let delta = Zip::from(&other)
            .and(&inv_new)
            .map_collect(|&o, &r| o.powf(1.0 - alpha) * r.powf(alpha));

        let k_next = proj_r(&k_fit, &delta);
        let correction = dictionary.t().dot(&(&delta / &inv_new));
        let k0_next = &k_prior * &correction.insert_axis(Axis(1));
        let h = k0_next.sum_axis(Axis(1));

        if !all_finite(&h) || !all_finite(&k_next) {
            log::warn!("unmix: numerical errors at iteration {}", cpt);
            break;
        }

        err = (&h - &old).mapv(|x| x * x).sum().sqrt();
        old = new;
        k = k_next;
        k0 = k0_next;

        recorder.record(cpt, err);
        cpt += 1;
    }
    log::debug!("unmix: stopped after {} iterations, err={:e}", cpt, err);

    Ok((k0.sum_axis(Axis(1)), recorder.finish(cpt, None)))
}
