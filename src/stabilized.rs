//! Log-stabilized Sinkhorn.
//!
//! Same fixed point as [`sinkhorn`](crate::sinkhorn()), but the bulk of the
//! scaling lives in additive log-potentials `alpha`, `beta`:
//!
//! ```text
//! K_ij = exp(-(M_ij - alpha_i - beta_j) / reg)
//! γ_ij = u_i K_ij v_j
//! ```
//!
//! Whenever `u` or `v` grows past `tau`, it is absorbed into the potentials
//! (`alpha += reg ln u`, `beta += reg ln v`), `u` and `v` restart from uniform
//! and `K` is rebuilt. The multiplicative part therefore stays bounded.
//! Bins without mass have a zero scaling; their potential is rebuilt from the
//! other side instead, so potentials stay finite.
//!
//! Reference: Schmitzer (2016), Algorithm 3.1; Chizat et al. (2016).

use crate::params::StabilizedParams;
use crate::report::{Recorder, SolveLog, Warmstart};
use crate::{
    check_marginals, check_regularization, has_nan, has_zero, marginal_or_uniform, squared_error,
    unif, Error, Result,
};
use ndarray::{Array1, Array2, Axis, Zip};

/// Outcome of a stabilized solve with the potentials always available.
pub(crate) struct Stabilized {
    pub(crate) plan: Array2<f64>,
    pub(crate) potentials: Warmstart,
    pub(crate) log: Option<SolveLog>,
}

/// Sinkhorn with log-domain stabilization.
///
/// # Arguments
///
/// * `a` - Source weights (length na); empty means uniform
/// * `b` - Target weights (length nb); empty means uniform
/// * `cost` - Cost matrix M (na × nb)
/// * `reg` - Regularization strength, > 0
/// * `params` - see [`StabilizedParams`]; `params.warmstart` seeds `alpha`, `beta`
///
/// # Returns
///
/// The transport plan and, when `params.log` is set, a [`SolveLog`] whose
/// `warmstart` holds `(alpha + reg ln u, beta + reg ln v)`. Feeding those back
/// through `params.warmstart` restarts from this solution.
///
/// # Example
///
/// ```rust
/// use bregman::{sinkhorn_stabilized, StabilizedParams};
/// use ndarray::array;
///
/// let a = array![0.5, 0.5];
/// let cost = array![[0.0, 1.0], [1.0, 0.0]];
/// let params = StabilizedParams::default().with_log(true);
///
/// let (cold, log) = sinkhorn_stabilized(&a, &a, &cost, 1.0, &params).unwrap();
/// let warm = params.clone().with_warmstart(log.unwrap().warmstart.unwrap());
/// let (again, _) = sinkhorn_stabilized(&a, &a, &cost, 1.0, &warm).unwrap();
/// assert!((cold[[0, 1]] - again[[0, 1]]).abs() < 1e-8);
/// ```
pub fn sinkhorn_stabilized(
    a: &Array1<f64>,
    b: &Array1<f64>,
    cost: &Array2<f64>,
    reg: f64,
    params: &StabilizedParams,
) -> Result<(Array2<f64>, Option<SolveLog>)> {
    let Stabilized { plan, log, .. } = solve(a, b, cost, reg, params)?;
    Ok((plan, log))
}

pub(crate) fn solve(
    a: &Array1<f64>,
    b: &Array1<f64>,
    cost: &Array2<f64>,
    reg: f64,
    params: &StabilizedParams,
) -> Result<Stabilized> {
    let (na, nb) = cost.dim();
    check_regularization(reg)?;
    let a = marginal_or_uniform(a, na);
    let b = marginal_or_uniform(b, nb);
    check_marginals(&a, &b, cost)?;

    let Warmstart {
        mut alpha,
        mut beta,
    } = match &params.warmstart {
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

    let mut u = unif(na);
    let mut v = unif(nb);
    let mut u_prev = Array1::zeros(na);
    let mut v_prev = Array1::zeros(nb);

    let mut k = stabilized_kernel(cost, &alpha, &beta, reg);

    let print_period = params.print_period.max(1);
    let mut recorder = Recorder::new(params.log, params.verbose, print_period * 20);
    let mut cpt = 0;
    let mut err = 1.0;

    loop {
        if max_abs(&u) > params.tau || max_abs(&v) > params.tau {
            (alpha, beta) = absorb(cost, &alpha, &beta, &u, &v, reg);
            u = unif(na);
            v = unif(nb);
            k = stabilized_kernel(cost, &alpha, &beta, reg);
        }

        u_prev.assign(&u);
        v_prev.assign(&v);
        v = &b / &k.t().dot(&u);
        u = &a / &k.dot(&v);

        if cpt % print_period == 0 {
            let plan = stabilized_plan(cost, &alpha, &beta, &u, &v, reg);
            err = squared_error(&plan.sum_axis(Axis(0)), &b);
            recorder.record(cpt, err);
        }

        let done = err <= params.stop_thr || cpt >= params.max_iter;

        if has_zero(&k.t().dot(&u)) || has_nan(&u) || has_nan(&v) {
            // The previous scalings are finite, even on the first sweep.
            log::warn!("sinkhorn_stabilized: numerical errors at iteration {}", cpt);
            std::mem::swap(&mut u, &mut u_prev);
            std::mem::swap(&mut v, &mut v_prev);
            break;
        }

        cpt += 1;
        if done {
            break;
        }
    }
    log::debug!(
        "sinkhorn_stabilized: stopped after {} iterations, err={:e}",
        cpt,
        err
    );

    let plan = stabilized_plan(cost, &alpha, &beta, &u, &v, reg);
    let (alpha, beta) = absorb(cost, &alpha, &beta, &u, &v, reg);
    let potentials = Warmstart { alpha, beta };
    let log = recorder.finish(cpt, Some(potentials.clone()));
    Ok(Stabilized {
        plan,
        potentials,
        log,
    })
}

/// Fold the scalings into the potentials: `alpha + reg ln u`, `beta + reg ln v`.
///
/// A zero scaling marks a bin without mass, where `ln` would give `-inf`.
/// Such a bin instead takes the soft c-transform against the bins that do
/// carry mass, so its row (or column) of the rebuilt kernel peaks at 1.
fn absorb(
    cost: &Array2<f64>,
    alpha: &Array1<f64>,
    beta: &Array1<f64>,
    u: &Array1<f64>,
    v: &Array1<f64>,
    reg: f64,
) -> (Array1<f64>, Array1<f64>) {
    let fold = |potential: &Array1<f64>, scaling: &Array1<f64>| {
        Zip::from(potential).and(scaling).map_collect(|&p, &s| {
            if s > 0.0 {
                p + reg * s.ln()
            } else {
                p
            }
        })
    };
    let folded_alpha = fold(alpha, u);
    let folded_beta = fold(beta, v);

    let mut alpha = folded_alpha.clone();
    if v.iter().any(|&x| x > 0.0) {
        for i in (0..u.len()).filter(|&i| u[i] <= 0.0) {
            alpha[i] = -reg
                * logsumexp_by(v.len(), |j| {
                    if v[j] > 0.0 {
                        (folded_beta[j] - cost[[i, j]]) / reg
                    } else {
                        f64::NEG_INFINITY
                    }
                });
        }
    }
    let mut beta = folded_beta;
    if u.iter().any(|&x| x > 0.0) {
        for j in (0..v.len()).filter(|&j| v[j] <= 0.0) {
            beta[j] = -reg
                * logsumexp_by(u.len(), |i| {
                    if u[i] > 0.0 {
                        (folded_alpha[i] - cost[[i, j]]) / reg
                    } else {
                        f64::NEG_INFINITY
                    }
                });
        }
    }
    (alpha, beta)
}

/// `ln Σ_i exp(f(i))` by the max-shift trick; `-inf` when `len == 0`.
fn logsumexp_by(len: usize, f: impl Fn(usize) -> f64) -> f64 {
    let max_val = (0..len).map(&f).fold(f64::NEG_INFINITY, f64::max);
    if !max_val.is_finite() {
        return max_val;
    }
    let sum_exp: f64 = (0..len).map(|i| (f(i) - max_val).exp()).sum();
    max_val + sum_exp.ln()
}

/// `exp(-(M_ij - alpha_i - beta_j) / reg)`.
fn stabilized_kernel(
    cost: &Array2<f64>,
    alpha: &Array1<f64>,
    beta: &Array1<f64>,
    reg: f64,
) -> Array2<f64> {
    Array2::from_shape_fn(cost.dim(), |(i, j)| {
        (-(cost[[i, j]] - alpha[i] - beta[j]) / reg).exp()
    })
}

/// Plan rebuilt in the log domain: `exp(-(M - alpha ⊕ beta) / reg + ln u ⊕ ln v)`.
fn stabilized_plan(
    cost: &Array2<f64>,
    alpha: &Array1<f64>,
    beta: &Array1<f64>,
    u: &Array1<f64>,
    v: &Array1<f64>,
    reg: f64,
) -> Array2<f64> {
    let log_u = u.mapv(f64::ln);
    let log_v = v.mapv(f64::ln);
    Array2::from_shape_fn(cost.dim(), |(i, j)| {
        (-(cost[[i, j]] - alpha[i] - beta[j]) / reg + log_u[i] + log_v[j]).exp()
    })
}

fn max_abs(x: &Array1<f64>) -> f64 {
    x.iter().fold(0.0, |m, v| m.max(v.abs()))
}
