//! Plain Sinkhorn-Knopp matrix scaling.
//!
//! Iterates `v = b / (Kᵀ u)`, `u = a / (K v)` on the Gibbs kernel
//! `K = exp(-M / reg)`. Fast, but `u` and `v` are raw multiplicative scalings:
//! at small `reg` they overflow or underflow. When that happens the loop
//! stops, falls back to the previous iterate, and warns.

use crate::kernel::{gibbs_kernel, scale_rows_cols};
use crate::params::SinkhornParams;
use crate::report::{Recorder, SolveLog};
use crate::{
    check_marginals, check_regularization, has_nan, has_zero, marginal_or_uniform, squared_error,
    unif, Result,
};
use ndarray::{Array1, Array2, Axis};

/// Error is sampled on iterations divisible by this.
const CHECK_EVERY: usize = 10;

/// Sinkhorn algorithm for entropic regularized optimal transport.
///
/// Solves
///
/// ```text
/// min_γ <γ, M>_F + reg · Σ γ_ij log γ_ij
/// s.t. γ 1 = a, γᵀ 1 = b, γ ≥ 0
/// ```
///
/// # Arguments
///
/// * `a` - Source weights (length ns); empty means uniform
/// * `b` - Target weights (length nt); empty means uniform
/// * `cost` - Cost matrix M (ns × nt)
/// * `reg` - Regularization strength, > 0
///
/// # Returns
///
/// The transport plan, plus a [`SolveLog`] when `params.log` is set. The
/// error trace holds `‖γᵀ1 - b‖²` sampled every 10 iterations.
///
/// # Example
///
/// ```rust
/// use bregman::{sinkhorn, SinkhornParams};
/// use ndarray::array;
///
/// let a = array![0.5, 0.5];
/// let b = array![0.5, 0.5];
/// let cost = array![[0.0, 1.0], [1.0, 0.0]];
///
/// let (plan, log) = sinkhorn(&a, &b, &cost, 1.0, &SinkhornParams::default().with_log(true)).unwrap();
/// assert!((plan[[1, 1]] - 0.3655).abs() < 1e-3);
/// assert!(log.unwrap().niter > 0);
/// ```
pub fn sinkhorn(
    a: &Array1<f64>,
    b: &Array1<f64>,
    cost: &Array2<f64>,
    reg: f64,
    params: &SinkhornParams,
) -> Result<(Array2<f64>, Option<SolveLog>)> {
    let (ns, nt) = cost.dim();
    check_regularization(reg)?;
    let a = marginal_or_uniform(a, ns);
    let b = marginal_or_uniform(b, nt);
    check_marginals(&a, &b, cost)?;

    let k = gibbs_kernel(cost, reg);

    let mut u = unif(ns);
    let mut v = unif(nt);
    let mut u_prev = Array1::zeros(ns);
    let mut v_prev = Array1::zeros(nt);

    let mut recorder = Recorder::new(params.log, params.verbose, 200);
    let mut cpt = 0;
    let mut err = 1.0;

    while err > params.stop_thr && cpt < params.max_iter {
        let ktu = k.t().dot(&u);
        if has_zero(&ktu) || has_nan(&u) || has_nan(&v) {
            // Machine precision reached: keep the last sane iterate.
            log::warn!("sinkhorn: numerical errors at iteration {}", cpt);
            if cpt != 0 {
                std::mem::swap(&mut u, &mut u_prev);
                std::mem::swap(&mut v, &mut v_prev);
            }
            break;
        }
        u_prev.assign(&u);
        v_prev.assign(&v);

        v = &b / &ktu;
        u = &a / &k.dot(&v);

        if cpt % CHECK_EVERY == 0 {
            let plan = scale_rows_cols(&u, &k, &v);
            err = squared_error(&plan.sum_axis(Axis(0)), &b);
            recorder.record(cpt, err);
        }
        cpt += 1;
    }
    log::debug!("sinkhorn: stopped after {} iterations, err={:e}", cpt, err);

    Ok((scale_rows_cols(&u, &k, &v), recorder.finish(cpt, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use ndarray::array;
    use proptest::prelude::*;

    fn line_cost(n: usize) -> Array2<f64> {
        let scale = (n.max(2) - 1) as f64;
        Array2::from_shape_fn((n, n), |(i, j)| (i as f64 - j as f64).abs() / scale)
    }

    #[test]
    fn two_point_closed_form() {
        let a = array![0.5, 0.5];
        let b = array![0.5, 0.5];
        let cost = array![[0.0, 1.0], [1.0, 0.0]];
        let (plan, _) = sinkhorn(&a, &b, &cost, 1.0, &SinkhornParams::default()).unwrap();

        let e = (-1.0f64).exp();
        let diag = 0.5 / (1.0 + e);
        let off = 0.5 * e / (1.0 + e);
        assert!((plan[[0, 0]] - diag).abs() < 1e-6, "plan={:?}", plan);
        assert!((plan[[1, 1]] - diag).abs() < 1e-6);
        assert!((plan[[0, 1]] - off).abs() < 1e-6);
        assert!((plan[[1, 0]] - off).abs() < 1e-6);
        assert!((diag - 0.3655).abs() < 1e-4 && (off - 0.1345).abs() < 1e-4);
    }

    #[test]
    fn empty_marginals_default_to_uniform() {
        let cost = line_cost(3);
        let empty = Array1::zeros(0);
        let (p1, _) = sinkhorn(&empty, &empty, &cost, 0.5, &SinkhornParams::default()).unwrap();
        let (p2, _) = sinkhorn(&unif(3), &unif(3), &cost, 0.5, &SinkhornParams::default()).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn log_samples_every_tenth_iteration() {
        let a = array![0.2, 0.3, 0.5];
        let b = array![0.6, 0.1, 0.3];
        let params = SinkhornParams::default()
            .with_max_iter(35)
            .with_stop_thr(0.0)
            .with_log(true);
        let (_, log) = sinkhorn(&a, &b, &line_cost(3), 0.2, &params).unwrap();
        let log = log.unwrap();
        // Iterations 0, 10, 20, 30.
        assert_eq!(log.err.len(), 4);
        assert_eq!(log.niter, 35);
        assert!(log.warmstart.is_none());
    }

    #[test]
    fn rejects_bad_shapes_and_reg() {
        let cost = line_cost(3);
        let a = array![0.5, 0.5];
        let b = unif(3);
        assert_eq!(
            sinkhorn(&a, &b, &cost, 1.0, &SinkhornParams::default()).unwrap_err(),
            Error::CostShapeMismatch(2, 3, 3, 3)
        );
        assert!(matches!(
            sinkhorn(&b, &b, &cost, 0.0, &SinkhornParams::default()),
            Err(Error::InvalidRegularization(_))
        ));
    }

    #[test]
    fn underflowed_kernel_stops_without_panicking() {
        // K = [[1, 0], [0, 0]]: the second column of Kᵀu is exactly zero.
        let cost = array![[0.0, 1e4], [1e4, 1e4]];
        let a = array![0.5, 0.5];
        let params = SinkhornParams::default().with_log(true);
        let (plan, log) = sinkhorn(&a, &a, &cost, 1.0, &params).unwrap();
        assert!(plan.iter().all(|x| x.is_finite()));
        assert_eq!(log.unwrap().niter, 0);
    }

    #[test]
    fn late_degeneration_rolls_back_to_the_previous_iterate() {
        // Row 0 may only feed column 0, which cannot absorb 0.9: u and v
        // diverge geometrically until an update leaves the floating-point range.
        let a = array![0.9, 0.1];
        let b = array![0.5, 0.5];
        let cost = array![[0.0, 1e4], [0.0, 0.0]];
        let params = SinkhornParams::default().with_stop_thr(0.0).with_log(true);

        let (plan, log) = sinkhorn(&a, &b, &cost, 1.0, &params).unwrap();
        let niter = log.unwrap().niter;
        assert!(niter > 1 && niter < params.max_iter, "niter={}", niter);
        assert!(plan.iter().all(|x| x.is_finite()), "plan={:?}", plan);

        // The returned plan is the last iterate before the breakdown.
        let capped = params.with_max_iter(niter - 1);
        let (expected, log) = sinkhorn(&a, &b, &cost, 1.0, &capped).unwrap();
        assert_eq!(log.unwrap().niter, niter - 1);
        assert_eq!(plan, expected);
    }

    proptest! {
        #[test]
        fn plan_is_nonnegative_and_matches_marginals(
            (a, b) in (2usize..7).prop_flat_map(|n| {
                (
                    prop::collection::vec(0.05f64..1.0, n),
                    prop::collection::vec(0.05f64..1.0, n),
                )
            }),
            reg in 1.0f64..3.0,
        ) {
            let n = a.len();
            let a = Array1::from_vec(a);
            let b = Array1::from_vec(b);
            let a = &a / a.sum();
            let b = &b / b.sum();

            let params = SinkhornParams::default().with_max_iter(5000).with_stop_thr(1e-12);
            let (plan, _) = sinkhorn(&a, &b, &line_cost(n), reg, &params).unwrap();

            prop_assert!(plan.iter().all(|&x| x >= 0.0));
            let rows = plan.sum_axis(Axis(1));
            let cols = plan.sum_axis(Axis(0));
            for i in 0..n {
                prop_assert!((rows[i] - a[i]).abs() < 1e-5, "row {} {} vs {}", i, rows[i], a[i]);
                prop_assert!((cols[i] - b[i]).abs() < 1e-5, "col {} {} vs {}", i, cols[i], b[i]);
            }
        }
    }
}
