//! Entropic Wasserstein barycenters by iterative Bregman projections.
//!
//! Given histograms `A[:, k]` on a shared support with cost `M`, find
//!
//! ```text
//! argmin_h Σ_k w_k W_reg(h, A[:, k])
//! ```
//!
//! The fixed point keeps one scaling `u[:, k]` per histogram. At every step
//! `UKv = u ⊙ K(A ⊘ K u)` holds the current estimate of the barycenter as
//! seen from each histogram; `u` is then multiplied by the weighted geometric
//! mean of those columns over `UKv`. At the fixed point all columns agree,
//! so the summed row-wise standard deviation of `UKv` serves as the error.
//!
//! Reference: Benamou et al. (2015), Iterative Bregman Projections.

use crate::kernel::{geometric_bar, geometric_mean, gibbs_kernel};
use crate::params::BarycenterParams;
use crate::report::{Recorder, SolveLog};
use crate::{all_finite, check_regularization, unif, Error, Result};
use ndarray::{Array1, Array2, Axis};

/// Entropic regularized Wasserstein barycenter of the columns of `distributions`.
///
/// # Arguments
///
/// * `distributions` - Matrix A (d × n), one histogram per column
/// * `cost` - Cost matrix M (d × d) on the shared support
/// * `reg` - Regularization strength, > 0
/// * `params` - see [`BarycenterParams`]; `weights` must have length n
///
/// # Returns
///
/// The barycenter (length d) and, when `params.log` is set, a [`SolveLog`]
/// with the spread of `UKv` sampled on iterations 1, 11, 21, ...
///
/// Non-finite iterates stop the loop with a warning; the barycenter of the
/// last finite iterate is returned.
pub fn barycenter(
    distributions: &Array2<f64>,
    cost: &Array2<f64>,
    reg: f64,
    params: &BarycenterParams,
) -> Result<(Array1<f64>, Option<SolveLog>)> {
    let (d, n) = distributions.dim();
    check_regularization(reg)?;
    if n == 0 {
        return Err(Error::Domain("barycenter needs at least one distribution"));
    }
    if cost.dim() != (d, d) {
        return Err(Error::CostShapeMismatch(d, d, cost.nrows(), cost.ncols()));
    }
    let weights = match &params.weights {
        Some(w) if w.len() != n => {
            return Err(Error::WeightsLengthMismatch {
                expected: n,
                got: w.len(),
            })
        }
        Some(w) => w.clone(),
        None => unif(n),
    };

    let k = gibbs_kernel(cost, reg);

    // First pass with u = 1 ⊘ colsum(K), then equalize the columns.
    let k_colsum = k.sum_axis(Axis(0)).insert_axis(Axis(1));
    let mut ukv = k.dot(&(distributions / &k_colsum));
    let mut u = &geometric_mean(&ukv).insert_axis(Axis(1)) / &ukv;

    let mut recorder = Recorder::new(params.log, params.verbose, 200).header_at(1);
    let mut cpt = 0;
    let mut err = 1.0;

    while err > params.stop_thr && cpt < params.max_iter {
        let ku = k.dot(&u);
        let next_ukv = &u * &k.dot(&(distributions / &ku));
        let bar = geometric_bar(&weights, &next_ukv)?;
        let next_u = &(&u * &bar.insert_axis(Axis(1))) / &next_ukv;

        if !all_finite(&next_ukv) || !all_finite(&next_u) {
            log::warn!("barycenter: numerical errors at iteration {}", cpt + 1);
            break;
        }
        cpt += 1;
        ukv = next_ukv;
        u = next_u;

        if cpt % 10 == 1 {
            err = ukv.std_axis(Axis(1), 0.0).sum();
            recorder.record(cpt, err);
        }
    }
    log::debug!("barycenter: stopped after {} iterations, err={:e}", cpt, err);

    Ok((geometric_bar(&weights, &ukv)?, recorder.finish(cpt, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sq_cost(d: usize) -> Array2<f64> {
        Array2::from_shape_fn((d, d), |(i, j)| (i as f64 - j as f64).powi(2))
    }

    #[test]
    fn single_histogram_is_its_own_barycenter() {
        let a = array![0.1, 0.2, 0.4, 0.2, 0.1];
        let distributions = a.clone().insert_axis(Axis(1));
        let params = BarycenterParams::default()
            .with_weights(array![1.0])
            .with_log(true);
        let (bar, log) = barycenter(&distributions, &sq_cost(5), 0.1, &params).unwrap();
        for i in 0..5 {
            assert!((bar[i] - a[i]).abs() < 1e-3, "bar={:?}", bar);
        }
        // One column has zero spread: done after the first iteration.
        assert_eq!(log.unwrap().niter, 1);
    }

    #[test]
    fn rejects_mismatched_weights() {
        let distributions = Array2::from_elem((3, 2), 1.0 / 3.0);
        let params = BarycenterParams::default().with_weights(array![0.2, 0.3, 0.5]);
        assert_eq!(
            barycenter(&distributions, &sq_cost(3), 1.0, &params).unwrap_err(),
            Error::WeightsLengthMismatch { expected: 2, got: 3 }
        );
    }

    #[test]
    fn rejects_non_square_cost() {
        let distributions = Array2::from_elem((3, 2), 1.0 / 3.0);
        let cost = Array2::zeros((3, 4));
        assert_eq!(
            barycenter(&distributions, &cost, 1.0, &BarycenterParams::default()).unwrap_err(),
            Error::CostShapeMismatch(3, 3, 3, 4)
        );
    }

    #[test]
    fn identical_columns_reproduce_the_common_histogram() {
        let a = array![0.05, 0.15, 0.3, 0.3, 0.15, 0.05];
        let mut distributions = Array2::zeros((6, 3));
        for mut col in distributions.columns_mut() {
            col.assign(&a);
        }
        let (bar, _) =
            barycenter(&distributions, &sq_cost(6), 0.1, &BarycenterParams::default()).unwrap();
        for i in 0..6 {
            assert!((bar[i] - a[i]).abs() < 1e-3, "bar={:?}", bar);
        }
    }

    #[test]
    fn degenerate_kernel_stops_with_finite_output() {
        // Point masses and a kernel that underflows to the identity.
        let distributions = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let params = BarycenterParams::default().with_log(true);
        let (bar, log) = barycenter(&distributions, &sq_cost(3), 1e-3, &params).unwrap();
        assert!(bar.iter().all(|x| x.is_finite()));
        assert_eq!(log.unwrap().niter, 0);
    }
}
