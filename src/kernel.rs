//! Numeric kernel utilities shared by the Bregman solvers.
//!
//! Everything here is a dense, elementwise operation on `ndarray` matrices:
//! the Gibbs kernel, geometric means over the columns of a matrix, and the
//! row/column projections that rescale a nonnegative matrix onto target
//! marginals (the Kullback-Leibler projections onto the affine constraint
//! sets `γ 1 = p` and `γᵀ 1 = q`).

use crate::{Error, Result};
use ndarray::{Array1, Array2, Axis};

/// Lower bound on row/column sums in [`proj_r`] and [`proj_c`].
pub const PROJECTION_FLOOR: f64 = 1e-10;

/// Gibbs kernel `K = exp(-M / reg)`.
pub fn gibbs_kernel(cost: &Array2<f64>, reg: f64) -> Array2<f64> {
    cost.mapv(|c| (-c / reg).exp())
}

/// `diag(u) K diag(v)` by broadcasting, without building diagonal matrices.
pub fn scale_rows_cols(u: &Array1<f64>, k: &Array2<f64>, v: &Array1<f64>) -> Array2<f64> {
    let u_col = u.view().insert_axis(Axis(1));
    let v_row = v.view().insert_axis(Axis(0));
    &(k * &u_col) * &v_row
}

/// Geometric mean of each row across the columns of `x`.
///
/// `out[i] = exp(mean_k ln x[i, k])`. Zero entries drive the row to 0.
pub fn geometric_mean(x: &Array2<f64>) -> Array1<f64> {
    let n = x.ncols().max(1) as f64;
    x.map_axis(Axis(1), |row| {
        let s: f64 = row.iter().map(|v| v.ln()).sum();
        (s / n).exp()
    })
}

/// Weighted geometric mean of each row across the columns of `x`.
///
/// `out[i] = exp(Σ_k w_k ln x[i, k])`, one weight per column.
pub fn geometric_bar(weights: &Array1<f64>, x: &Array2<f64>) -> Result<Array1<f64>> {
    if weights.len() != x.ncols() {
        return Err(Error::WeightsLengthMismatch {
            expected: x.ncols(),
            got: weights.len(),
        });
    }
    Ok(x.mapv(f64::ln).dot(weights).mapv(f64::exp))
}

/// Rescale the rows of `gamma` so that its row sums equal `p`.
pub fn proj_r(gamma: &Array2<f64>, p: &Array1<f64>) -> Array2<f64> {
    let sums = gamma.sum_axis(Axis(1));
    let scale = ndarray::Zip::from(p)
        .and(&sums)
        .map_collect(|&t, &s| t / s.max(PROJECTION_FLOOR));
    gamma * &scale.insert_axis(Axis(1))
}

/// Rescale the columns of `gamma` so that its column sums equal `q`.
pub fn proj_c(gamma: &Array2<f64>, q: &Array1<f64>) -> Array2<f64> {
    let sums = gamma.sum_axis(Axis(0));
    let scale = ndarray::Zip::from(q)
        .and(&sums)
        .map_collect(|&t, &s| t / s.max(PROJECTION_FLOOR));
    gamma * &scale.insert_axis(Axis(0))
}
