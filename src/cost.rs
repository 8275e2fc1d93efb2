//! Ground-cost matrices.
//!
//! Points are the rows of the input matrices. Costs are usually rescaled
//! before building a Gibbs kernel so that `reg` has a scale-free meaning;
//! see [`normalize_cost`].

use crate::{Error, Result};
use ndarray::Array2;

/// How [`normalize_cost`] rescales a cost matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostNorm {
    /// Divide by the largest entry.
    Max,
    /// Divide by the median entry.
    Median,
}

/// Squared Euclidean cost matrix: `C[i, j] = ‖x_i − y_j‖²`.
pub fn sqeuclidean_cost_matrix(x: &Array2<f64>, y: &Array2<f64>) -> Result<Array2<f64>> {
    let d = x.ncols();
    if y.ncols() != d {
        return Err(Error::DimensionMismatch(d, y.ncols()));
    }

    let mut cost = Array2::zeros((x.nrows(), y.nrows()));
    for (i, xi) in x.rows().into_iter().enumerate() {
        for (j, yj) in y.rows().into_iter().enumerate() {
            cost[[i, j]] = xi
                .iter()
                .zip(yj.iter())
                .map(|(&p, &q)| (p - q) * (p - q))
                .sum();
        }
    }
    Ok(cost)
}

/// Euclidean cost matrix: `C[i, j] = ‖x_i − y_j‖₂`.
pub fn euclidean_cost_matrix(x: &Array2<f64>, y: &Array2<f64>) -> Result<Array2<f64>> {
    Ok(sqeuclidean_cost_matrix(x, y)?.mapv(f64::sqrt))
}

/// Rescale `cost` by its max or median entry.
///
/// A zero (or non-finite) normalizer returns the matrix unchanged.
pub fn normalize_cost(cost: &Array2<f64>, norm: CostNorm) -> Array2<f64> {
    let scale = match norm {
        CostNorm::Max => cost.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        CostNorm::Median => median(cost.iter().copied().collect()),
    };
    if scale == 0.0 || !scale.is_finite() {
        return cost.to_owned();
    }
    cost / scale
}

/// Median with the midpoint convention for even counts.
fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn euclidean_cost_on_unit_points() {
        let x = array![[0.0, 0.0], [1.0, 0.0]];
        let y = array![[0.0, 0.0], [0.0, 1.0]];
        let cost = euclidean_cost_matrix(&x, &y).unwrap();
        assert!((cost[[0, 0]] - 0.0).abs() < 1e-12);
        assert!((cost[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((cost[[1, 0]] - 1.0).abs() < 1e-12);
        assert!((cost[[1, 1]] - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sqeuclidean_is_square_of_euclidean() {
        let x = array![[0.0, 1.0, 2.0], [3.0, -1.0, 0.5]];
        let y = array![[1.0, 1.0, 1.0]];
        let sq = sqeuclidean_cost_matrix(&x, &y).unwrap();
        let e = euclidean_cost_matrix(&x, &y).unwrap();
        assert_eq!(sq.dim(), (2, 1));
        for (s, e) in sq.iter().zip(e.iter()) {
            assert!((s - e * e).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let x = array![[0.0, 0.0]];
        let y = array![[0.0, 0.0, 0.0]];
        assert_eq!(
            euclidean_cost_matrix(&x, &y).unwrap_err(),
            Error::DimensionMismatch(2, 3)
        );
    }

    #[test]
    fn normalize_by_max_and_median() {
        let c = array![[0.0, 1.0], [4.0, 2.0]];
        let by_max = normalize_cost(&c, CostNorm::Max);
        assert_eq!(by_max, array![[0.0, 0.25], [1.0, 0.5]]);
        // Sorted entries 0, 1, 2, 4: median 1.5.
        let by_median = normalize_cost(&c, CostNorm::Median);
        assert!((by_median[[1, 0]] - 4.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn zero_cost_is_left_alone() {
        let c = Array2::zeros((2, 2));
        assert_eq!(normalize_cost(&c, CostNorm::Max), c);
        assert_eq!(normalize_cost(&c, CostNorm::Median), c);
    }
}
