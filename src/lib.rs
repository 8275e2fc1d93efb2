//! # bregman
//!
//! Entropic optimal transport computed by Bregman projections.
//!
//! ## The Problem
//!
//! Given two histograms `a` and `b` and a cost matrix `M`, find the coupling
//! that moves `a` onto `b` at minimum cost, smoothed by an entropy term:
//!
//! ```text
//! γ = argmin_γ <γ, M>_F + reg · Σ γ_ij log γ_ij
//!     s.t. γ 1 = a,  γᵀ 1 = b,  γ ≥ 0
//! ```
//!
//! The solution has the form `γ = diag(u) K diag(v)` with `K = exp(-M/reg)`,
//! and Sinkhorn-Knopp finds `u`, `v` by alternately rescaling rows and columns.
//!
//! ## Key Functions
//!
//! | Function | Use Case |
//! |----------|----------|
//! | [`sinkhorn`] | Plain matrix scaling; fast, fragile when `reg` is small |
//! | [`sinkhorn_stabilized`] | Log-domain absorption keeps `u`, `v` bounded |
//! | [`sinkhorn_epsilon_scaling`] | Anneals `reg` down to the target with warm starts |
//! | [`barycenter`] | Entropic Wasserstein barycenter of several histograms |
//! | [`unmix`] | Decompose an observation over a dictionary, pulled toward a prior |
//!
//! ## Quick Start
//!
//! ```rust
//! use bregman::{sinkhorn, SinkhornParams};
//! use ndarray::array;
//!
//! let a = array![0.5, 0.5];
//! let b = array![0.5, 0.5];
//! let cost = array![[0.0, 1.0], [1.0, 0.0]];
//!
//! let (plan, _) = sinkhorn(&a, &b, &cost, 1.0, &SinkhornParams::default()).unwrap();
//! assert!((plan[[0, 0]] - 0.3655).abs() < 1e-3);
//! assert!((plan[[0, 1]] - 0.1345).abs() < 1e-3);
//! ```
//!
//! ## What Can Go Wrong
//!
//! 1. **Underflow in `K`**: small `reg` against large costs sends `exp(-M/reg)` to 0.
//!    The plain solver then stops early and returns its last good iterate with a
//!    warning. Use [`sinkhorn_stabilized`] or [`sinkhorn_epsilon_scaling`].
//! 2. **Not converged**: hitting `max_iter` is not an error. Ask for a log
//!    (`log: true`) and inspect [`SolveLog::err`].
//! 3. **Unnormalized marginals**: balanced OT assumes `a` and `b` both sum to 1.
//!    Nothing here renormalizes them for you.
//! 4. **Empty marginals** are replaced by the uniform histogram on the matching
//!    axis of the cost matrix.
//!
//! Warnings and verbose progress go through the [`log`](https://docs.rs/log)
//! facade; install any logger (e.g. `env_logger`) to see them.
//!
//! ## References
//!
//! - Cuturi (2013). "Sinkhorn Distances: Lightspeed Computation of Optimal Transport"
//! - Benamou, Carlier, Cuturi, Nenna, Peyré (2015). "Iterative Bregman Projections
//!   for Regularized Transportation Problems"
//! - Schmitzer (2016). "Stabilized Sparse Scaling Algorithms for Entropy Regularized
//!   Transport Problems"
//! - Chizat, Peyré, Schmitzer, Vialard (2016). "Scaling Algorithms for Unbalanced
//!   Transport Problems"
//! - Nakhostin, Courty, Flamary, Tuia, Corpetti (2016). "Supervised Planetary
//!   Unmixing with Optimal Transport"

use ndarray::{Array1, Array2};
use thiserror::Error;

pub mod barycenter;
pub mod cost;
pub mod epsilon_scaling;
pub mod kernel;
pub mod params;
pub mod report;
pub mod sinkhorn;
pub mod stabilized;
pub mod unmix;

pub use barycenter::barycenter;
pub use cost::{euclidean_cost_matrix, normalize_cost, sqeuclidean_cost_matrix, CostNorm};
pub use epsilon_scaling::{annealed_reg, sinkhorn_epsilon_scaling, NUM_ITER_MIN};
pub use kernel::{geometric_bar, geometric_mean, gibbs_kernel, proj_c, proj_r};
pub use params::{
    BarycenterParams, EpsilonScalingParams, SinkhornParams, StabilizedParams, UnmixParams,
};
pub use report::{SolveLog, Warmstart};
pub use sinkhorn::sinkhorn;
pub use stabilized::sinkhorn_stabilized;
pub use unmix::unmix;

/// Bregman solver error variants.
///
/// Only input-contract violations are errors. Numerical degeneration during
/// iteration is reported with a warning and a best-effort result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A vector does not match the axis it is paired with.
    #[error("length mismatch: expected {0}, got {1}")]
    LengthMismatch(usize, usize),

    /// Cost matrix shape mismatch.
    #[error("cost matrix shape mismatch: expected ({0}, {1}), got ({2}, {3})")]
    CostShapeMismatch(usize, usize, usize, usize),

    /// Barycentric weights do not match the number of distributions.
    #[error("expected {expected} weights (one per distribution), got {got}")]
    WeightsLengthMismatch {
        /// Number of distributions (columns).
        expected: usize,
        /// Number of weights supplied.
        got: usize,
    },

    /// Dictionary rows do not match the observation support.
    #[error("dictionary has {rows} rows but the observation has {expected} bins")]
    DictionaryShapeMismatch {
        /// Observation length.
        expected: usize,
        /// Dictionary row count.
        rows: usize,
    },

    /// Invalid regularization parameter.
    #[error("regularization parameter must be positive and finite, got {0}")]
    InvalidRegularization(f64),

    /// Unmixing trade-off outside `[0, 1]`.
    #[error("prior trade-off must lie in [0, 1], got {0}")]
    InvalidTradeoff(f64),

    /// Point clouds live in different dimensions.
    #[error("point dimensions differ: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    /// Domain error (invalid inputs for the mathematical definition).
    #[error("{0}")]
    Domain(&'static str),
}

/// Result type for Bregman solvers.
pub type Result<T> = std::result::Result<T, Error>;

/// Uniform histogram on `n` bins.
///
/// Returns an empty vector when `n == 0`.
pub fn unif(n: usize) -> Array1<f64> {
    if n == 0 {
        return Array1::zeros(0);
    }
    Array1::from_elem(n, 1.0 / n as f64)
}

/// Transport cost `<P, M>_F = Σ P_ij M_ij` of a plan.
///
/// This is the entropic Sinkhorn loss without the entropy term.
pub fn transport_cost(plan: &Array2<f64>, cost: &Array2<f64>) -> Result<f64> {
    if plan.dim() != cost.dim() {
        let (m, n) = plan.dim();
        return Err(Error::CostShapeMismatch(m, n, cost.nrows(), cost.ncols()));
    }
    Ok(plan.iter().zip(cost.iter()).map(|(&p, &c)| p * c).sum())
}

/// Empty marginals stand for the uniform histogram on `n` bins.
pub(crate) fn marginal_or_uniform(x: &Array1<f64>, n: usize) -> Array1<f64> {
    if x.is_empty() {
        unif(n)
    } else {
        x.to_owned()
    }
}

pub(crate) fn check_regularization(reg: f64) -> Result<()> {
    if reg <= 0.0 || !reg.is_finite() {
        return Err(Error::InvalidRegularization(reg));
    }
    Ok(())
}

/// `a` indexes the rows of `cost`, `b` its columns.
pub(crate) fn check_marginals(a: &Array1<f64>, b: &Array1<f64>, cost: &Array2<f64>) -> Result<()> {
    let (m, n) = cost.dim();
    if a.len() != m || b.len() != n {
        return Err(Error::CostShapeMismatch(a.len(), b.len(), m, n));
    }
    Ok(())
}

/// Squared L2 distance between observed sums and their target marginal.
pub(crate) fn squared_error(sums: &Array1<f64>, target: &Array1<f64>) -> f64 {
    sums.iter()
        .zip(target.iter())
        .map(|(&s, &t)| (s - t) * (s - t))
        .sum()
}

pub(crate) fn has_nan(x: &Array1<f64>) -> bool {
    x.iter().any(|v| v.is_nan())
}

pub(crate) fn has_zero(x: &Array1<f64>) -> bool {
    x.iter().any(|&v| v == 0.0)
}

pub(crate) fn all_finite<'a>(x: impl IntoIterator<Item = &'a f64>) -> bool {
    x.into_iter().all(|v| v.is_finite())
}
