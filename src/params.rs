//! Solver configuration.
//!
//! Each solver takes its hyperparameters through a plain struct whose
//! `Default` carries the documented defaults. Fields are public, so either
//! struct-update syntax or the `with_*` setters work:
//!
//! ```rust
//! use bregman::StabilizedParams;
//!
//! let p = StabilizedParams { tau: 1e2, ..Default::default() }.with_log(true);
//! assert_eq!(p.max_iter, 1000);
//! ```

use crate::report::Warmstart;
use ndarray::Array1;

/// Parameters for [`sinkhorn`](crate::sinkhorn()).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SinkhornParams {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Stop when the squared column-marginal error falls to this value.
    pub stop_thr: f64,
    /// Print the iteration table through `log::info!`.
    pub verbose: bool,
    /// Return a [`SolveLog`](crate::SolveLog).
    pub log: bool,
}

impl Default for SinkhornParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            stop_thr: 1e-9,
            verbose: false,
            log: false,
        }
    }
}

impl SinkhornParams {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_stop_thr(mut self, stop_thr: f64) -> Self {
        self.stop_thr = stop_thr;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

/// Parameters for [`sinkhorn_stabilized`](crate::sinkhorn_stabilized()).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct StabilizedParams {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Absorb `u`, `v` into the potentials once either exceeds this magnitude.
    pub tau: f64,
    /// Stop when the squared column-marginal error falls to this value.
    pub stop_thr: f64,
    /// Initial potentials; zeros when `None`.
    pub warmstart: Option<Warmstart>,
    /// Print the iteration table through `log::info!`.
    pub verbose: bool,
    /// Error is measured every `print_period` iterations.
    pub print_period: usize,
    /// Return a [`SolveLog`](crate::SolveLog).
    pub log: bool,
}

impl Default for StabilizedParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tau: 1e3,
            stop_thr: 1e-9,
            warmstart: None,
            verbose: false,
            print_period: 20,
            log: false,
        }
    }
}

impl StabilizedParams {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_stop_thr(mut self, stop_thr: f64) -> Self {
        self.stop_thr = stop_thr;
        self
    }

    pub fn with_warmstart(mut self, warmstart: Warmstart) -> Self {
        self.warmstart = Some(warmstart);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_print_period(mut self, print_period: usize) -> Self {
        self.print_period = print_period;
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

/// Parameters for [`sinkhorn_epsilon_scaling`](crate::sinkhorn_epsilon_scaling()).
///
/// The inner stabilized solves always run with `stop_thr = 1e-9` and
/// `tau = 1e3`; only their iteration budget is configurable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct EpsilonScalingParams {
    /// Maximum number of outer (annealing) steps, raised to at least
    /// [`NUM_ITER_MIN`](crate::NUM_ITER_MIN).
    pub max_iter: usize,
    /// Starting regularization of the annealing schedule.
    pub epsilon0: f64,
    /// Iteration budget of each inner stabilized solve.
    pub inner_max_iter: usize,
    /// Outer stop threshold on the combined row and column error.
    pub stop_thr: f64,
    /// Initial potentials; zeros when `None`.
    pub warmstart: Option<Warmstart>,
    /// Print the outer iteration table through `log::info!`.
    pub verbose: bool,
    /// Outer error is measured every `print_period` steps.
    pub print_period: usize,
    /// Return a [`SolveLog`](crate::SolveLog).
    pub log: bool,
}

impl Default for EpsilonScalingParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            epsilon0: 1e4,
            inner_max_iter: 100,
            stop_thr: 1e-9,
            warmstart: None,
            verbose: false,
            print_period: 10,
            log: false,
        }
    }
}

impl EpsilonScalingParams {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_epsilon0(mut self, epsilon0: f64) -> Self {
        self.epsilon0 = epsilon0;
        self
    }

    pub fn with_inner_max_iter(mut self, inner_max_iter: usize) -> Self {
        self.inner_max_iter = inner_max_iter;
        self
    }

    pub fn with_stop_thr(mut self, stop_thr: f64) -> Self {
        self.stop_thr = stop_thr;
        self
    }

    pub fn with_warmstart(mut self, warmstart: Warmstart) -> Self {
        self.warmstart = Some(warmstart);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_print_period(mut self, print_period: usize) -> Self {
        self.print_period = print_period;
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

/// Parameters for [`barycenter`](crate::barycenter()).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct BarycenterParams {
    /// Convex weights, one per distribution; uniform when `None`.
    pub weights: Option<Array1<f64>>,
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Stop when the summed row-wise spread of `UKv` falls to this value.
    pub stop_thr: f64,
    /// Print the iteration table through `log::info!`.
    pub verbose: bool,
    /// Return a [`SolveLog`](crate::SolveLog).
    pub log: bool,
}

impl Default for BarycenterParams {
    fn default() -> Self {
        Self {
            weights: None,
            max_iter: 1000,
            stop_thr: 1e-4,
            verbose: false,
            log: false,
        }
    }
}

impl BarycenterParams {
    pub fn with_weights(mut self, weights: Array1<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_stop_thr(mut self, stop_thr: f64) -> Self {
        self.stop_thr = stop_thr;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

/// Parameters for [`unmix`](crate::unmix()).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct UnmixParams {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Stop when the prior-side row sums move less than this (L2).
    pub stop_thr: f64,
    /// Print the iteration table through `log::info!`.
    pub verbose: bool,
    /// Return a [`SolveLog`](crate::SolveLog).
    pub log: bool,
}

impl Default for UnmixParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            stop_thr: 1e-3,
            verbose: false,
            log: false,
        }
    }
}

impl UnmixParams {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_stop_thr(mut self, stop_thr: f64) -> Self {
        self.stop_thr = stop_thr;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}
