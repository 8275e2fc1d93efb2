//! What a solver hands back besides its primary result.
//!
//! A [`SolveLog`] exists only when the caller asked for one (`log: true` in
//! the solver parameters). It carries the sampled error trace, the number of
//! iterations performed and, for the log-stabilized solvers, the consolidated
//! dual potentials that can seed a later call through [`Warmstart`].

use ndarray::Array1;

/// Initial log-potentials `(alpha, beta)` for the stabilized solvers.
///
/// `alpha` has one entry per source bin, `beta` one per target bin. The
/// stabilized kernel is `exp(-(M_ij - alpha_i - beta_j) / reg)`, so passing
/// the potentials returned by a converged solve restarts from its plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warmstart {
    /// Source-side potential.
    pub alpha: Array1<f64>,
    /// Target-side potential.
    pub beta: Array1<f64>,
}

impl Warmstart {
    /// Zero potentials: the cold start.
    pub fn zeros(na: usize, nb: usize) -> Self {
        Self {
            alpha: Array1::zeros(na),
            beta: Array1::zeros(nb),
        }
    }

    /// Log-domain scalings `(alpha / reg, beta / reg)`.
    ///
    /// These are `ln u` and `ln v` of the equivalent plain Sinkhorn iterate.
    pub fn log_scalings(&self, reg: f64) -> (Array1<f64>, Array1<f64>) {
        (&self.alpha / reg, &self.beta / reg)
    }
}

/// Per-call record of a solve.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveLog {
    /// Error samples in the order they were measured.
    pub err: Vec<f64>,
    /// Iterations performed (outer iterations for epsilon scaling).
    pub niter: usize,
    /// Final consolidated potentials, for the log-stabilized solvers.
    pub warmstart: Option<Warmstart>,
}

impl SolveLog {
    /// Most recent error sample.
    pub fn last_err(&self) -> Option<f64> {
        self.err.last().copied()
    }
}

/// Collects error samples and prints the verbose `It.|Err` table.
pub(crate) struct Recorder {
    log: Option<SolveLog>,
    verbose: bool,
    header_every: usize,
    header_phase: usize,
}

impl Recorder {
    pub(crate) fn new(keep_log: bool, verbose: bool, header_every: usize) -> Self {
        Self {
            log: keep_log.then(SolveLog::default),
            verbose,
            header_every: header_every.max(1),
            header_phase: 0,
        }
    }

    /// Print the header on iterations `phase`, `phase + header_every`, ...
    /// for solvers that sample off the multiples of their period.
    pub(crate) fn header_at(mut self, phase: usize) -> Self {
        self.header_phase = phase % self.header_every;
        self
    }

    fn starts_table(&self, cpt: usize) -> bool {
        cpt % self.header_every == self.header_phase
    }

    pub(crate) fn record(&mut self, cpt: usize, err: f64) {
        if let Some(log) = self.log.as_mut() {
            log.err.push(err);
        }
        if self.verbose {
            if self.starts_table(cpt) {
                log::info!("{:5}|{:12}", "It.", "Err");
                log::info!("{}", "-".repeat(19));
            }
            log::info!("{:5}|{:8e}|", cpt, err);
        }
    }

    pub(crate) fn finish(self, niter: usize, warmstart: Option<Warmstart>) -> Option<SolveLog> {
        self.log.map(|mut log| {
            log.niter = niter;
            log.warmstart = warmstart;
            log
        })
    }
}
