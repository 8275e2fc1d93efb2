// Small regularization on a 1D grid.
//
// Plain Sinkhorn underflows once exp(-M/reg) hits zero; it stops early and
// returns its last finite iterate. Epsilon scaling anneals reg from a large
// value down to the target and reaches a sharp, correct plan.
//
// Run with RUST_LOG=warn to see the plain solver's warning.

use bregman::{
    normalize_cost, sinkhorn, sinkhorn_epsilon_scaling, sqeuclidean_cost_matrix, CostNorm,
    EpsilonScalingParams, SinkhornParams,
};
use ndarray::{Array1, Array2, Axis};

fn marginal_error(plan: &Array2<f64>, a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let rows = plan.sum_axis(Axis(1));
    let cols = plan.sum_axis(Axis(0));
    (&rows - a).mapv(f64::abs).sum() + (&cols - b).mapv(f64::abs).sum()
}

fn main() -> Result<(), bregman::Error> {
    env_logger::init();

    let n = 20;
    let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
    let cost = normalize_cost(&sqeuclidean_cost_matrix(&x, &x)?, CostNorm::Max);

    let a = Array1::from_shape_fn(n, |i| if i < n / 2 { 2.0 / n as f64 } else { 0.0 });
    let b = Array1::from_shape_fn(n, |i| if i >= n / 2 { 2.0 / n as f64 } else { 0.0 });
    let reg = 1e-3;

    let (plain, plain_log) = sinkhorn(&a, &b, &cost, reg, &SinkhornParams::default().with_log(true))?;
    println!(
        "sinkhorn:           iters={:>5} marginal L1 error={:.3e}",
        plain_log.map_or(0, |l| l.niter),
        marginal_error(&plain, &a, &b)
    );

    let params = EpsilonScalingParams::default().with_log(true);
    let (scaled, scaled_log) = sinkhorn_epsilon_scaling(&a, &b, &cost, reg, &params)?;
    println!(
        "epsilon scaling:    steps={:>5} marginal L1 error={:.3e}",
        scaled_log.map_or(0, |l| l.niter),
        marginal_error(&scaled, &a, &b)
    );

    // Each source bin i should send its mass to bin i + n/2.
    for i in 0..n / 2 {
        let (j, mass) = scaled
            .row(i)
            .iter()
            .enumerate()
            .fold((0, 0.0), |(bj, bm), (j, &m)| if m > bm { (j, m) } else { (bj, bm) });
        println!("  {i:>2} -> {j:>2} ({mass:.4})");
    }
    Ok(())
}
