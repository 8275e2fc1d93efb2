// Entropic barycenter of two Gaussian bumps on a 1D grid.
//
// The Euclidean average of the histograms is bimodal. The Wasserstein
// barycenter is a single bump half way between the inputs.

use bregman::{barycenter, normalize_cost, sqeuclidean_cost_matrix, BarycenterParams, CostNorm};
use ndarray::{Array1, Array2};

fn gaussian_hist(n: usize, mean: f64, sigma: f64) -> Array1<f64> {
    let v = Array1::from_shape_fn(n, |i| {
        let z = (i as f64 - mean) / sigma;
        (-0.5 * z * z).exp()
    });
    let s = v.sum();
    v / s
}

fn bar(x: f64) -> String {
    "#".repeat((x * 200.0).round() as usize)
}

fn main() -> Result<(), bregman::Error> {
    env_logger::init();

    let n = 40;
    let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
    let cost = normalize_cost(&sqeuclidean_cost_matrix(&x, &x)?, CostNorm::Max);

    let mut distributions = Array2::zeros((n, 2));
    distributions.column_mut(0).assign(&gaussian_hist(n, 10.0, 2.5));
    distributions.column_mut(1).assign(&gaussian_hist(n, 29.0, 2.5));

    let params = BarycenterParams::default().with_log(true);
    let (wass, log) = barycenter(&distributions, &cost, 1e-3, &params)?;
    let euclid = distributions.mean_axis(ndarray::Axis(1)).unwrap_or_else(|| Array1::zeros(n));

    if let Some(log) = log {
        println!("converged in {} iterations, final spread {:?}", log.niter, log.last_err());
    }
    println!("{:>3} | {:<24} | {:<24}", "bin", "wasserstein", "euclidean");
    for i in 0..n {
        println!("{:>3} | {:<24} | {:<24}", i, bar(wass[i]), bar(euclid[i]));
    }
    Ok(())
}
