// Unmixing a noisy observation over a dictionary of three spectra.
//
// alpha = 0 fits the observation only; alpha = 1 returns the prior. Values in
// between trade the two transport costs against each other.

use bregman::{normalize_cost, sqeuclidean_cost_matrix, unmix, CostNorm, UnmixParams};
use ndarray::{array, Array1, Array2};

fn bump(n: usize, mean: f64, sigma: f64) -> Array1<f64> {
    let v = Array1::from_shape_fn(n, |i| {
        let z = (i as f64 - mean) / sigma;
        (-0.5 * z * z).exp()
    });
    let s = v.sum();
    v / s
}

fn main() -> Result<(), bregman::Error> {
    env_logger::init();

    let d = 30;
    let centers = [6.0, 15.0, 24.0];
    let mut dictionary = Array2::zeros((d, centers.len()));
    for (k, &c) in centers.iter().enumerate() {
        dictionary.column_mut(k).assign(&bump(d, c, 2.0));
    }

    // True mixture 0.6 / 0.3 / 0.1, with the middle atom shifted one bin.
    let truth = array![0.6, 0.3, 0.1];
    let observed = 0.6 * &bump(d, 6.0, 2.0) + 0.3 * &bump(d, 16.0, 2.0) + 0.1 * &bump(d, 24.0, 2.0);

    let grid = Array2::from_shape_fn((d, 1), |(i, _)| i as f64);
    let cost = normalize_cost(&sqeuclidean_cost_matrix(&grid, &grid)?, CostNorm::Max);
    let atoms = array![[0.0], [1.0], [2.0]];
    let cost0 = normalize_cost(&sqeuclidean_cost_matrix(&atoms, &atoms)?, CostNorm::Max);
    let prior = array![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0];

    println!("truth: {:.3}", truth);
    for alpha in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let (h, log) = unmix(
            &observed,
            &dictionary,
            &cost,
            &cost0,
            &prior,
            0.01,
            0.1,
            alpha,
            &UnmixParams::default().with_log(true),
        )?;
        println!(
            "alpha={alpha:.2}: h={:.3} iters={}",
            h,
            log.map_or(0, |l| l.niter)
        );
    }
    Ok(())
}
