// Two points, unit swap cost, uniform marginals.
//
// With K = [[1, e^{-1/reg}], [e^{-1/reg}, 1]] the entropic plan is
//   P = 1/(2(1 + q)) [[1, q], [q, 1]],   q = e^{-1/reg}
// so the off-diagonal mass goes from 1/4 (reg -> inf) to 0 (reg -> 0).

use bregman::{sinkhorn, transport_cost, SinkhornParams};
use ndarray::array;

fn main() -> Result<(), bregman::Error> {
    env_logger::init();

    let a = array![0.5, 0.5];
    let b = array![0.5, 0.5];
    let cost = array![[0.0, 1.0], [1.0, 0.0]];

    for reg in [10.0, 1.0, 0.5, 0.2] {
        let (plan, log) = sinkhorn(&a, &b, &cost, reg, &SinkhornParams::default().with_log(true))?;
        let q = (-1.0f64 / reg).exp();
        let expected = 0.5 * q / (1.0 + q);
        println!(
            "reg={reg:>4}: off-diagonal={:.6} closed form={:.6} cost={:.6} iters={}",
            plan[[0, 1]],
            expected,
            transport_cost(&plan, &cost)?,
            log.map_or(0, |l| l.niter)
        );
    }
    Ok(())
}
