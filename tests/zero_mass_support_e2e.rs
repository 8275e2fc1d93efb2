use bregman::{
    sinkhorn, sinkhorn_epsilon_scaling, sinkhorn_stabilized, EpsilonScalingParams, SinkhornParams,
    StabilizedParams,
};
use ndarray::{array, Array1, Array2};

fn line_cost(n: usize) -> Array2<f64> {
    let mut c = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            c[[i, j]] = (i as f64 - j as f64).abs();
        }
    }
    c
}

fn check_zero_support(plan: &Array2<f64>, solver: &str) {
    // Rows 0 and 2 carry no mass in `a`; column 2 carries none in `b`.
    let r0 = plan.row(0).sum();
    let r1 = plan.row(1).sum();
    let r2 = plan.row(2).sum();
    assert!(r0.abs() < 1e-12, "{}: row0 should be 0, got {}", solver, r0);
    assert!((r1 - 1.0).abs() < 1e-4, "{}: row1 should be ~1, got {}", solver, r1);
    assert!(r2.abs() < 1e-12, "{}: row2 should be 0, got {}", solver, r2);

    let c0 = plan.column(0).sum();
    let c1 = plan.column(1).sum();
    let c2 = plan.column(2).sum();
    assert!((c0 - 0.5).abs() < 1e-4, "{}: col0 should be ~0.5, got {}", solver, c0);
    assert!((c1 - 0.5).abs() < 1e-4, "{}: col1 should be ~0.5, got {}", solver, c1);
    assert!(c2.abs() < 1e-12, "{}: col2 should be 0, got {}", solver, c2);

    for j in 0..3 {
        assert_eq!(plan[[0, j]], 0.0, "{}: plan[0,{}]", solver, j);
        assert_eq!(plan[[2, j]], 0.0, "{}: plan[2,{}]", solver, j);
    }
    assert_eq!(plan[[1, 2]], 0.0, "{}: plan[1,2]", solver);
}

#[test]
fn both_solvers_respect_zero_mass_support() {
    let a: Array1<f64> = array![0.0, 1.0, 0.0];
    let b: Array1<f64> = array![0.5, 0.5, 0.0];
    let cost = line_cost(3);
    let reg = 0.2;

    let (plain, _) = sinkhorn(
        &a,
        &b,
        &cost,
        reg,
        &SinkhornParams::default().with_max_iter(2000),
    )
    .unwrap();
    check_zero_support(&plain, "sinkhorn");

    let (stab, _) = sinkhorn_stabilized(
        &a,
        &b,
        &cost,
        reg,
        &StabilizedParams::default().with_max_iter(2000),
    )
    .unwrap();
    check_zero_support(&stab, "sinkhorn_stabilized");
}

#[test]
fn warm_restart_on_zero_mass_support_reproduces_the_plan() {
    let a: Array1<f64> = array![0.0, 1.0, 0.0];
    let b: Array1<f64> = array![0.5, 0.5, 0.0];
    let cost = line_cost(3);
    let params = StabilizedParams::default().with_max_iter(2000).with_log(true);

    let (cold, log) = sinkhorn_stabilized(&a, &b, &cost, 0.2, &params).unwrap();
    let ws = log.unwrap().warmstart.unwrap();
    assert!(ws.alpha.iter().chain(ws.beta.iter()).all(|x| x.is_finite()));

    let (warm, _) =
        sinkhorn_stabilized(&a, &b, &cost, 0.2, &params.clone().with_warmstart(ws)).unwrap();
    check_zero_support(&warm, "warm sinkhorn_stabilized");
    for (c, w) in cold.iter().zip(warm.iter()) {
        assert!((c - w).abs() < 1e-9, "cold={} warm={}", c, w);
    }
}

#[test]
fn epsilon_scaling_respects_zero_mass_support() {
    let a: Array1<f64> = array![0.0, 1.0, 0.0];
    let b: Array1<f64> = array![0.5, 0.5, 0.0];
    let cost = line_cost(3);

    let params = EpsilonScalingParams::default().with_log(true);
    let (plan, log) = sinkhorn_epsilon_scaling(&a, &b, &cost, 0.2, &params).unwrap();
    check_zero_support(&plan, "sinkhorn_epsilon_scaling");

    let ws = log.unwrap().warmstart.unwrap();
    assert!(ws.alpha.iter().chain(ws.beta.iter()).all(|x| x.is_finite()));
}
