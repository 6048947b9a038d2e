use super::*;
use crate::math::optimization::SimplexOracle;
use crate::mdp::testing::{ConstantBasis, CycleModel, StayOrSwitch, TabularBasis};
use crate::mdp::{Model, StateList};
use crate::policy::GreedyPolicyFactory;
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn stay_or_switch_cost(s: &usize) -> f64 {
    if *s == 0 {
        1.0
    } else {
        2.0
    }
}

#[test]
fn test_lp_solvers_agree_with_tabular_basis() -> Result<()> {
    let model = StayOrSwitch {
        switch_probability: 1.0,
    };
    let states = StateList::enumerate(&model)?;
    let basis = TabularBasis::new(2, 0.0, 100.0);
    let oracle = SimplexOracle::default();
    let weights = [0.5, 0.5];

    let mut solvers: Vec<Box<dyn Solver<usize> + '_>> = vec![
        Box::new(OptimalPolicySolver::new(
            &oracle,
            &states,
            &stay_or_switch_cost,
            0.9,
        )?),
        Box::new(ApproximateLpSolver::new(
            &oracle,
            &states,
            &stay_or_switch_cost,
            &weights,
            &basis,
            0.9,
        )?),
        Box::new(NonConvexLpSolver::new(
            &oracle,
            &states,
            &stay_or_switch_cost,
            &weights,
            &basis,
            0.9,
            NonConvexConfig { big_m: 1000.0 },
        )?),
    ];

    for solver in solvers.iter_mut() {
        assert!(solver.solve()?);
        let value = solver.value_estimate()?;
        assert_abs_diff_eq!(value.value(&0), 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(value.value(&1), 11.0, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn test_online_solvers_track_lp_value() -> Result<()> {
    let model = CycleModel::new(2);
    let states = StateList::enumerate(&model)?;
    let basis = ConstantBasis::new(-100.0, 100.0);
    let cost = |_: &usize| 1.0;
    let oracle = SimplexOracle::default();

    let mut alp = ApproximateLpSolver::new(&oracle, &states, &cost, &[0.5, 0.5], &basis, 0.9)?;
    assert!(alp.solve()?);
    let target = alp.coefficients()?[0];

    let mut td = TdSolver::new(
        &model,
        &cost,
        &GreedyPolicyFactory,
        &basis,
        Box::new(ChaCha20Rng::seed_from_u64(3)),
        TdConfig {
            alpha: 0.9,
            lambda: 0.3,
            gamma_a: 0.1,
            gamma_b: 0.0,
            time_step_count: 2000,
            time_report_count: 500,
        },
    )?;
    let mut kalman = KalmanFilterSolver::new(
        &model,
        &cost,
        &GreedyPolicyFactory,
        &basis,
        Box::new(ChaCha20Rng::seed_from_u64(3)),
        KalmanConfig {
            alpha: 0.9,
            gamma_a: 0.5,
            gamma_b: 0.0,
            time_step_count: 2000,
            time_report_count: 500,
        },
    )?;
    assert!(td.solve()?);
    assert!(kalman.solve()?);

    let base = model.base_state();
    assert_abs_diff_eq!(td.value_estimate()?.value(&base), target, epsilon = 1e-3);
    assert_abs_diff_eq!(kalman.value_estimate()?.value(&base), target, epsilon = 1e-3);
    Ok(())
}

#[test]
fn test_value_estimate_requires_solve() {
    let model = StayOrSwitch {
        switch_probability: 1.0,
    };
    let states = StateList::enumerate(&model).unwrap();
    let oracle = SimplexOracle::default();
    let solver = OptimalPolicySolver::new(&oracle, &states, &stay_or_switch_cost, 0.9).unwrap();
    assert!(matches!(solver.value_estimate(), Err(Error::NotSolved)));
    let mut out = Vec::new();
    assert!(matches!(solver.dump_info(&mut out), Err(Error::NotSolved)));
}

#[test]
fn test_infeasible_program_reports_false() -> Result<()> {
    // no coefficient in [50, 100] satisfies r (1 - 0.9) <= 1
    let model = CycleModel::new(2);
    let states = StateList::enumerate(&model)?;
    let basis = ConstantBasis::new(50.0, 100.0);
    let cost = |_: &usize| 1.0;
    let oracle = SimplexOracle::default();
    let mut solver = ApproximateLpSolver::new(&oracle, &states, &cost, &[0.5, 0.5], &basis, 0.9)?;
    assert!(!solver.solve()?);
    assert!(matches!(solver.value_estimate(), Err(Error::NotSolved)));
    Ok(())
}

#[test]
fn test_export_model_writes_lp_file() -> Result<()> {
    let model = CycleModel::new(2);
    let states = StateList::enumerate(&model)?;
    let basis = TabularBasis::new(2, -10.0, 10.0);
    let cost = |_: &usize| 1.0;
    let oracle = SimplexOracle::default();
    let solver = ApproximateLpSolver::new(&oracle, &states, &cost, &[0.5, 0.5], &basis, 0.9)?;

    let path = std::env::temp_dir().join(format!("adp-export-{}.lp", std::process::id()));
    solver.export_model(&path)?;
    let text = std::fs::read_to_string(&path)?;
    std::fs::remove_file(&path)?;
    assert!(text.starts_with("Maximize"));
    assert!(text.contains("Subject To"));
    assert!(text.contains("r_r0"));
    assert!(text.trim_end().ends_with("End"));
    Ok(())
}

#[test]
fn test_online_export_is_noop() -> Result<()> {
    let model = CycleModel::new(2);
    let basis = ConstantBasis::new(-1.0, 1.0);
    let cost = |_: &usize| 1.0;
    let td = TdSolver::new(
        &model,
        &cost,
        &GreedyPolicyFactory,
        &basis,
        Box::new(ChaCha20Rng::seed_from_u64(0)),
        TdConfig::default(),
    )?;
    let path = std::env::temp_dir().join("adp-never-written.lp");
    td.export_model(&path)?;
    assert!(!path.exists());

    let mut out = Vec::new();
    td.dump_info(&mut out)?;
    assert_eq!(String::from_utf8(out).unwrap(), "coeff constant = 0\n");
    Ok(())
}
