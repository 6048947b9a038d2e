use std::io::Write;

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, Axis};
use rand::RngCore;

use crate::error::{Error, Result};
use crate::mdp::{BasisSet, Info, LinearCombination, Model, StateCache, StateFunction, StateSet};
use crate::policy::ValueFunctionPolicyFactory;
use crate::solver::online::{step_size, CoefficientTrace, ProgressReport, CACHE_SIZE};
use crate::solver::Solver;

#[derive(Debug, Clone)]
pub struct KalmanConfig {
    /// Discount factor
    pub alpha: f64,
    pub gamma_a: f64,
    /// Gain decay; `<= 0` keeps the gain at `gamma_a`
    pub gamma_b: f64,
    pub time_step_count: usize,
    pub time_report_count: usize,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            alpha: 0.95,
            gamma_a: 0.1,
            gamma_b: 0.0,
            time_step_count: 100_000,
            time_report_count: 10_000,
        }
    }
}

/// Rank-one update of the scaled inverse feature covariance `H` at time
/// `t`, returning `Hψ` for the updated `H`.
pub(crate) fn update_information(
    h: &mut Array2<f64>,
    psi: ArrayView1<'_, f64>,
    t: f64,
) -> Result<Array1<f64>> {
    let h_psi = h.dot(&psi);
    let psi_h_psi = psi.dot(&h_psi);
    let denominator = t - 1.0 + psi_h_psi;
    // H stays positive definite only while the denominator is positive
    if !denominator.is_finite() || denominator <= f64::EPSILON {
        return Err(Error::Numerical(format!(
            "Kalman gain denominator {} at t = {}",
            denominator, t
        )));
    }

    let x1 = t / (t - 1.0);
    let x2 = x1 / denominator;
    let outer = h_psi
        .view()
        .insert_axis(Axis(1))
        .dot(&h_psi.view().insert_axis(Axis(0)));
    h.mapv_inplace(|v| v * x1);
    h.scaled_add(-x2, &outer);
    Ok(h.dot(&psi))
}

/// Least-squares TD with a recursively maintained inverse covariance, in
/// the manner of a Kalman filter.
///
/// Self-transitions neither touch `H` nor the coefficients; the action is
/// reused until the trajectory leaves the state.
pub struct KalmanFilterSolver<'a, M: Model> {
    model: &'a M,
    cost: &'a dyn StateFunction<M::State>,
    policy_factory: &'a dyn ValueFunctionPolicyFactory<M::State, M::Action>,
    basis: &'a dyn BasisSet<M::State>,
    rng: Box<dyn RngCore + 'a>,
    config: KalmanConfig,
    weights: Vec<f64>,
    information: Array2<f64>,
    trace: Option<CoefficientTrace<'a>>,
    average_cost: Option<f64>,
}

impl<'a, M: Model> KalmanFilterSolver<'a, M> {
    pub fn new(
        model: &'a M,
        cost: &'a dyn StateFunction<M::State>,
        policy_factory: &'a dyn ValueFunctionPolicyFactory<M::State, M::Action>,
        basis: &'a dyn BasisSet<M::State>,
        rng: Box<dyn RngCore + 'a>,
        config: KalmanConfig,
    ) -> Result<Self> {
        if !config.alpha.is_finite() || config.alpha < 0.0 {
            return Err(Error::InvalidDiscount {
                alpha: config.alpha,
                reason: "discount must be finite and non-negative",
            });
        }
        let size = basis.size();
        Ok(Self {
            model,
            cost,
            policy_factory,
            basis,
            rng,
            config,
            weights: vec![0.0; size],
            information: Array2::eye(size),
            trace: None,
            average_cost: None,
        })
    }

    pub fn set_debug(&mut self, out: Box<dyn Write + 'a>, every: usize) {
        self.trace = CoefficientTrace::new(out, every);
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The matrix `H`.
    pub fn information(&self) -> &Array2<f64> {
        &self.information
    }

    pub fn average_cost(&self) -> Option<f64> {
        self.average_cost
    }

    fn greedy_action(&self, state: &M::State, info: &Info<M>) -> usize {
        let value = LinearCombination::borrowed(&self.weights, self.basis);
        let action = self.policy_factory.policy(&value).action(state, info);
        action
    }
}

impl<'a, M: Model> Solver<M::State> for KalmanFilterSolver<'a, M> {
    fn solve(&mut self) -> Result<bool> {
        let size = self.basis.size();
        self.weights = vec![0.0; size];
        self.information = Array2::eye(size);

        let cache = StateCache::new(self.model, CACHE_SIZE);
        let mut progress = ProgressReport::new(self.config.time_report_count);
        let mut psi = vec![0.0; size];
        let mut current = self.model.base_state();
        let mut self_count = 0;
        let mut last_action = 0;
        let mut last_cost = 0.0;

        for time in 0..self.config.time_step_count {
            let current_cost = if self_count > 0 {
                last_cost
            } else {
                self.cost.value(&current)
            };
            progress.add_cost(current_cost);

            let info = cache.state_info(&current)?;
            let action = if self_count > 0 {
                last_action
            } else {
                self.greedy_action(&current, &info)
            };

            let distribution = info.distribution(action);
            let next = distribution.sample(self.rng.as_mut()).clone();

            if next == current {
                self_count += 1;
            } else {
                let d = {
                    let value = LinearCombination::borrowed(&self.weights, self.basis);
                    current_cost
                        + self.config.alpha * distribution.expected_value_from(&value, &current)
                        - value.value(&current)
                };
                self.basis.evaluate(&current, &mut psi);

                let t = (time + 2) as f64;
                let h_psi =
                    update_information(&mut self.information, ArrayView1::from(&psi[..]), t)?;
                let gain = d * step_size(self.config.gamma_a, self.config.gamma_b, t);
                ArrayViewMut1::from(&mut self.weights[..]).scaled_add(gain, &h_psi);
                self.basis.clip(&mut self.weights);

                current = next;
                self_count = 0;
            }

            progress.report(time);
            if let Some(trace) = self.trace.as_mut() {
                trace.record(time, &self.weights)?;
            }

            last_action = action;
            last_cost = current_cost;
        }

        if let Some(trace) = self.trace.as_mut() {
            trace.flush()?;
        }
        self.average_cost = progress.average_cost();
        Ok(true)
    }

    fn value_estimate(&self) -> Result<Box<dyn StateFunction<M::State> + '_>> {
        Ok(Box::new(LinearCombination::borrowed(
            &self.weights,
            self.basis,
        )))
    }

    fn dump_info(&self, out: &mut dyn Write) -> Result<()> {
        crate::solver::bellman::write_coefficients(out, self.basis, &self.weights)
    }

    fn export_model(&self, _path: &std::path::Path) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::testing::{ConstantBasis, CycleModel, StayOrSwitch, TabularBasis};
    use crate::policy::GreedyPolicyFactory;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn config(steps: usize) -> KalmanConfig {
        KalmanConfig {
            alpha: 0.9,
            gamma_a: 0.5,
            gamma_b: 0.0,
            time_step_count: steps,
            time_report_count: 100,
        }
    }

    #[test]
    fn test_information_update() -> Result<()> {
        let mut h = Array2::eye(2);
        let psi = [1.0, 0.0];
        let h_psi = update_information(&mut h, ArrayView1::from(&psi[..]), 2.0)?;
        // x1 = 2, x2 = 1: H = 2I - e1 e1'
        assert_abs_diff_eq!(h[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h[[1, 1]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h[[0, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h_psi[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h_psi[1], 0.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_vanishing_denominator() {
        let mut h = Array2::zeros((1, 1));
        let psi = [1.0];
        let result = update_information(&mut h, ArrayView1::from(&psi[..]), 1.0);
        assert!(matches!(result, Err(Error::Numerical(_))));
    }

    #[test]
    fn test_negative_denominator() {
        // t - 1 + ψ'Hψ = 1 - 1.5
        let mut h = Array2::from_elem((1, 1), -1.5);
        let psi = [1.0];
        let result = update_information(&mut h, ArrayView1::from(&psi[..]), 2.0);
        assert!(matches!(result, Err(Error::Numerical(_))));
        assert_eq!(h[[0, 0]], -1.5);
    }

    #[test]
    fn test_converges_on_swap_chain() -> Result<()> {
        let model = CycleModel::new(2);
        let basis = ConstantBasis::new(-100.0, 100.0);
        let cost = |_: &usize| 1.0;
        let mut solver = KalmanFilterSolver::new(
            &model,
            &cost,
            &GreedyPolicyFactory,
            &basis,
            Box::new(ChaCha20Rng::seed_from_u64(0)),
            config(1000),
        )?;
        assert!(solver.solve()?);
        assert_abs_diff_eq!(solver.weights()[0], 10.0, epsilon = 1e-3);
        assert_abs_diff_eq!(solver.information()[[0, 0]], 1.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_self_transitions_skip_updates() -> Result<()> {
        let model = StayOrSwitch {
            switch_probability: 1.0,
        };
        let basis = TabularBasis::new(2, -100.0, 100.0);
        let cost = |_: &usize| 1.0;
        let mut solver = KalmanFilterSolver::new(
            &model,
            &cost,
            &GreedyPolicyFactory,
            &basis,
            Box::new(ChaCha20Rng::seed_from_u64(0)),
            config(50),
        )?;
        solver.solve()?;
        assert_eq!(solver.weights(), &[0.0, 0.0]);
        assert_eq!(solver.information(), &Array2::<f64>::eye(2));
        Ok(())
    }

    #[test]
    fn test_weights_stay_in_range() -> Result<()> {
        let model = CycleModel::new(2);
        let basis = ConstantBasis::new(-1.0, 2.0);
        let cost = |_: &usize| 1.0;
        let mut solver = KalmanFilterSolver::new(
            &model,
            &cost,
            &GreedyPolicyFactory,
            &basis,
            Box::new(ChaCha20Rng::seed_from_u64(0)),
            config(200),
        )?;
        assert!(solver.solve()?);
        assert_eq!(solver.weights(), &[2.0]);
        Ok(())
    }

    #[test]
    fn test_undiscounted_run_is_clipped() -> Result<()> {
        let model = CycleModel::new(2);
        let basis = ConstantBasis::new(-1.0, 2.0);
        let cost = |_: &usize| 1.0;
        let mut kalman = config(100);
        kalman.alpha = 1.0;
        let mut solver = KalmanFilterSolver::new(
            &model,
            &cost,
            &GreedyPolicyFactory,
            &basis,
            Box::new(ChaCha20Rng::seed_from_u64(0)),
            kalman,
        )?;
        assert!(solver.solve()?);
        assert_eq!(solver.weights(), &[2.0]);
        assert_eq!(solver.average_cost(), Some(1.0));
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_discount() {
        let model = CycleModel::new(2);
        let basis = ConstantBasis::new(-1.0, 1.0);
        let cost = |_: &usize| 1.0;
        for alpha in [f64::NAN, f64::INFINITY, -0.5] {
            let mut kalman = config(1);
            kalman.alpha = alpha;
            let result = KalmanFilterSolver::new(
                &model,
                &cost,
                &GreedyPolicyFactory,
                &basis,
                Box::new(ChaCha20Rng::seed_from_u64(0)),
                kalman,
            );
            assert!(matches!(result, Err(Error::InvalidDiscount { .. })));
        }
    }
}
