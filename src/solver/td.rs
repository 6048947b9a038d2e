use std::io::Write;

use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use rand::RngCore;

use crate::error::{Error, Result};
use crate::mdp::{
    BasisSet, Info, LinearCombination, Model, StateCache, StateDistribution, StateFunction,
    StateSet,
};
use crate::policy::ValueFunctionPolicyFactory;
use crate::solver::online::{step_size, CoefficientTrace, ProgressReport, CACHE_SIZE};
use crate::solver::Solver;

#[derive(Debug, Clone)]
pub struct TdConfig {
    /// Discount factor
    pub alpha: f64,
    /// Eligibility trace decay
    pub lambda: f64,
    pub gamma_a: f64,
    /// Step size decay; `<= 0` keeps the step size at `gamma_a`
    pub gamma_b: f64,
    pub time_step_count: usize,
    pub time_report_count: usize,
}

impl Default for TdConfig {
    fn default() -> Self {
        Self {
            alpha: 0.95,
            lambda: 0.0,
            gamma_a: 0.01,
            gamma_b: 0.0,
            time_step_count: 100_000,
            time_report_count: 10_000,
        }
    }
}

/// Applies `z ← decay z + ψ; r += step z` once for the transition that just
/// happened and once for each self-transition before it.
pub(crate) fn replay_eligibility(
    z: &mut Array1<f64>,
    psi: ArrayView1<'_, f64>,
    decay: f64,
    step: f64,
    self_count: usize,
    weights: &mut [f64],
) {
    let mut r = ArrayViewMut1::from(weights);
    for _ in 0..=self_count {
        z.mapv_inplace(|v| v * decay);
        *z += &psi;
        r.scaled_add(step, &*z);
    }
}

/// TD(λ) along a single trajectory that follows the greedy policy of the
/// current estimate.
pub struct TdSolver<'a, M: Model> {
    model: &'a M,
    cost: &'a dyn StateFunction<M::State>,
    policy_factory: &'a dyn ValueFunctionPolicyFactory<M::State, M::Action>,
    basis: &'a dyn BasisSet<M::State>,
    rng: Box<dyn RngCore + 'a>,
    config: TdConfig,
    weights: Vec<f64>,
    eligibility: Array1<f64>,
    trace: Option<CoefficientTrace<'a>>,
    average_cost: Option<f64>,
}

impl<'a, M: Model> TdSolver<'a, M> {
    pub fn new(
        model: &'a M,
        cost: &'a dyn StateFunction<M::State>,
        policy_factory: &'a dyn ValueFunctionPolicyFactory<M::State, M::Action>,
        basis: &'a dyn BasisSet<M::State>,
        rng: Box<dyn RngCore + 'a>,
        config: TdConfig,
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
            eligibility: Array1::zeros(size),
            trace: None,
            average_cost: None,
        })
    }

    /// Write the weights every `every` steps; zero turns the trace off.
    pub fn set_debug(&mut self, out: Box<dyn Write + 'a>, every: usize) {
        self.trace = CoefficientTrace::new(out, every);
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn eligibility(&self) -> ArrayView1<'_, f64> {
        self.eligibility.view()
    }

    /// Mean cost seen along the last trajectory.
    pub fn average_cost(&self) -> Option<f64> {
        self.average_cost
    }

    fn greedy_action(&self, state: &M::State, info: &Info<M>) -> usize {
        let value = LinearCombination::borrowed(&self.weights, self.basis);
        let action = self.policy_factory.policy(&value).action(state, info);
        action
    }

    fn temporal_difference(
        &self,
        cost: f64,
        distribution: &StateDistribution<M::State>,
        state: &M::State,
    ) -> f64 {
        let value = LinearCombination::borrowed(&self.weights, self.basis);
        cost + self.config.alpha * distribution.expected_value_from(&value, state)
            - value.value(state)
    }
}

impl<'a, M: Model> Solver<M::State> for TdSolver<'a, M> {
    fn solve(&mut self) -> Result<bool> {
        let size = self.basis.size();
        self.weights = vec![0.0; size];
        self.eligibility = Array1::zeros(size);

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
                let d = self.temporal_difference(current_cost, distribution, &current);
                self.basis.evaluate(&current, &mut psi);
                let step = d * step_size(self.config.gamma_a, self.config.gamma_b, time as f64);
                replay_eligibility(
                    &mut self.eligibility,
                    ArrayView1::from(&psi[..]),
                    self.config.alpha * self.config.lambda,
                    step,
                    self_count,
                    &mut self.weights,
                );
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
