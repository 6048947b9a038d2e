use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::math::optimization::{LpModel, LpOracle, RowId, Sense, VarId};
use crate::mdp::{BasisSet, LinearCombination, Model, StateFunction, StateList};
use crate::solver::bellman::{self, write_coefficients, write_state_slacks};
use crate::solver::{LpSession, Solver};

#[derive(Debug, Clone)]
pub struct NonConvexConfig {
    /// Big-M constant switching a Bellman row off when its indicator is zero
    pub big_m: f64,
}

impl Default for NonConvexConfig {
    fn default() -> Self {
        Self { big_m: 1e6 }
    }
}

/// Mixed-binary program asking each state to satisfy the Bellman
/// inequality in the reverse direction for at least one action:
///
/// ```text
/// minimize   Σ_s w_s ψ(s)·r
/// subject to (α E[ψ(s')] - ψ(s))·r + M z_sa <= M - c(s)   for every (s, a)
///            Σ_a z_sa >= 1                                for every s
///            z_sa binary
/// ```
pub struct NonConvexLpSolver<'a, M: Model> {
    states: &'a StateList<'a, M>,
    basis: &'a dyn BasisSet<M::State>,
    session: LpSession<'a>,
    coefficients: Vec<VarId>,
    indicators: Vec<Vec<VarId>>,
    rows: Vec<Vec<RowId>>,
}

impl<'a, M: Model> NonConvexLpSolver<'a, M> {
    pub fn new(
        oracle: &'a dyn LpOracle,
        states: &'a StateList<'a, M>,
        cost: &dyn StateFunction<M::State>,
        weights: &[f64],
        basis: &'a dyn BasisSet<M::State>,
        alpha: f64,
        config: NonConvexConfig,
    ) -> Result<Self> {
        if alpha >= 1.0 {
            return Err(Error::InvalidDiscount {
                alpha,
                reason: "the non-convex program supports discounted problems only",
            });
        }
        bellman::check_weights(weights, states.state_count())?;

        let mut model = LpModel::new();
        let coefficients = bellman::coefficient_vars(&mut model, basis);
        let objective = bellman::weighted_basis(states, weights, basis);
        model.set_objective(
            Sense::Minimize,
            coefficients.iter().copied().zip(objective).collect(),
        );

        let big_m = config.big_m;
        let mut indicators: Vec<Vec<VarId>> = vec![Vec::new(); states.state_count()];
        let rows = bellman::generate(states, cost, basis, |term| {
            let z = model.add_binary_var(format!("z_{}_{}", term.state_index, term.action_index));
            indicators[term.state_index].push(z);
            let mut terms: Vec<(VarId, f64)> = coefficients
                .iter()
                .copied()
                .zip(term.discounted_difference(alpha))
                .map(|(var, d)| (var, -d))
                .collect();
            terms.push((z, big_m));
            Ok(model.add_le(terms, big_m - term.cost))
        })?;
        for z in &indicators {
            model.add_ge(z.iter().map(|&var| (var, 1.0)).collect(), 1.0);
        }
        basis.add_constraints(&mut model, &coefficients)?;

        log::debug!(
            "non-convex program with {} variables and {} rows",
            model.variables().len(),
            model.rows().len()
        );
        Ok(Self {
            states,
            basis,
            session: LpSession::new(model, oracle),
            coefficients,
            indicators,
            rows,
        })
    }

    pub fn coefficients(&self) -> Result<Vec<f64>> {
        Ok(self.session.solution()?.values_of(&self.coefficients))
    }

    /// Indicator values `z_sa`, grouped by state.
    pub fn indicators(&self) -> Result<Vec<Vec<f64>>> {
        let solution = self.session.solution()?;
        Ok(self
            .indicators
            .iter()
            .map(|z| solution.values_of(z))
            .collect())
    }

    pub fn objective_value(&self) -> Result<f64> {
        Ok(self.session.solution()?.objective_value)
    }

    pub fn model(&self) -> &LpModel {
        self.session.model()
    }
}

impl<'a, M: Model> Solver<M::State> for NonConvexLpSolver<'a, M> {
    fn solve(&mut self) -> Result<bool> {
        self.session.solve()
    }

    fn value_estimate(&self) -> Result<Box<dyn StateFunction<M::State> + '_>> {
        Ok(Box::new(LinearCombination::new(
            self.coefficients()?,
            self.basis,
        )))
    }

    fn dump_info(&self, out: &mut dyn Write) -> Result<()> {
        write_coefficients(out, self.basis, &self.coefficients()?)
    }

    fn dump_state_info(&self, out: &mut dyn Write) -> Result<()> {
        let solution = self.session.solution()?;
        write_state_slacks(out, self.states, &self.rows, solution, |s, a| {
            format!("{} ", solution.value(self.indicators[s][a]))
        })
    }

    fn export_model(&self, path: &Path) -> Result<()> {
        self.session.export(path)
    }
}
