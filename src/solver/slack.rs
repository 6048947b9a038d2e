use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::math::optimization::{LpModel, LpOracle, RowId, Sense, VarId};
use crate::mdp::{BasisSet, LinearCombination, Model, StateFunction, StateList};
use crate::solver::bellman::{self, write_coefficients, write_state_slacks};
use crate::solver::{LpSession, Solver};

/// Smoothed ALP with slack variables.
///
/// ```text
/// minimize   s1 + η s2
/// subject to (ψ(s) - α E[ψ(s')] - (1 - α) w·ψ)·r - s1 - slack(s) s2 <= c(s)
///            s1 free, s2 >= 0
/// ```
///
/// where `w·ψ = Σ_s w_s ψ(s)`. Discounted problems only.
pub struct SlackLpSolver<'a, M: Model> {
    states: &'a StateList<'a, M>,
    basis: &'a dyn BasisSet<M::State>,
    session: LpSession<'a>,
    coefficients: Vec<VarId>,
    s1: VarId,
    s2: VarId,
    rows: Vec<Vec<RowId>>,
}

impl<'a, M: Model> SlackLpSolver<'a, M> {
    /// # Errors
    /// `Error::InvalidDiscount` if `alpha >= 1`, and the weight validation
    /// errors of [`ApproximateLpSolver`](super::ApproximateLpSolver).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        oracle: &'a dyn LpOracle,
        states: &'a StateList<'a, M>,
        cost: &dyn StateFunction<M::State>,
        weights: &[f64],
        basis: &'a dyn BasisSet<M::State>,
        slack: &dyn StateFunction<M::State>,
        alpha: f64,
        slack_cost: f64,
    ) -> Result<Self> {
        if alpha >= 1.0 {
            return Err(Error::InvalidDiscount {
                alpha,
                reason: "the slack program supports discounted problems only",
            });
        }
        bellman::check_weights(weights, states.state_count())?;

        let mut model = LpModel::new();
        let coefficients = bellman::coefficient_vars(&mut model, basis);
        let s1 = model.add_free_var("s1");
        let s2 = model.add_var("s2", 0.0, f64::INFINITY);
        model.set_objective(Sense::Minimize, vec![(s1, 1.0), (s2, slack_cost)]);

        let weighted = bellman::weighted_basis(states, weights, basis);
        let rows = bellman::generate(states, cost, basis, |term| {
            let mut terms: Vec<(VarId, f64)> = term
                .discounted_difference(alpha)
                .iter()
                .zip(weighted.iter())
                .map(|(d, w)| d - (1.0 - alpha) * w)
                .zip(coefficients.iter().copied())
                .map(|(c, var)| (var, c))
                .collect();
            terms.push((s1, -1.0));
            terms.push((s2, -slack.value(term.state)));
            Ok(model.add_le(terms, term.cost))
        })?;
        basis.add_constraints(&mut model, &coefficients)?;

        log::debug!(
            "slack LP with {} variables and {} rows",
            model.variables().len(),
            model.rows().len()
        );
        Ok(Self {
            states,
            basis,
            session: LpSession::new(model, oracle),
            coefficients,
            s1,
            s2,
            rows,
        })
    }

    pub fn coefficients(&self) -> Result<Vec<f64>> {
        Ok(self.session.solution()?.values_of(&self.coefficients))
    }

    /// Values of `(s1, s2)`.
    pub fn slack_variables(&self) -> Result<(f64, f64)> {
        let solution = self.session.solution()?;
        Ok((solution.value(self.s1), solution.value(self.s2)))
    }

    pub fn objective_value(&self) -> Result<f64> {
        Ok(self.session.solution()?.objective_value)
    }

    pub fn model(&self) -> &LpModel {
        self.session.model()
    }
}

impl<'a, M: Model> Solver<M::State> for SlackLpSolver<'a, M> {
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
        let (s1, s2) = self.slack_variables()?;
        writeln!(out, "s1 = {}", s1)?;
        writeln!(out, "s2 = {}", s2)?;
        write_coefficients(out, self.basis, &self.coefficients()?)
    }

    fn dump_state_info(&self, out: &mut dyn Write) -> Result<()> {
        let solution = self.session.solution()?;
        write_state_slacks(out, self.states, &self.rows, solution, |_, _| String::new())
    }

    fn export_model(&self, path: &Path) -> Result<()> {
        self.session.export(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::optimization::SimplexOracle;
    use crate::mdp::testing::{CycleModel, TabularBasis};
    use approx::assert_abs_diff_eq;

    fn build<'a>(
        oracle: &'a SimplexOracle,
        states: &'a StateList<'a, CycleModel>,
        basis: &'a TabularBasis,
        alpha: f64,
    ) -> Result<SlackLpSolver<'a, CycleModel>> {
        let cost = |_: &usize| 1.0;
        let slack = |_: &usize| 1.0;
        SlackLpSolver::new(
            oracle,
            states,
            &cost,
            &[0.5, 0.5],
            basis,
            &slack,
            alpha,
            10.0,
        )
    }

    #[test]
    fn test_swap_chain() -> Result<()> {
        let model = CycleModel::new(2);
        let states = StateList::enumerate(&model)?;
        let basis = TabularBasis::new(2, -100.0, 100.0);
        let oracle = SimplexOracle::default();

        let mut solver = build(&oracle, &states, &basis, 0.9)?;
        assert!(solver.solve()?);
        let (s1, s2) = solver.slack_variables()?;
        assert_abs_diff_eq!(s1, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(s2, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solver.objective_value()?, -1.0, epsilon = 1e-6);

        let r = solver.coefficients()?;
        assert_abs_diff_eq!(r[0], r[1], epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_rejects_average_cost() {
        let model = CycleModel::new(2);
        let states = StateList::enumerate(&model).unwrap();
        let basis = TabularBasis::new(2, -100.0, 100.0);
        let oracle = SimplexOracle::default();
        assert!(matches!(
            build(&oracle, &states, &basis, 1.0),
            Err(Error::InvalidDiscount { .. })
        ));
    }

    #[test]
    fn test_dump_lists_slack_variables() -> Result<()> {
        let model = CycleModel::new(2);
        let states = StateList::enumerate(&model)?;
        let basis = TabularBasis::new(2, -100.0, 100.0);
        let oracle = SimplexOracle::default();
        let mut solver = build(&oracle, &states, &basis, 0.9)?;
        solver.solve()?;

        let mut out = Vec::new();
        solver.dump_info(&mut out)?;
        let text = String::from_utf8(out).unwrap();
        let names: Vec<&str> = text
            .lines()
            .map(|line| line.split(" = ").next().unwrap_or(""))
            .collect();
        assert_eq!(names, vec!["s1", "s2", "coeff r0", "coeff r1"]);
        Ok(())
    }
}
