use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::math::optimization::{LpModel, LpOracle, RowId, Sense, VarId};
use crate::mdp::{BasisSet, LinearCombination, Model, StateFunction, StateList};
use crate::solver::bellman::{self, write_coefficients, write_state_slacks};
use crate::solver::{LpSession, Solver};

/// The approximate linear program.
///
/// Discounted (`alpha < 1`):
///
/// ```text
/// maximize   Σ_s w_s ψ(s)·r
/// subject to ψ(s)·r - α E[ψ(s') | s, a]·r <= c(s)   for every (s, a)
/// ```
///
/// Average cost (`alpha >= 1`) drops the weights, adds a free `ρ`, maximizes
/// it and puts it on the left-hand side of every row with coefficient 1.
pub struct ApproximateLpSolver<'a, M: Model> {
    states: &'a StateList<'a, M>,
    basis: &'a dyn BasisSet<M::State>,
    session: LpSession<'a>,
    coefficients: Vec<VarId>,
    rho: Option<VarId>,
    rows: Vec<Vec<RowId>>,
}

impl<'a, M: Model> ApproximateLpSolver<'a, M> {
    /// Builds the program. `weights` is ignored in the average cost case.
    ///
    /// # Errors
    /// `Error::InvalidDistribution` or `Error::LengthMismatch` if a
    /// discounted program gets weights that are not a distribution over the
    /// state list.
    pub fn new(
        oracle: &'a dyn LpOracle,
        states: &'a StateList<'a, M>,
        cost: &dyn StateFunction<M::State>,
        weights: &[f64],
        basis: &'a dyn BasisSet<M::State>,
        alpha: f64,
    ) -> Result<Self> {
        let average_cost = alpha >= 1.0;
        let mut model = LpModel::new();
        let coefficients = bellman::coefficient_vars(&mut model, basis);

        let rho = if average_cost {
            let rho = model.add_free_var("rho");
            model.set_objective(Sense::Maximize, vec![(rho, 1.0)]);
            Some(rho)
        } else {
            bellman::check_weights(weights, states.state_count())?;
            let objective = bellman::weighted_basis(states, weights, basis);
            model.set_objective(
                Sense::Maximize,
                coefficients.iter().copied().zip(objective).collect(),
            );
            None
        };
        let discount = if average_cost { 1.0 } else { alpha };

        let rows = bellman::generate(states, cost, basis, |term| {
            let mut terms: Vec<(VarId, f64)> = coefficients
                .iter()
                .copied()
                .zip(term.discounted_difference(discount))
                .collect();
            if let Some(rho) = rho {
                terms.push((rho, 1.0));
            }
            Ok(model.add_le(terms, term.cost))
        })?;
        basis.add_constraints(&mut model, &coefficients)?;

        log::debug!(
            "approximate LP with {} variables and {} rows",
            model.variables().len(),
            model.rows().len()
        );
        Ok(Self {
            states,
            basis,
            session: LpSession::new(model, oracle),
            coefficients,
            rho,
            rows,
        })
    }

    /// The fitted coefficient vector `r`.
    pub fn coefficients(&self) -> Result<Vec<f64>> {
        Ok(self.session.solution()?.values_of(&self.coefficients))
    }

    /// Average cost estimate, `None` for a discounted program.
    pub fn rho(&self) -> Result<Option<f64>> {
        let solution = self.session.solution()?;
        Ok(self.rho.map(|rho| solution.value(rho)))
    }

    pub fn objective_value(&self) -> Result<f64> {
        Ok(self.session.solution()?.objective_value)
    }

    pub fn model(&self) -> &LpModel {
        self.session.model()
    }
}

impl<'a, M: Model> Solver<M::State> for ApproximateLpSolver<'a, M> {
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
        if let Some(rho) = self.rho()? {
            writeln!(out, "rho = {}", rho)?;
        }
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

impl<M: Model> std::fmt::Debug for ApproximateLpSolver<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApproximateLpSolver")
            .field("states", &self.states.state_count())
            .field("basis", &self.basis.size())
            .field("average_cost", &self.rho.is_some())
            .finish()
    }
}
