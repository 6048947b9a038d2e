//! Tabular linear programs: the optimal value function, and the value of a
//! fixed policy.

use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::math::optimization::{LpModel, LpOracle, RowId, Sense, VarId};
use crate::mdp::{Model, StateFunction, StateList, StateValues};
use crate::policy::Policy;
use crate::solver::bellman::{successor_indices, ACTIVE_TOLERANCE};
use crate::solver::{LpSession, Solver};

/// Terms of `J_s - discount Σ p J_s' (+ ρ)`, with repeated states merged.
fn bellman_terms(
    j: &[VarId],
    s: usize,
    successors: &[(usize, f64)],
    discount: f64,
    rho: Option<VarId>,
) -> Vec<(VarId, f64)> {
    let mut terms: Vec<(VarId, f64)> = vec![(j[s], 1.0)];
    for &(next, p) in successors {
        match terms.iter_mut().find(|(var, _)| *var == j[next]) {
            Some((_, a)) => *a -= discount * p,
            None => terms.push((j[next], -discount * p)),
        }
    }
    if let Some(rho) = rho {
        terms.push((rho, 1.0));
    }
    terms
}

/// Free `J_s` per state, plus a free `ρ` for average cost problems.
fn value_vars(
    model: &mut LpModel,
    state_count: usize,
    average_cost: bool,
) -> (Vec<VarId>, Option<VarId>) {
    let j = (0..state_count)
        .map(|s| model.add_free_var(format!("J_{}", s)))
        .collect();
    let rho = average_cost.then(|| model.add_free_var("rho"));
    (j, rho)
}

/// Exact linear program over every state and action:
///
/// ```text
/// maximize   (1/N) Σ_s J_s
/// subject to J_s - α Σ_s' p(s'|s, a) J_s' <= c(s)   for every (s, a)
/// ```
///
/// With `alpha >= 1` the objective becomes `max ρ` and every row gets `+ ρ`.
pub struct OptimalPolicySolver<'a, M: Model> {
    states: &'a StateList<'a, M>,
    session: LpSession<'a>,
    j: Vec<VarId>,
    rho: Option<VarId>,
    rows: Vec<Vec<RowId>>,
}

impl<'a, M: Model> OptimalPolicySolver<'a, M> {
    /// # Errors
    /// `Error::UnknownState` if a successor state is missing from `states`.
    pub fn new(
        oracle: &'a dyn LpOracle,
        states: &'a StateList<'a, M>,
        cost: &dyn StateFunction<M::State>,
        alpha: f64,
    ) -> Result<Self> {
        let average_cost = alpha >= 1.0;
        let discount = if average_cost { 1.0 } else { alpha };
        let state_count = states.state_count();

        let mut model = LpModel::new();
        let (j, rho) = value_vars(&mut model, state_count, average_cost);
        match rho {
            Some(rho) => model.set_objective(Sense::Maximize, vec![(rho, 1.0)]),
            None => {
                let weight = 1.0 / state_count.max(1) as f64;
                model.set_objective(
                    Sense::Maximize,
                    j.iter().map(|&v| (v, weight)).collect(),
                );
            }
        }

        let mut rows = Vec::with_capacity(state_count);
        for (s, state) in states.iter().enumerate() {
            let info = states.state_info_at(s)?;
            let c = cost.value(state);
            let mut state_rows = Vec::with_capacity(info.action_count());
            for a in 0..info.action_count() {
                let successors = successor_indices(states, info.distribution(a))?;
                let terms = bellman_terms(&j, s, &successors, discount, rho);
                state_rows.push(model.add_le(terms, c));
            }
            rows.push(state_rows);
        }

        Ok(Self {
            states,
            session: LpSession::new(model, oracle),
            j,
            rho,
            rows,
        })
    }

    /// `J_s` in state list order.
    pub fn values(&self) -> Result<Vec<f64>> {
        Ok(self.session.solution()?.values_of(&self.j))
    }

    pub fn rho(&self) -> Result<Option<f64>> {
        let solution = self.session.solution()?;
        Ok(self.rho.map(|rho| solution.value(rho)))
    }

    pub fn model(&self) -> &LpModel {
        self.session.model()
    }
}

impl<'a, M: Model> Solver<M::State> for OptimalPolicySolver<'a, M> {
    fn solve(&mut self) -> Result<bool> {
        self.session.solve()
    }

    fn value_estimate(&self) -> Result<Box<dyn StateFunction<M::State> + '_>> {
        Ok(Box::new(StateValues::new(self.states, self.values()?)))
    }

    fn dump_info(&self, out: &mut dyn Write) -> Result<()> {
        let solution = self.session.solution()?;
        if let Some(rho) = self.rho {
            writeln!(out, "rho = {}", solution.value(rho))?;
        }
        for (s, state) in self.states.iter().enumerate() {
            let info = self.states.state_info_at(s)?;
            writeln!(out, "STATE: {:?} {}", state, solution.value(self.j[s]))?;
            for (a, &row) in self.rows[s].iter().enumerate() {
                let slack = solution.slack(row);
                write!(out, "ACTION: {:?} {}", info.action(a), slack)?;
                if slack < ACTIVE_TOLERANCE {
                    write!(out, " active")?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }

    fn dump_state_info(&self, out: &mut dyn Write) -> Result<()> {
        self.dump_info(out)
    }

    fn export_model(&self, path: &Path) -> Result<()> {
        self.session.export(path)
    }
}

/// Exact value of a fixed policy: one row per state for the action the
/// policy picks, objective `max J_0` (or `max ρ` with `alpha >= 1`).
pub struct ValueFunctionCalculator<'a, M: Model> {
    states: &'a StateList<'a, M>,
    session: LpSession<'a>,
    j: Vec<VarId>,
    rho: Option<VarId>,
}

impl<'a, M: Model> ValueFunctionCalculator<'a, M> {
    pub fn new(
        oracle: &'a dyn LpOracle,
        states: &'a StateList<'a, M>,
        cost: &dyn StateFunction<M::State>,
        policy: &dyn Policy<M::State, M::Action>,
        alpha: f64,
    ) -> Result<Self> {
        if states.is_empty() {
            return Err(Error::LengthMismatch {
                expected: 1,
                found: 0,
            });
        }
        let average_cost = alpha >= 1.0;
        let discount = if average_cost { 1.0 } else { alpha };

        let mut model = LpModel::new();
        let (j, rho) = value_vars(&mut model, states.state_count(), average_cost);
        model.set_objective(Sense::Maximize, vec![(rho.unwrap_or(j[0]), 1.0)]);

        for (s, state) in states.iter().enumerate() {
            let info = states.state_info_at(s)?;
            let a = policy.action(state, &info);
            let successors = successor_indices(states, info.distribution(a))?;
            model.add_le(
                bellman_terms(&j, s, &successors, discount, rho),
                cost.value(state),
            );
        }

        Ok(Self {
            states,
            session: LpSession::new(model, oracle),
            j,
            rho,
        })
    }

    pub fn solve(&mut self) -> Result<bool> {
        self.session.solve()
    }

    /// `J` at `base`, or `ρ` for an average cost problem.
    pub fn value(&self, base: &M::State) -> Result<f64> {
        let solution = self.session.solution()?;
        if let Some(rho) = self.rho {
            return Ok(solution.value(rho));
        }
        let s = self
            .states
            .state_index(base)
            .ok_or_else(|| Error::UnknownState(format!("{:?}", base)))?;
        Ok(solution.value(self.j[s]))
    }

    pub fn value_function(&self) -> Result<StateValues<'a, M>> {
        Ok(StateValues::new(
            self.states,
            self.session.solution()?.values_of(&self.j),
        ))
    }
}
