//! Bellman inequality generation shared by the LP solvers.

use std::io::Write;

use crate::error::{Error, Result};
use crate::math::optimization::{LpModel, LpSolution, RowId, VarId};
use crate::math::DiscreteDistribution;
use crate::mdp::{BasisSet, Model, StateDistribution, StateFunction, StateList};

/// Rows with a slack below this are reported as active.
pub const ACTIVE_TOLERANCE: f64 = 1e-3;

/// Everything a row builder needs to know about one `(state, action)` pair.
pub struct BellmanTerm<'t, S> {
    pub state_index: usize,
    pub action_index: usize,
    pub state: &'t S,
    pub cost: f64,
    /// `ψ(s)`
    pub psi: &'t [f64],
    /// `E[ψ(s') | s, a]`
    pub expected_next: &'t [f64],
}

impl<S> BellmanTerm<'_, S> {
    /// `ψ(s) - α E[ψ(s')]`.
    pub fn discounted_difference(&self, alpha: f64) -> Vec<f64> {
        self.psi
            .iter()
            .zip(self.expected_next.iter())
            .map(|(p, e)| p - alpha * e)
            .collect()
    }
}

/// Visits every `(state, action)` pair of `states` in order and hands the
/// pair to `build`, which adds one row and returns its handle. Handles come
/// back grouped by state.
pub fn generate<M, F>(
    states: &StateList<'_, M>,
    cost: &dyn StateFunction<M::State>,
    basis: &dyn BasisSet<M::State>,
    mut build: F,
) -> Result<Vec<Vec<RowId>>>
where
    M: Model,
    F: FnMut(&BellmanTerm<'_, M::State>) -> Result<RowId>,
{
    let mut psi = vec![0.0; basis.size()];
    let mut handles = Vec::with_capacity(states.state_count());
    for (s, state) in states.iter().enumerate() {
        let info = states.state_info_at(s)?;
        let state_cost = cost.value(state);
        basis.evaluate(state, &mut psi);

        let mut row_handles = Vec::with_capacity(info.action_count());
        for a in 0..info.action_count() {
            let expected_next = info.distribution(a).expected_basis_value(basis);
            let term = BellmanTerm {
                state_index: s,
                action_index: a,
                state,
                cost: state_cost,
                psi: &psi,
                expected_next: &expected_next,
            };
            row_handles.push(build(&term)?);
        }
        handles.push(row_handles);
    }
    Ok(handles)
}

/// `(index, probability)` of each successor in `states`.
///
/// # Errors
/// `Error::UnknownState` if a successor is not listed.
pub fn successor_indices<M: Model>(
    states: &StateList<'_, M>,
    distribution: &StateDistribution<M::State>,
) -> Result<Vec<(usize, f64)>> {
    distribution
        .next_states()
        .iter()
        .enumerate()
        .map(|(i, next)| {
            states
                .state_index(next)
                .map(|j| (j, distribution.probability(i)))
                .ok_or_else(|| Error::UnknownState(format!("{:?}", next)))
        })
        .collect()
}

/// Checks that `weights` is a distribution aligned with the state list.
pub fn check_weights(weights: &[f64], state_count: usize) -> Result<()> {
    if weights.len() != state_count {
        return Err(Error::LengthMismatch {
            expected: state_count,
            found: weights.len(),
        });
    }
    if !DiscreteDistribution::is_distribution(weights) {
        return Err(Error::InvalidDistribution(
            "state-relevance weights".to_string(),
        ));
    }
    Ok(())
}

/// `Σ_s w_s ψ(s)`.
pub fn weighted_basis<M: Model>(
    states: &StateList<'_, M>,
    weights: &[f64],
    basis: &dyn BasisSet<M::State>,
) -> Vec<f64> {
    let mut total = vec![0.0; basis.size()];
    let mut psi = vec![0.0; basis.size()];
    for (state, &w) in states.iter().zip(weights.iter()) {
        basis.evaluate(state, &mut psi);
        for (t, p) in total.iter_mut().zip(psi.iter()) {
            *t += w * p;
        }
    }
    total
}

/// One coefficient variable per basis function, bounded by the declared
/// coefficient range.
pub fn coefficient_vars<S>(model: &mut LpModel, basis: &dyn BasisSet<S>) -> Vec<VarId> {
    (0..basis.size())
        .map(|i| {
            model.add_var(
                format!("r_{}", basis.function_name(i)),
                basis.min_value(i),
                basis.max_value(i),
            )
        })
        .collect()
}

/// Largest violation of `V(s) - α E[V(s')] <= c(s)` over every
/// `(state, action)` pair, zero if none is violated.
pub fn max_bellman_violation<M: Model>(
    states: &StateList<'_, M>,
    cost: &dyn StateFunction<M::State>,
    value: &dyn StateFunction<M::State>,
    alpha: f64,
) -> Result<f64> {
    let mut worst: f64 = 0.0;
    for (s, state) in states.iter().enumerate() {
        let info = states.state_info_at(s)?;
        let v = value.value(state);
        let c = cost.value(state);
        for a in 0..info.action_count() {
            let next = info.distribution(a).expected_value_from(value, state);
            worst = worst.max(v - alpha * next - c);
        }
    }
    Ok(worst)
}

/// Writes `STATE: <s> ACTION: <a> <extra><slack>[ active]` for every row.
pub fn write_state_slacks<M, F>(
    out: &mut dyn Write,
    states: &StateList<'_, M>,
    handles: &[Vec<RowId>],
    solution: &LpSolution,
    mut extra: F,
) -> Result<()>
where
    M: Model,
    F: FnMut(usize, usize) -> String,
{
    for (s, rows) in handles.iter().enumerate() {
        let state = states.state_at(s);
        let info = states.state_info_at(s)?;
        for (a, &row) in rows.iter().enumerate() {
            let slack = solution.slack(row);
            write!(
                out,
                "STATE: {:?} ACTION: {:?} {}{}",
                state,
                info.action(a),
                extra(s, a),
                slack
            )?;
            if slack < ACTIVE_TOLERANCE {
                write!(out, " active")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Writes `coeff <name> = <value>` for every basis function.
pub fn write_coefficients<S>(
    out: &mut dyn Write,
    basis: &dyn BasisSet<S>,
    coefficients: &[f64],
) -> Result<()> {
    for (i, r) in coefficients.iter().enumerate() {
        writeln!(out, "coeff {} = {}", basis.function_name(i), r)?;
    }
    Ok(())
}
