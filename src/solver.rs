//! Value function fitting engines.
//!
//! The LP based solvers ([`ApproximateLpSolver`], [`SlackLpSolver`],
//! [`NonConvexLpSolver`], [`OptimalPolicySolver`], [`ValueFunctionCalculator`])
//! generate Bellman inequalities over a finite state list and hand the
//! resulting program to an [`LpOracle`]. The online solvers ([`TdSolver`],
//! [`KalmanFilterSolver`]) learn basis weights from a single simulated
//! trajectory.

pub mod alp;
pub mod bellman;
pub mod exact;
pub mod kalman;
pub mod nonconvex;
pub mod online;
pub mod slack;
pub mod td;

#[cfg(test)]
mod tests;

use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::math::optimization::{LpModel, LpOracle, LpSolution};
use crate::mdp::StateFunction;

pub use alp::ApproximateLpSolver;
pub use exact::{OptimalPolicySolver, ValueFunctionCalculator};
pub use kalman::{KalmanConfig, KalmanFilterSolver};
pub use nonconvex::{NonConvexConfig, NonConvexLpSolver};
pub use slack::SlackLpSolver;
pub use td::{TdConfig, TdSolver};

/// Common surface of every solver.
pub trait Solver<S> {
    /// Runs the solver. `Ok(false)` means the optimization did not reach an
    /// optimal solution.
    fn solve(&mut self) -> Result<bool>;

    /// The fitted value function.
    ///
    /// # Errors
    /// `Error::NotSolved` unless a previous `solve()` succeeded.
    fn value_estimate(&self) -> Result<Box<dyn StateFunction<S> + '_>>;

    /// Writes the fitted coefficients.
    fn dump_info(&self, out: &mut dyn Write) -> Result<()>;

    /// Writes per-state diagnostics. Solvers without any only write nothing.
    fn dump_state_info(&self, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    /// Writes the underlying mathematical program.
    fn export_model(&self, _path: &Path) -> Result<()> {
        Err(Error::Unsupported("model export"))
    }
}

/// A mathematical program and the answer of the oracle that solved it.
pub(crate) struct LpSession<'a> {
    model: LpModel,
    oracle: &'a dyn LpOracle,
    solution: Option<LpSolution>,
}

impl<'a> LpSession<'a> {
    pub(crate) fn new(model: LpModel, oracle: &'a dyn LpOracle) -> Self {
        Self {
            model,
            oracle,
            solution: None,
        }
    }

    pub(crate) fn model(&self) -> &LpModel {
        &self.model
    }

    pub(crate) fn solve(&mut self) -> Result<bool> {
        let solution = self.oracle.solve(&self.model)?;
        let optimal = solution.is_optimal();
        if optimal {
            log::debug!("objective = {}", solution.objective_value);
        } else {
            log::debug!("optimization ended with status {:?}", solution.status);
        }
        self.solution = Some(solution);
        Ok(optimal)
    }

    /// The optimal solution, if the last `solve()` found one.
    pub(crate) fn solution(&self) -> Result<&LpSolution> {
        match &self.solution {
            Some(solution) if solution.is_optimal() => Ok(solution),
            _ => Err(Error::NotSolved),
        }
    }

    pub(crate) fn export(&self, path: &Path) -> Result<()> {
        self.model.export(path)
    }
}
