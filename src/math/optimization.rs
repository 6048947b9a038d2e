pub mod model;
pub mod oracle;
pub mod simplex;

use num_traits::Float;
use std::fmt::Debug;

pub use model::{LpModel, LpSolution, RowId, RowKind, Sense, VarId, VarKind};
pub use oracle::{LpOracle, SimplexOracle};
pub use simplex::minimize as simplex_minimize;
pub use simplex::LinearProgram;

/// Configuration options for the simplex based solvers.
#[derive(Debug, Clone)]
pub struct OptimizationConfig<T>
where
    T: Float + Debug,
{
    /// Maximum number of pivots (per phase)
    pub max_iterations: usize,
    /// Feasibility tolerance used to decide whether phase one succeeded
    pub tolerance: T,
}

impl<T> Default for OptimizationConfig<T>
where
    T: Float + Debug,
{
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: T::from(1e-7).unwrap_or_else(T::epsilon),
        }
    }
}

/// Outcome of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    MaxIterationsReached,
}

/// Result of an optimization process.
#[derive(Debug, Clone)]
pub struct OptimizationResult<T>
where
    T: Float + Debug,
{
    /// The optimal point found (empty unless the status is `Optimal`)
    pub optimal_point: Vec<T>,
    /// The value of the objective function at the optimal point
    pub optimal_value: T,
    /// Number of pivots performed
    pub iterations: usize,
    /// Termination status
    pub status: SolveStatus,
}

impl<T> OptimizationResult<T>
where
    T: Float + Debug,
{
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}
