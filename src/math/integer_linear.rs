pub mod branch_and_bound;

use crate::error::Result;
use crate::math::optimization::{LinearProgram, SolveStatus};

/// A minimization program in standard form where some columns must take
/// integer values.
#[derive(Debug, Clone)]
pub struct IntegerLinearProgram {
    pub program: LinearProgram<f64>,
    pub integer_vars: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ILPSolution {
    pub values: Vec<f64>,
    pub objective_value: f64,
    pub status: SolveStatus,
    /// Number of relaxations solved
    pub nodes: usize,
}

pub trait ILPSolver {
    fn solve(&self, problem: &IntegerLinearProgram) -> Result<ILPSolution>;
}

pub use branch_and_bound::BranchAndBoundSolver;
