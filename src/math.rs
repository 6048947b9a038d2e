pub mod distribution;
pub mod integer_linear;
pub mod optimization;
pub mod random;
pub mod stats;

pub use distribution::DiscreteDistribution;
pub use random::MirroredRng;
pub use stats::{MeanVariance, SampleStatistics};

pub use optimization::{
    simplex::LinearProgram, simplex_minimize, LpModel, LpOracle, LpSolution, OptimizationConfig,
    OptimizationResult, RowId, Sense, SimplexOracle, SolveStatus, VarId,
};

pub use integer_linear::{BranchAndBoundSolver, ILPSolution, ILPSolver, IntegerLinearProgram};
