pub mod error;
pub mod math;
pub mod mdp;
pub mod policy;
pub mod simulation;
pub mod solver;

pub use error::{Error, Result};
pub use mdp::{BasisSet, Model, StateFunction, StateInfo, StateList};
pub use policy::Policy;
pub use solver::Solver;
