//! Trajectory simulation and Monte Carlo policy evaluation.

pub mod monte_carlo;
pub mod path;

pub use monte_carlo::{MonteCarloConfig, MonteCarloEvaluator, MonteCarloStateObserver};
pub use path::PathSimulator;
