use thiserror::Error;

/// Errors raised by the value-function fitting engine.
///
/// Construction-time validation and numerical breakdowns are reported here.
/// An optimization program that turns out infeasible or unbounded is not an
/// error: `solve()` reports it by returning `Ok(false)`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("discount factor {alpha} is not supported: {reason}")]
    InvalidDiscount { alpha: f64, reason: &'static str },

    #[error("not a probability distribution: {0}")]
    InvalidDistribution(String),

    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("state has no available actions")]
    NoActions,

    #[error("state {0} is not part of the state list")]
    UnknownState(String),

    #[error("no solution available, solve() has not succeeded")]
    NotSolved,

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("no more sample paths left")]
    Exhausted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
