//! Small models and basis sets shared by the unit tests.

use std::cell::Cell;

use crate::error::Result;
use crate::mdp::{BasisSet, Model, StateDistribution, StateInfo};

/// States `0..size`, one action moving `i` to `i + 1 mod size`.
pub(crate) struct CycleModel {
    size: usize,
    requests: Cell<usize>,
}

impl CycleModel {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            requests: Cell::new(0),
        }
    }

    pub(crate) fn info_requests(&self) -> usize {
        self.requests.get()
    }
}

impl Model for CycleModel {
    type State = usize;
    type Action = &'static str;

    fn base_state(&self) -> usize {
        0
    }

    fn state_info(&self, state: &usize) -> Result<StateInfo<usize, &'static str>> {
        self.requests.set(self.requests.get() + 1);
        StateInfo::new(
            vec!["next"],
            vec![StateDistribution::deterministic((state + 1) % self.size)],
        )
    }

    fn enumerate_states(&self) -> Result<Vec<usize>> {
        Ok((0..self.size).collect())
    }
}

/// Two states `{0, 1}`. Action 0 stays put, action 1 switches to the other
/// state with probability `switch_probability` and stays otherwise.
pub(crate) struct StayOrSwitch {
    pub(crate) switch_probability: f64,
}

impl Model for StayOrSwitch {
    type State = usize;
    type Action = &'static str;

    fn base_state(&self) -> usize {
        0
    }

    fn state_info(&self, state: &usize) -> Result<StateInfo<usize, &'static str>> {
        let other = 1 - state;
        let switch = if self.switch_probability >= 1.0 {
            StateDistribution::deterministic(other)
        } else {
            StateDistribution::from_pairs(vec![
                (other, self.switch_probability),
                (*state, 1.0 - self.switch_probability),
            ])?
        };
        StateInfo::new(
            vec!["stay", "switch"],
            vec![StateDistribution::deterministic(*state), switch],
        )
    }

    fn enumerate_states(&self) -> Result<Vec<usize>> {
        Ok(vec![0, 1])
    }
}

/// Indicator of each state `0..size`.
pub(crate) struct TabularBasis {
    size: usize,
    min: f64,
    max: f64,
}

impl TabularBasis {
    pub(crate) fn new(size: usize, min: f64, max: f64) -> Self {
        Self { size, min, max }
    }
}

impl BasisSet<usize> for TabularBasis {
    fn size(&self) -> usize {
        self.size
    }

    fn function_name(&self, i: usize) -> String {
        format!("r{}", i)
    }

    fn min_value(&self, _i: usize) -> f64 {
        self.min
    }

    fn max_value(&self, _i: usize) -> f64 {
        self.max
    }

    fn evaluate(&self, state: &usize, out: &mut [f64]) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = if i == *state { 1.0 } else { 0.0 };
        }
    }
}

/// The single basis function `ψ = 1`.
pub(crate) struct ConstantBasis {
    min: f64,
    max: f64,
}

impl ConstantBasis {
    pub(crate) fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl<S> BasisSet<S> for ConstantBasis {
    fn size(&self) -> usize {
        1
    }

    fn function_name(&self, _i: usize) -> String {
        "constant".to_string()
    }

    fn min_value(&self, _i: usize) -> f64 {
        self.min
    }

    fn max_value(&self, _i: usize) -> f64 {
        self.max
    }

    fn evaluate(&self, _state: &S, out: &mut [f64]) {
        out[0] = 1.0;
    }
}
