//! Markov decision process abstractions consumed by the solvers.

pub mod basis;
pub mod distribution;
pub mod function;
pub mod sampler;
pub mod state_set;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{Error, Result};

pub use basis::{BasisSet, FunctionBasis};
pub use distribution::StateDistribution;
pub use function::{ConstantFunction, LinearCombination, StateFunction, StateValues};
pub use sampler::{StateSampler, TrajectorySampler};
pub use state_set::{StateCache, StateList, StateSet};

/// The probabilistic model of a Markov decision process.
pub trait Model {
    type State: Clone + Eq + Hash + Debug + 'static;
    type Action: Clone + Debug + 'static;

    /// The state every simulated path starts from.
    fn base_state(&self) -> Self::State;

    /// Available actions and their transition distributions at `state`.
    fn state_info(&self, state: &Self::State) -> Result<StateInfo<Self::State, Self::Action>>;

    /// Every state of the model. Countable or continuous models need not
    /// support this.
    fn enumerate_states(&self) -> Result<Vec<Self::State>> {
        Err(Error::Unsupported("state enumeration"))
    }
}

/// Shorthand for the state information of a model.
pub type Info<M> = StateInfo<<M as Model>::State, <M as Model>::Action>;

/// The actions available at a state, each with its distribution over
/// successor states.
#[derive(Debug, Clone)]
pub struct StateInfo<S, A> {
    actions: Vec<A>,
    distributions: Vec<StateDistribution<S>>,
}

impl<S, A> StateInfo<S, A> {
    pub fn new(actions: Vec<A>, distributions: Vec<StateDistribution<S>>) -> Result<Self> {
        if actions.len() != distributions.len() {
            return Err(Error::LengthMismatch {
                expected: actions.len(),
                found: distributions.len(),
            });
        }
        if actions.is_empty() {
            return Err(Error::NoActions);
        }
        Ok(Self {
            actions,
            distributions,
        })
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn action(&self, a: usize) -> &A {
        &self.actions[a]
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    pub fn distribution(&self, a: usize) -> &StateDistribution<S> {
        &self.distributions[a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::testing::CycleModel;

    #[test]
    fn test_state_info_rejects_mismatched_lengths() {
        let result = StateInfo::new(vec!["a", "b"], vec![StateDistribution::deterministic(0)]);
        assert!(matches!(
            result,
            Err(Error::LengthMismatch {
                expected: 2,
                found: 1
            })
        ));

        let empty: Result<StateInfo<usize, &str>> = StateInfo::new(vec![], vec![]);
        assert!(matches!(empty, Err(Error::NoActions)));
    }

    #[test]
    fn test_model_enumeration() {
        let model = CycleModel::new(3);
        assert_eq!(model.enumerate_states().unwrap(), vec![0, 1, 2]);
        let info = model.state_info(&2).unwrap();
        assert_eq!(info.action_count(), 1);
        assert_eq!(*info.distribution(0).next_state(0), 0);
    }
}
