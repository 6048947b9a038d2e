use std::collections::HashMap;

use rand::RngCore;

use crate::error::Result;
use crate::mdp::state_set::{StateCache, StateList, StateSet};
use crate::mdp::Model;
use crate::policy::Policy;

/// Produces a state list and a state-relevance weight per listed state.
pub trait StateSampler<'m, M: Model> {
    /// Draws up to `state_count` distinct states.
    fn sample(&mut self, rng: &mut dyn RngCore, state_count: usize) -> Result<()>;

    /// `None` until [`sample`](Self::sample) has run.
    fn state_list(&self) -> Option<&StateList<'m, M>>;

    /// Weights aligned with the state list, summing to one.
    fn weights(&self) -> &[f64];
}

/// Follows a policy from the base state and weighs each distinct state by
/// its visit frequency.
pub struct TrajectorySampler<'m, M: Model> {
    model: &'m M,
    policy: &'m dyn Policy<M::State, M::Action>,
    max_steps: usize,
    cache_size: usize,
    states: Option<StateList<'m, M>>,
    weights: Vec<f64>,
}

impl<'m, M: Model> TrajectorySampler<'m, M> {
    pub fn new(
        model: &'m M,
        policy: &'m dyn Policy<M::State, M::Action>,
        max_steps: usize,
        cache_size: usize,
    ) -> Self {
        Self {
            model,
            policy,
            max_steps,
            cache_size,
            states: None,
            weights: Vec::new(),
        }
    }
}

impl<'m, M: Model> StateSampler<'m, M> for TrajectorySampler<'m, M> {
    fn sample(&mut self, rng: &mut dyn RngCore, state_count: usize) -> Result<()> {
        let cache = StateCache::new(self.model, self.cache_size);
        let mut visited: Vec<M::State> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut index: HashMap<M::State, usize> = HashMap::new();

        let mut current = self.model.base_state();
        for _ in 0..self.max_steps {
            match index.get(&current) {
                Some(&i) => counts[i] += 1,
                None => {
                    if visited.len() == state_count {
                        break;
                    }
                    index.insert(current.clone(), visited.len());
                    visited.push(current.clone());
                    counts.push(1);
                }
            }
            let info = cache.state_info(&current)?;
            let action = self.policy.action(&current, &info);
            current = info.distribution(action).sample(rng).clone();
        }

        let total: usize = counts.iter().sum();
        self.weights = counts
            .iter()
            .map(|&c| c as f64 / total.max(1) as f64)
            .collect();
        log::debug!(
            "sampled {} distinct states over {} visits",
            visited.len(),
            total
        );
        self.states = Some(StateList::new(self.model, visited));
        Ok(())
    }

    fn state_list(&self) -> Option<&StateList<'m, M>> {
        self.states.as_ref()
    }

    fn weights(&self) -> &[f64] {
        &self.weights
    }
}
