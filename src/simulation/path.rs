use std::num::NonZeroUsize;

use lru::LruCache;
use rand::RngCore;

use crate::error::Result;
use crate::mdp::{Info, Model, StateSet};
use crate::policy::Policy;

/// Simulates one trajectory of a policy, starting from the base state.
///
/// The first call to [`next_state`](Self::next_state) after construction or
/// [`reset`](Self::reset) returns the base state itself.
pub struct PathSimulator<'a, M: Model> {
    states: &'a dyn StateSet<M>,
    policy: &'a dyn Policy<M::State, M::Action>,
    rng: Box<dyn RngCore + 'a>,
    current: Option<M::State>,
    actions: Option<LruCache<M::State, usize>>,
}

impl<'a, M: Model> PathSimulator<'a, M> {
    /// `action_cache_size == 0` disables the action cache.
    pub fn new(
        states: &'a dyn StateSet<M>,
        policy: &'a dyn Policy<M::State, M::Action>,
        rng: Box<dyn RngCore + 'a>,
        action_cache_size: usize,
    ) -> Self {
        Self {
            states,
            policy,
            rng,
            current: None,
            actions: NonZeroUsize::new(action_cache_size).map(LruCache::new),
        }
    }

    /// Starts a new path from the base state, drawing from `rng`.
    pub fn reset(&mut self, rng: Box<dyn RngCore + 'a>) {
        self.rng = rng;
        self.current = None;
    }

    pub fn current(&self) -> Option<&M::State> {
        self.current.as_ref()
    }

    pub fn next_state(&mut self) -> Result<M::State> {
        let next = match self.current.take() {
            None => self.states.model().base_state(),
            Some(state) => {
                let info = self.states.state_info(&state)?;
                let action = self.action(&state, &info);
                info.distribution(action)
                    .sample(self.rng.as_mut())
                    .clone()
            }
        };
        self.current = Some(next.clone());
        Ok(next)
    }

    fn action(&mut self, state: &M::State, info: &Info<M>) -> usize {
        match self.actions.as_mut() {
            Some(cache) => {
                if let Some(&a) = cache.get(state) {
                    return a;
                }
                let a = self.policy.action(state, info);
                cache.put(state.clone(), a);
                a
            }
            None => self.policy.action(state, info),
        }
    }
}

impl<M: Model> Iterator for PathSimulator<'_, M> {
    type Item = Result<M::State>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_state())
    }
}
