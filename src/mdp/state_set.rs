use std::cell::{OnceCell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::error::{Error, Result};
use crate::mdp::{Info, Model};

/// A collection of states that hands out shared state information.
pub trait StateSet<M: Model> {
    fn model(&self) -> &M;

    /// The stored copy of `state`, if the set holds it.
    fn state(&self, state: &M::State) -> Option<M::State>;

    /// State information for `state`, computed by the model on first use.
    fn state_info(&self, state: &M::State) -> Result<Arc<Info<M>>>;
}

/// A finite, ordered list of states with a reverse index.
///
/// State information is computed lazily, at most once per state.
pub struct StateList<'m, M: Model> {
    model: &'m M,
    states: Vec<M::State>,
    index: HashMap<M::State, usize>,
    info: Vec<OnceCell<Arc<Info<M>>>>,
}

impl<'m, M: Model> StateList<'m, M> {
    /// Duplicate states keep their first position.
    pub fn new(model: &'m M, states: Vec<M::State>) -> Self {
        let mut index = HashMap::with_capacity(states.len());
        let mut unique = Vec::with_capacity(states.len());
        for state in states {
            if !index.contains_key(&state) {
                index.insert(state.clone(), unique.len());
                unique.push(state);
            }
        }
        let info = (0..unique.len()).map(|_| OnceCell::new()).collect();
        Self {
            model,
            states: unique,
            index,
            info,
        }
    }

    /// All states the model can enumerate.
    pub fn enumerate(model: &'m M) -> Result<Self> {
        Ok(Self::new(model, model.enumerate_states()?))
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state_at(&self, i: usize) -> &M::State {
        &self.states[i]
    }

    pub fn states(&self) -> &[M::State] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M::State> {
        self.states.iter()
    }

    pub fn state_index(&self, state: &M::State) -> Option<usize> {
        self.index.get(state).copied()
    }

    pub fn state_info_at(&self, i: usize) -> Result<Arc<Info<M>>> {
        if let Some(info) = self.info[i].get() {
            return Ok(Arc::clone(info));
        }
        let info = Arc::new(self.model.state_info(&self.states[i])?);
        Ok(Arc::clone(self.info[i].get_or_init(|| info)))
    }

    /// States ordered by `compare`, leaving the list itself untouched.
    pub fn sorted<F>(&self, mut compare: F) -> Vec<&M::State>
    where
        F: FnMut(&M::State, &M::State) -> Ordering,
    {
        let mut sorted: Vec<&M::State> = self.states.iter().collect();
        sorted.sort_by(|a, b| compare(a, b));
        sorted
    }
}

impl<M: Model> StateSet<M> for StateList<'_, M> {
    fn model(&self) -> &M {
        self.model
    }

    fn state(&self, state: &M::State) -> Option<M::State> {
        self.state_index(state).map(|i| self.states[i].clone())
    }

    fn state_info(&self, state: &M::State) -> Result<Arc<Info<M>>> {
        let i = self
            .state_index(state)
            .ok_or_else(|| Error::UnknownState(format!("{:?}", state)))?;
        self.state_info_at(i)
    }
}

impl<'a, 'm, M: Model> IntoIterator for &'a StateList<'m, M> {
    type Item = &'a M::State;
    type IntoIter = std::slice::Iter<'a, M::State>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A bounded, least-recently-used cache of state information for models
/// whose states cannot be enumerated up front.
pub struct StateCache<'m, M: Model> {
    model: &'m M,
    cache: RefCell<LruCache<M::State, Arc<Info<M>>>>,
}

impl<'m, M: Model> StateCache<'m, M> {
    /// A zero capacity is raised to one.
    pub fn new(model: &'m M, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            model,
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl<M: Model> StateSet<M> for StateCache<'_, M> {
    fn model(&self) -> &M {
        self.model
    }

    fn state(&self, state: &M::State) -> Option<M::State> {
        self.cache
            .borrow_mut()
            .get(state)
            .map(|_| state.clone())
    }

    fn state_info(&self, state: &M::State) -> Result<Arc<Info<M>>> {
        let cached = self.cache.borrow_mut().get(state).cloned();
        if let Some(info) = cached {
            return Ok(info);
        }
        let info = Arc::new(self.model.state_info(state)?);
        self.cache
            .borrow_mut()
            .put(state.clone(), Arc::clone(&info));
        Ok(info)
    }
}
