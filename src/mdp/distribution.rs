use rand::Rng;

use crate::error::{Error, Result};
use crate::math::DiscreteDistribution;
use crate::mdp::basis::BasisSet;
use crate::mdp::function::StateFunction;

/// A discrete distribution over successor states.
#[derive(Debug, Clone)]
pub struct StateDistribution<S> {
    distribution: DiscreteDistribution,
    next_states: Vec<S>,
}

impl<S> StateDistribution<S> {
    pub fn new(distribution: DiscreteDistribution, next_states: Vec<S>) -> Result<Self> {
        if distribution.len() != next_states.len() {
            return Err(Error::LengthMismatch {
                expected: distribution.len(),
                found: next_states.len(),
            });
        }
        Ok(Self {
            distribution,
            next_states,
        })
    }

    /// Builds the distribution from `(state, probability)` pairs.
    pub fn from_pairs(pairs: Vec<(S, f64)>) -> Result<Self> {
        let (next_states, probability): (Vec<S>, Vec<f64>) = pairs.into_iter().unzip();
        Self::new(DiscreteDistribution::new(probability)?, next_states)
    }

    /// A point mass on `state`.
    pub fn deterministic(state: S) -> Self {
        Self {
            distribution: DiscreteDistribution::certain(),
            next_states: vec![state],
        }
    }

    pub fn next_state_count(&self) -> usize {
        self.next_states.len()
    }

    pub fn next_state(&self, i: usize) -> &S {
        &self.next_states[i]
    }

    pub fn next_states(&self) -> &[S] {
        &self.next_states
    }

    pub fn probability(&self, i: usize) -> f64 {
        self.distribution.probability(i)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &S {
        &self.next_states[self.distribution.sample(rng)]
    }

    /// `Σ p(s') f(s')`.
    pub fn expected_value<F>(&self, f: &F) -> f64
    where
        F: StateFunction<S> + ?Sized,
    {
        self.next_states
            .iter()
            .enumerate()
            .map(|(i, s)| self.probability(i) * f.value(s))
            .sum()
    }

    /// Same as [`expected_value`](Self::expected_value), but successors equal
    /// to `current` are evaluated at most once.
    pub fn expected_value_from<F>(&self, f: &F, current: &S) -> f64
    where
        F: StateFunction<S> + ?Sized,
        S: PartialEq,
    {
        let mut current_value = None;
        let mut sum = 0.0;
        for (i, s) in self.next_states.iter().enumerate() {
            let value = if s == current {
                *current_value.get_or_insert_with(|| f.value(current))
            } else {
                f.value(s)
            };
            sum += self.probability(i) * value;
        }
        sum
    }

    /// `Σ p(s') ψ(s')`, one entry per basis function.
    pub fn expected_basis_value<B>(&self, basis: &B) -> Vec<f64>
    where
        B: BasisSet<S> + ?Sized,
    {
        let mut expected = vec![0.0; basis.size()];
        let mut psi = vec![0.0; basis.size()];
        for (i, s) in self.next_states.iter().enumerate() {
            basis.evaluate(s, &mut psi);
            let p = self.probability(i);
            for (e, v) in expected.iter_mut().zip(psi.iter()) {
                *e += p * v;
            }
        }
        expected
    }
}
