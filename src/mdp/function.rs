use std::borrow::Cow;
use std::fmt;

use crate::mdp::basis::BasisSet;
use crate::mdp::state_set::StateList;
use crate::mdp::Model;

/// A real-valued function of the state.
pub trait StateFunction<S> {
    fn value(&self, state: &S) -> f64;
}

impl<S, F> StateFunction<S> for F
where
    F: Fn(&S) -> f64,
{
    fn value(&self, state: &S) -> f64 {
        self(state)
    }
}

/// The same value everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantFunction {
    pub value: f64,
}

impl ConstantFunction {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Default for ConstantFunction {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl<S> StateFunction<S> for ConstantFunction {
    fn value(&self, _state: &S) -> f64 {
        self.value
    }
}

/// `Σ r_i ψ_i(s)` for a coefficient vector `r` over a basis set.
pub struct LinearCombination<'a, S> {
    coefficients: Cow<'a, [f64]>,
    basis: &'a dyn BasisSet<S>,
}

impl<'a, S> LinearCombination<'a, S> {
    pub fn new(coefficients: Vec<f64>, basis: &'a dyn BasisSet<S>) -> Self {
        Self {
            coefficients: Cow::Owned(coefficients),
            basis,
        }
    }

    /// Evaluates over coefficients owned elsewhere, e.g. weights that are
    /// still being trained.
    pub fn borrowed(coefficients: &'a [f64], basis: &'a dyn BasisSet<S>) -> Self {
        Self {
            coefficients: Cow::Borrowed(coefficients),
            basis,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn basis(&self) -> &'a dyn BasisSet<S> {
        self.basis
    }
}

impl<S> StateFunction<S> for LinearCombination<'_, S> {
    fn value(&self, state: &S) -> f64 {
        let mut psi = vec![0.0; self.basis.size()];
        self.basis.evaluate(state, &mut psi);
        psi.iter()
            .zip(self.coefficients.iter())
            .map(|(p, r)| p * r)
            .sum()
    }
}

impl<S> fmt::Debug for LinearCombination<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearCombination")
            .field("coefficients", &self.coefficients)
            .field("basis_size", &self.basis.size())
            .finish()
    }
}

/// One value per state of a state list. States outside the list evaluate to
/// NaN.
pub struct StateValues<'a, M: Model> {
    states: &'a StateList<'a, M>,
    values: Vec<f64>,
}

impl<'a, M: Model> StateValues<'a, M> {
    pub(crate) fn new(states: &'a StateList<'a, M>, values: Vec<f64>) -> Self {
        Self { states, values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl<M: Model> StateFunction<M::State> for StateValues<'_, M> {
    fn value(&self, state: &M::State) -> f64 {
        self.states
            .state_index(state)
            .map_or(f64::NAN, |i| self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::testing::{ConstantBasis, CycleModel, TabularBasis};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_combination() {
        let basis = TabularBasis::new(3, -10.0, 10.0);
        let f = LinearCombination::new(vec![1.0, -2.0, 0.5], &basis);
        assert_abs_diff_eq!(f.value(&1), -2.0);
        assert_abs_diff_eq!(f.value(&2), 0.5);

        let weights = [4.0];
        let constant = ConstantBasis::new(-10.0, 10.0);
        let g = LinearCombination::borrowed(&weights, &constant);
        assert_abs_diff_eq!(g.value(&17usize), 4.0);
    }

    #[test]
    fn test_closures_and_constants() {
        let double = |s: &usize| 2.0 * *s as f64;
        assert_abs_diff_eq!(double.value(&3), 6.0);
        assert_abs_diff_eq!(StateFunction::<usize>::value(&ConstantFunction::default(), &3), 1.0);
    }

    #[test]
    fn test_state_values_unknown_state_is_nan() {
        let model = CycleModel::new(2);
        let states = StateList::enumerate(&model).unwrap();
        let values = StateValues::new(&states, vec![1.0, 2.0]);
        assert_eq!(values.value(&1), 2.0);
        assert!(values.value(&5).is_nan());
    }
}
