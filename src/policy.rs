//! Policies: rules choosing an action index at a state.

use bitvec::prelude::*;

use crate::mdp::{StateFunction, StateInfo};

pub trait Policy<S, A> {
    /// Index of the chosen action in `info`.
    fn action(&self, state: &S, info: &StateInfo<S, A>) -> usize;

    /// Actions considered optimal within `tolerance`.
    fn optimal_action_list(&self, state: &S, info: &StateInfo<S, A>, _tolerance: f64) -> Vec<A>
    where
        A: Clone,
    {
        vec![info.action(self.action(state, info)).clone()]
    }

    /// One bit per action, set for the actions considered optimal.
    fn optimal_action_mask(&self, state: &S, info: &StateInfo<S, A>, _tolerance: f64) -> BitVec {
        let mut mask = bitvec![0; info.action_count()];
        mask.set(self.action(state, info), true);
        mask
    }
}

/// A policy that scores every action and takes the cheapest one.
pub trait MinValuePolicy<S, A> {
    fn action_value(&self, state: &S, info: &StateInfo<S, A>, action: usize) -> f64;

    fn action_values(&self, state: &S, info: &StateInfo<S, A>) -> Vec<f64> {
        (0..info.action_count())
            .map(|a| self.action_value(state, info, a))
            .collect()
    }
}

impl<S, A, P> Policy<S, A> for P
where
    P: MinValuePolicy<S, A>,
{
    fn action(&self, state: &S, info: &StateInfo<S, A>) -> usize {
        min_action(&self.action_values(state, info)).unwrap_or(0)
    }

    fn optimal_action_list(&self, state: &S, info: &StateInfo<S, A>, tolerance: f64) -> Vec<A>
    where
        A: Clone,
    {
        near_min_mask(&self.action_values(state, info), tolerance)
            .iter_ones()
            .map(|a| info.action(a).clone())
            .collect()
    }

    fn optimal_action_mask(&self, state: &S, info: &StateInfo<S, A>, tolerance: f64) -> BitVec {
        near_min_mask(&self.action_values(state, info), tolerance)
    }
}

/// Index of the first minimum, `None` for an empty slice.
pub fn min_action(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (a, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((a, v)),
        }
    }
    best.map(|(a, _)| a)
}

/// Bits set for every value within `tolerance` of the minimum.
pub fn near_min_mask(values: &[f64], tolerance: f64) -> BitVec {
    let mut mask = bitvec![0; values.len()];
    if let Some(best) = min_action(values) {
        let min = values[best];
        for (a, &v) in values.iter().enumerate() {
            if (v - min).abs() < tolerance {
                mask.set(a, true);
            }
        }
    }
    mask
}

/// Greedy with respect to a value function: scores action `a` at `s` by
/// the expected value of the successor state.
pub struct ValueFunctionPolicy<'a, S> {
    value: &'a dyn StateFunction<S>,
}

impl<'a, S> ValueFunctionPolicy<'a, S> {
    pub fn new(value: &'a dyn StateFunction<S>) -> Self {
        Self { value }
    }
}

impl<S: PartialEq, A> MinValuePolicy<S, A> for ValueFunctionPolicy<'_, S> {
    fn action_value(&self, state: &S, info: &StateInfo<S, A>, action: usize) -> f64 {
        info.distribution(action)
            .expected_value_from(self.value, state)
    }
}

/// Builds a policy from a value function estimate.
pub trait ValueFunctionPolicyFactory<S, A> {
    fn policy<'f>(&self, value: &'f dyn StateFunction<S>) -> Box<dyn Policy<S, A> + 'f>;
}

/// Produces [`ValueFunctionPolicy`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicyFactory;

impl<S: PartialEq + 'static, A: 'static> ValueFunctionPolicyFactory<S, A> for GreedyPolicyFactory {
    fn policy<'f>(&self, value: &'f dyn StateFunction<S>) -> Box<dyn Policy<S, A> + 'f> {
        Box::new(ValueFunctionPolicy::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::testing::StayOrSwitch;
    use crate::mdp::Model;

    #[test]
    fn test_first_minimum_wins() {
        assert_eq!(min_action(&[3.0, 3.0, 5.0]), Some(0));
        assert_eq!(min_action(&[4.0, 1.0, 1.0]), Some(1));
        assert_eq!(min_action(&[]), None);
    }

    #[test]
    fn test_near_min_mask() {
        let mask = near_min_mask(&[3.0, 3.0, 5.0], 0.5);
        assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![0, 1]);
        let mask = near_min_mask(&[3.0, 3.2, 5.0], 0.5);
        assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![0, 1]);
        let mask = near_min_mask(&[3.0, 3.2, 5.0], 0.1);
        assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_value_function_policy() {
        let model = StayOrSwitch {
            switch_probability: 1.0,
        };
        let value = |s: &usize| if *s == 0 { 5.0 } else { 2.0 };
        let policy: ValueFunctionPolicy<usize> = ValueFunctionPolicy::new(&value);

        let info = model.state_info(&0).unwrap();
        assert_eq!(policy.action(&0, &info), 1);
        assert_eq!(policy.optimal_action_list(&0, &info, 1e-6), vec!["switch"]);
        assert_eq!(
            policy.optimal_action_list(&0, &info, 10.0),
            vec!["stay", "switch"]
        );

        let info = model.state_info(&1).unwrap();
        assert_eq!(policy.action(&1, &info), 0);
        let mask = policy.optimal_action_mask(&1, &info, 1e-6);
        assert!(mask[0] && !mask[1]);
    }

    #[test]
    fn test_factory_builds_greedy_policy() {
        let model = StayOrSwitch {
            switch_probability: 1.0,
        };
        let value = |s: &usize| *s as f64;
        let policy =
            ValueFunctionPolicyFactory::<usize, &'static str>::policy(&GreedyPolicyFactory, &value);
        let info = model.state_info(&1).unwrap();
        assert_eq!(policy.action(&1, &info), 1);
    }
}
