use crate::error::Result;
use crate::math::optimization::{LpModel, VarId};
use crate::mdp::function::StateFunction;

/// An ordered set of scalar basis functions `ψ_i`, each with a declared
/// range for its coefficient.
pub trait BasisSet<S> {
    fn size(&self) -> usize;

    fn function_name(&self, i: usize) -> String;

    fn min_value(&self, _i: usize) -> f64 {
        f64::NEG_INFINITY
    }

    fn max_value(&self, _i: usize) -> f64 {
        f64::INFINITY
    }

    /// Writes `ψ(state)` into `out`, which has length `size()`.
    fn evaluate(&self, state: &S, out: &mut [f64]);

    /// Hook for extra constraints on the coefficient variables of a
    /// mathematical program.
    fn add_constraints(&self, _model: &mut LpModel, _coefficients: &[VarId]) -> Result<()> {
        Ok(())
    }

    /// Clamps every coefficient into its declared range.
    fn clip(&self, coefficients: &mut [f64]) {
        for (i, r) in coefficients.iter_mut().enumerate() {
            *r = r.max(self.min_value(i)).min(self.max_value(i));
        }
    }
}

struct BasisFunction<'a, S> {
    name: String,
    function: Box<dyn StateFunction<S> + 'a>,
    min: f64,
    max: f64,
}

/// A basis set assembled from arbitrary state functions.
///
/// ```
/// use adp::mdp::{BasisSet, FunctionBasis};
///
/// let basis = FunctionBasis::new()
///     .with("constant", |_: &i32| 1.0, -100.0, 100.0)
///     .with("linear", |s: &i32| *s as f64, 0.0, f64::INFINITY);
///
/// let mut psi = [0.0; 2];
/// basis.evaluate(&3, &mut psi);
/// assert_eq!(psi, [1.0, 3.0]);
/// assert_eq!(basis.function_name(1), "linear");
/// ```
pub struct FunctionBasis<'a, S> {
    functions: Vec<BasisFunction<'a, S>>,
}

impl<'a, S> FunctionBasis<'a, S> {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    pub fn push<F>(&mut self, name: impl Into<String>, function: F, min: f64, max: f64)
    where
        F: StateFunction<S> + 'a,
    {
        self.functions.push(BasisFunction {
            name: name.into(),
            function: Box::new(function),
            min,
            max,
        });
    }

    pub fn with<F>(mut self, name: impl Into<String>, function: F, min: f64, max: f64) -> Self
    where
        F: StateFunction<S> + 'a,
    {
        self.push(name, function, min, max);
        self
    }
}

impl<S> Default for FunctionBasis<'_, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> BasisSet<S> for FunctionBasis<'_, S> {
    fn size(&self) -> usize {
        self.functions.len()
    }

    fn function_name(&self, i: usize) -> String {
        self.functions[i].name.clone()
    }

    fn min_value(&self, i: usize) -> f64 {
        self.functions[i].min
    }

    fn max_value(&self, i: usize) -> f64 {
        self.functions[i].max
    }

    fn evaluate(&self, state: &S, out: &mut [f64]) {
        for (o, f) in out.iter_mut().zip(self.functions.iter()) {
            *o = f.function.value(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_respects_ranges() {
        let basis = FunctionBasis::new()
            .with("a", |_: &u8| 1.0, 0.0, 1.0)
            .with("b", |_: &u8| 1.0, -5.0, f64::INFINITY)
            .with("c", |_: &u8| 1.0, f64::NEG_INFINITY, f64::INFINITY);
        let mut r = [2.0, -7.0, -1e300];
        basis.clip(&mut r);
        assert_eq!(r, [1.0, -5.0, -1e300]);
    }
}
