use rand::Rng;

use crate::error::{Error, Result};

const EPSILON: f64 = 1e-10;

/// A distribution over the indices `0..n`, sampled by inverting the
/// cumulative table.
#[derive(Debug, Clone)]
pub struct DiscreteDistribution {
    probability: Vec<f64>,
    cumulative: Vec<f64>,
}

impl DiscreteDistribution {
    /// Builds a distribution from a probability vector.
    ///
    /// # Errors
    /// `Error::InvalidDistribution` if the vector is empty, an entry lies
    /// outside `[0, 1]`, or the entries do not sum to one.
    pub fn new(probability: Vec<f64>) -> Result<Self> {
        if probability.is_empty() {
            return Err(Error::InvalidDistribution("empty probability vector".into()));
        }
        if let Some(p) = probability.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(Error::InvalidDistribution(format!(
                "probability out of range {}",
                p
            )));
        }

        let cumulative: Vec<f64> = probability
            .iter()
            .scan(0.0, |sum, &p| {
                *sum += p;
                Some(*sum)
            })
            .collect();
        let total = cumulative[cumulative.len() - 1];
        if (total - 1.0).abs() > EPSILON {
            return Err(Error::InvalidDistribution(format!("sum is {}", total)));
        }

        Ok(Self {
            probability,
            cumulative,
        })
    }

    /// A point mass on index 0.
    pub fn certain() -> Self {
        Self {
            probability: vec![1.0],
            cumulative: vec![1.0],
        }
    }

    pub fn len(&self) -> usize {
        self.probability.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probability.is_empty()
    }

    pub fn probability(&self, i: usize) -> f64 {
        self.probability[i]
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probability
    }

    /// Draws an index. Zero-probability entries are never returned.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.gen();
        let index = self.cumulative.partition_point(|&c| c <= u);
        if index < self.probability.len() {
            return index;
        }
        // u beyond a cumulative total that rounded just below one
        self.probability
            .iter()
            .rposition(|&p| p > 0.0)
            .unwrap_or(self.probability.len() - 1)
    }

    /// Does `x` hold non-negative entries, each at most one, summing to one?
    pub fn is_distribution(x: &[f64]) -> bool {
        if x.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return false;
        }
        (x.iter().sum::<f64>() - 1.0).abs() < EPSILON
    }
}
