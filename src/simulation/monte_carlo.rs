use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};
use crate::math::{MeanVariance, MirroredRng, SampleStatistics};
use crate::mdp::{Model, StateFunction};
use crate::simulation::path::PathSimulator;

#[derive(Debug, Clone)]
pub struct MonteCarloConfig {
    /// Steps per sample path
    pub time_step_count: usize,
    pub sample_path_count: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            time_step_count: 1_000,
            sample_path_count: 100,
        }
    }
}

/// Called with `(path, time, state)` for every simulated state, `time`
/// counting from one.
pub trait MonteCarloStateObserver<S> {
    fn observe(&mut self, path: usize, time: usize, state: &S);
}

impl<S, F> MonteCarloStateObserver<S> for F
where
    F: FnMut(usize, usize, &S),
{
    fn observe(&mut self, path: usize, time: usize, state: &S) {
        self(path, time, state)
    }
}

/// Estimates the long-run average of a state function by simulating
/// antithetic pairs of sample paths.
///
/// Even paths draw a fresh seed from the base generator; each odd path
/// replays the previous seed through a [`MirroredRng`].
pub struct MonteCarloEvaluator<'a, M: Model, R> {
    simulator: PathSimulator<'a, M>,
    base_rng: R,
    function: &'a dyn StateFunction<M::State>,
    config: MonteCarloConfig,
    seed: u64,
    stats: SampleStatistics,
    observer: Option<Box<dyn MonteCarloStateObserver<M::State> + 'a>>,
}

impl<'a, M: Model, R: RngCore> MonteCarloEvaluator<'a, M, R> {
    pub fn new(
        simulator: PathSimulator<'a, M>,
        base_rng: R,
        function: &'a dyn StateFunction<M::State>,
        config: MonteCarloConfig,
    ) -> Self {
        let stats = SampleStatistics::with_capacity(config.sample_path_count);
        Self {
            simulator,
            base_rng,
            function,
            config,
            seed: 0,
            stats,
            observer: None,
        }
    }

    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: MonteCarloStateObserver<M::State> + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn has_next(&self) -> bool {
        self.stats.count() < self.config.sample_path_count
    }

    /// Simulates the next path and returns its average.
    ///
    /// # Errors
    /// `Error::Exhausted` once every path has been simulated.
    pub fn next_path(&mut self) -> Result<f64> {
        let path = self.stats.count();
        if path >= self.config.sample_path_count {
            return Err(Error::Exhausted);
        }

        let rng: Box<dyn RngCore + 'a> = if path % 2 == 0 {
            self.seed = self.base_rng.next_u64();
            Box::new(ChaCha20Rng::seed_from_u64(self.seed))
        } else {
            Box::new(MirroredRng::new(ChaCha20Rng::seed_from_u64(self.seed)))
        };
        self.simulator.reset(rng);

        let mut path_stats = MeanVariance::new();
        let mut last: Option<(M::State, f64)> = None;
        for time in 0..self.config.time_step_count {
            let state = self.simulator.next_state()?;
            if let Some(observer) = self.observer.as_mut() {
                observer.observe(path, time + 1, &state);
            }
            let value = match last {
                Some((ref previous, value)) if *previous == state => value,
                _ => {
                    let value = self.function.value(&state);
                    last = Some((state, value));
                    value
                }
            };
            path_stats.add_sample(value);
        }

        let value = path_stats
            .mean()
            .ok_or_else(|| Error::Numerical("sample path without time steps".to_string()))?;
        self.stats.add_sample(value);
        Ok(value)
    }

    /// Simulates every remaining path.
    pub fn run(&mut self) -> Result<&SampleStatistics> {
        while self.has_next() {
            self.next_path()?;
        }
        Ok(&self.stats)
    }

    pub fn sample_statistics(&self) -> &SampleStatistics {
        &self.stats
    }
}

impl<M: Model, R: RngCore> Iterator for MonteCarloEvaluator<'_, M, R> {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_next().then(|| self.next_path())
    }
}
