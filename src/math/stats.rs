//! Running sample statistics.

/// Mean and variance only, accumulated with Welford's update.
#[derive(Debug, Clone, Default)]
pub struct MeanVariance {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl MeanVariance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn add_sample(&mut self, x: f64) {
        if self.count == 0 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` until a sample has been added.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Unbiased sample variance, `None` with fewer than two samples.
    pub fn variance(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).max(0.0))
    }

    pub fn standard_deviation(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

/// Keeps every sample, on top of the running moments.
#[derive(Debug, Clone, Default)]
pub struct SampleStatistics {
    samples: Vec<f64>,
    moments: MeanVariance,
}

impl SampleStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            moments: MeanVariance::new(),
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.moments.clear();
    }

    pub fn add_sample(&mut self, x: f64) {
        self.samples.push(x);
        self.moments.add_sample(x);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn mean(&self) -> Option<f64> {
        self.moments.mean()
    }

    pub fn variance(&self) -> Option<f64> {
        self.moments.variance()
    }

    pub fn standard_deviation(&self) -> Option<f64> {
        self.moments.standard_deviation()
    }

    /// Standard error of the mean.
    pub fn standard_error(&self) -> Option<f64> {
        self.standard_deviation()
            .map(|sd| sd / (self.count() as f64).sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.moments.min()
    }

    pub fn max(&self) -> Option<f64> {
        self.moments.max()
    }
}
