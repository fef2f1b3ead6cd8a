use super::sample::{SampleSnapshot, UniformSample};

/// Distribution of integer values backed by a uniform sample
#[derive(Debug, Default)]
pub struct Histogram {
    sample: UniformSample,
}

/// Read-only copy of a histogram's sample
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    sample: SampleSnapshot,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample(sample: UniformSample) -> Self {
        Self { sample }
    }

    pub fn update(&self, value: i64) {
        self.sample.update(value);
    }

    pub fn clear(&self) {
        self.sample.clear();
    }

    pub fn count(&self) -> i64 {
        self.sample.count()
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            sample: self.sample.snapshot(),
        }
    }
}

impl HistogramSnapshot {
    pub fn new(sample: SampleSnapshot) -> Self {
        Self { sample }
    }

    pub fn count(&self) -> i64 {
        self.sample.count()
    }

    pub fn min(&self) -> i64 {
        self.sample.min()
    }

    pub fn max(&self) -> i64 {
        self.sample.max()
    }

    pub fn mean(&self) -> f64 {
        self.sample.mean()
    }

    pub fn std_dev(&self) -> f64 {
        self.sample.std_dev()
    }

    pub fn variance(&self) -> f64 {
        self.sample.variance()
    }

    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        self.sample.percentiles(ps)
    }

    pub fn sample(&self) -> &SampleSnapshot {
        &self.sample
    }
}
