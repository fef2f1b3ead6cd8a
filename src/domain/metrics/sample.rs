use rand::Rng;
use statrs::statistics::Statistics;
use std::sync::Mutex;

/// Reservoir size used by histograms and timers unless told otherwise.
///
/// 1028 values give a 99.9% confidence level with a 5% margin of error
/// assuming a normal distribution.
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// Uniform random sample over the whole stream of values (Vitter's algorithm R)
#[derive(Debug)]
pub struct UniformSample {
    reservoir_size: usize,
    state: Mutex<SampleState>,
}

#[derive(Debug, Default)]
struct SampleState {
    count: i64,
    values: Vec<i64>,
}

impl UniformSample {
    pub fn new(reservoir_size: usize) -> Self {
        Self {
            reservoir_size: reservoir_size.max(1),
            state: Mutex::new(SampleState::default()),
        }
    }

    pub fn update(&self, value: i64) {
        let mut state = self.lock();
        state.count += 1;
        if state.values.len() < self.reservoir_size {
            state.values.push(value);
        } else {
            let slot = rand::rng().random_range(0..state.count);
            if (slot as usize) < self.reservoir_size {
                state.values[slot as usize] = value;
            }
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.count = 0;
        state.values.clear();
    }

    /// Number of values ever recorded, not the number currently held
    pub fn count(&self) -> i64 {
        self.lock().count
    }

    /// Number of values currently held in the reservoir
    pub fn size(&self) -> usize {
        self.lock().values.len()
    }

    pub fn snapshot(&self) -> SampleSnapshot {
        let state = self.lock();
        SampleSnapshot::new(state.count, state.values.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SampleState> {
        // A poisoned sample still holds valid integers
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for UniformSample {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVOIR_SIZE)
    }
}

/// Sorted, immutable copy of a sample's reservoir
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSnapshot {
    count: i64,
    values: Vec<i64>,
}

impl SampleSnapshot {
    pub fn new(count: i64, mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { count, values }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }

    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    pub fn sum(&self) -> i64 {
        self.values.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        Statistics::mean(self.as_f64().iter())
    }

    /// Population variance of the held values
    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        Statistics::population_variance(self.as_f64().iter())
    }

    pub fn std_dev(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        Statistics::population_std_dev(self.as_f64().iter())
    }

    pub fn percentile(&self, p: f64) -> f64 {
        self.percentiles(&[p])[0]
    }

    /// Interpolated percentiles, one per requested quantile, in request order.
    ///
    /// The rank of quantile `p` is `p * (n + 1)`; ranks below 1 (or NaN) clamp
    /// to the smallest value and ranks at or past `n` clamp to the largest.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        let size = self.values.len();
        if size == 0 {
            return vec![0.0; ps.len()];
        }

        ps.iter()
            .map(|p| {
                let pos = p * (size + 1) as f64;
                // NaN ranks fall through to the smallest value
                if pos.is_nan() || pos < 1.0 {
                    self.values[0] as f64
                } else if pos >= size as f64 {
                    self.values[size - 1] as f64
                } else {
                    let lower = self.values[pos as usize - 1] as f64;
                    let upper = self.values[pos as usize] as f64;
                    lower + (pos - pos.floor()) * (upper - lower)
                }
            })
            .collect()
    }

    fn as_f64(&self) -> Vec<f64> {
        self.values.iter().map(|v| *v as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_all_zero() {
        let snapshot = UniformSample::default().snapshot();
        assert_eq!(snapshot.count(), 0);
        assert_eq!(snapshot.min(), 0);
        assert_eq!(snapshot.max(), 0);
        assert_eq!(snapshot.mean(), 0.0);
        assert_eq!(snapshot.variance(), 0.0);
        assert_eq!(snapshot.std_dev(), 0.0);
        assert_eq!(snapshot.percentiles(&[0.5, 0.99]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_statistics_over_one_to_ten() {
        let sample = UniformSample::new(100);
        for v in (1..=10).rev() {
            sample.update(v);
        }
        let snapshot = sample.snapshot();

        assert_eq!(snapshot.count(), 10);
        assert_eq!(snapshot.min(), 1);
        assert_eq!(snapshot.max(), 10);
        assert_eq!(snapshot.sum(), 55);
        assert!((snapshot.mean() - 5.5).abs() < 1e-9);
        assert!((snapshot.variance() - 8.25).abs() < 1e-9);
        assert!((snapshot.std_dev() - 8.25f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_interpolation_and_clamping() {
        let snapshot = SampleSnapshot::new(4, vec![40, 10, 30, 20]);
        // rank 0.5 * 5 = 2.5 -> halfway between 20 and 30
        assert!((snapshot.percentile(0.5) - 25.0).abs() < 1e-9);
        // rank below 1 clamps to the minimum
        assert_eq!(snapshot.percentile(0.1), 10.0);
        // rank past n clamps to the maximum
        assert_eq!(snapshot.percentile(0.9999), 40.0);
    }

    #[test]
    fn test_nan_quantile_clamps_to_minimum() {
        let snapshot = SampleSnapshot::new(3, vec![1, 2, 3]);
        assert_eq!(snapshot.percentile(f64::NAN), 1.0);
        assert_eq!(snapshot.percentiles(&[f64::NAN, 0.5]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_reservoir_is_bounded_but_count_is_not() {
        let sample = UniformSample::new(16);
        for v in 0..1000 {
            sample.update(v);
        }
        assert_eq!(sample.count(), 1000);
        assert_eq!(sample.size(), 16);

        let snapshot = sample.snapshot();
        assert!(snapshot.values().windows(2).all(|w| w[0] <= w[1]));
        assert!(snapshot.values().iter().all(|v| (0..1000).contains(v)));

        sample.clear();
        assert_eq!(sample.count(), 0);
        assert_eq!(sample.size(), 0);
    }
}
