use super::histogram::{Histogram, HistogramSnapshot};
use super::meter::{Meter, MeterSnapshot};
use std::time::{Duration, Instant};

/// Duration distribution (in nanoseconds) together with the rate of events
#[derive(Debug, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

/// Read-only copy of a timer's distribution and rates
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    histogram: HistogramSnapshot,
    meter: MeterSnapshot,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn starting_at(start: Instant) -> Self {
        Self {
            histogram: Histogram::new(),
            meter: Meter::starting_at(start),
        }
    }

    /// Record one event of the given duration
    pub fn update(&self, duration: Duration) {
        self.histogram.update(as_nanos(duration));
        self.meter.mark(1);
    }

    #[cfg(test)]
    pub(crate) fn update_at(&self, duration: Duration, now: Instant) {
        self.histogram.update(as_nanos(duration));
        self.meter.mark_at(1, now);
    }

    /// Record the time elapsed since `start`
    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Run `f` and record how long it took
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.update_since(start);
        result
    }

    pub fn count(&self) -> i64 {
        self.histogram.count()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            histogram: self.histogram.snapshot(),
            meter: self.meter.snapshot(),
        }
    }

    #[cfg(test)]
    pub(crate) fn snapshot_at(&self, now: Instant) -> TimerSnapshot {
        TimerSnapshot {
            histogram: self.histogram.snapshot(),
            meter: self.meter.snapshot_at(now),
        }
    }
}

fn as_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

impl TimerSnapshot {
    pub fn new(histogram: HistogramSnapshot, meter: MeterSnapshot) -> Self {
        Self { histogram, meter }
    }

    pub fn count(&self) -> i64 {
        self.histogram.count()
    }

    pub fn min(&self) -> i64 {
        self.histogram.min()
    }

    pub fn max(&self) -> i64 {
        self.histogram.max()
    }

    pub fn mean(&self) -> f64 {
        self.histogram.mean()
    }

    pub fn std_dev(&self) -> f64 {
        self.histogram.std_dev()
    }

    pub fn variance(&self) -> f64 {
        self.histogram.variance()
    }

    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        self.histogram.percentiles(ps)
    }

    pub fn rate1(&self) -> f64 {
        self.meter.rate1()
    }

    pub fn rate5(&self) -> f64 {
        self.meter.rate5()
    }

    pub fn rate15(&self) -> f64 {
        self.meter.rate15()
    }

    pub fn rate_mean(&self) -> f64 {
        self.meter.rate_mean()
    }
}
