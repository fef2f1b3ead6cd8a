use std::time::Duration;

/// Interval at which moving averages are ticked
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Exponentially-weighted moving average of an event rate.
///
/// Not thread-safe on its own; the owning [`Meter`](super::Meter) serializes
/// access.
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: i64,
    initialized: bool,
}

impl Ewma {
    /// Moving average decaying over `minutes` minutes at the standard tick
    pub fn with_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp();
        Self::with_alpha(alpha)
    }

    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            rate: 0.0,
            uncounted: 0,
            initialized: false,
        }
    }

    pub fn one_minute() -> Self {
        Self::with_minutes(1.0)
    }

    pub fn five_minutes() -> Self {
        Self::with_minutes(5.0)
    }

    pub fn fifteen_minutes() -> Self {
        Self::with_minutes(15.0)
    }

    /// Record `n` events for the next tick
    pub fn update(&mut self, n: i64) {
        self.uncounted += n;
    }

    /// Fold the events counted since the last tick into the average
    pub fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Events per second
    pub fn rate(&self) -> f64 {
        self.rate
    }
}
