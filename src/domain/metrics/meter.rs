use super::ewma::{Ewma, TICK_INTERVAL};
use std::sync::Mutex;
use std::time::Instant;

/// Counts events and tracks their 1, 5 and 15 minute moving-average rates
/// plus the lifetime mean rate.
///
/// Moving averages tick lazily: marking or snapshotting first applies every
/// whole tick interval elapsed since the previous tick.
#[derive(Debug)]
pub struct Meter {
    state: Mutex<MeterState>,
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    start: Instant,
    last_tick: Instant,
}

/// Read-only copy of a meter's rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSnapshot {
    count: i64,
    rate1: f64,
    rate5: f64,
    rate15: f64,
    rate_mean: f64,
}

impl Meter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub(crate) fn starting_at(start: Instant) -> Self {
        Self {
            state: Mutex::new(MeterState {
                count: 0,
                m1: Ewma::one_minute(),
                m5: Ewma::five_minutes(),
                m15: Ewma::fifteen_minutes(),
                start,
                last_tick: start,
            }),
        }
    }

    pub fn mark(&self, n: i64) {
        self.mark_at(n, Instant::now());
    }

    pub(crate) fn mark_at(&self, n: i64, now: Instant) {
        let mut state = self.lock();
        state.tick_if_necessary(now);
        state.count += n;
        state.m1.update(n);
        state.m5.update(n);
        state.m15.update(n);
    }

    pub fn count(&self) -> i64 {
        self.lock().count
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let mut state = self.lock();
        state.tick_if_necessary(now);

        let elapsed = now.saturating_duration_since(state.start).as_secs_f64();
        let rate_mean = if elapsed > 0.0 {
            state.count as f64 / elapsed
        } else {
            0.0
        };

        MeterSnapshot {
            count: state.count,
            rate1: state.m1.rate(),
            rate5: state.m5.rate(),
            rate15: state.m15.rate(),
            rate_mean,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MeterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterState {
    fn tick_if_necessary(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = elapsed.as_nanos() / TICK_INTERVAL.as_nanos();
        for _ in 0..ticks {
            self.m1.tick();
            self.m5.tick();
            self.m15.tick();
            self.last_tick += TICK_INTERVAL;
        }
    }
}

impl MeterSnapshot {
    pub fn new(count: i64, rate1: f64, rate5: f64, rate15: f64, rate_mean: f64) -> Self {
        Self {
            count,
            rate1,
            rate5,
            rate15,
            rate_mean,
        }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// One-minute moving average rate, events per second
    pub fn rate1(&self) -> f64 {
        self.rate1
    }

    pub fn rate5(&self) -> f64 {
        self.rate5
    }

    pub fn rate15(&self) -> f64 {
        self.rate15
    }

    /// Lifetime mean rate, events per second
    pub fn rate_mean(&self) -> f64 {
        self.rate_mean
    }
}
