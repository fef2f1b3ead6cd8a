use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Integer gauge holding the last value set
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeSnapshot {
    value: i64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            value: self.value(),
        }
    }
}

impl GaugeSnapshot {
    pub fn value(&self) -> i64 {
        self.value
    }
}

/// Floating-point gauge, stored as raw bits so updates stay lock-free
#[derive(Debug)]
pub struct GaugeF64 {
    bits: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeF64Snapshot {
    value: f64,
}

impl GaugeF64 {
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn update(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> GaugeF64Snapshot {
        GaugeF64Snapshot {
            value: self.value(),
        }
    }
}

impl Default for GaugeF64 {
    fn default() -> Self {
        Self::new()
    }
}

impl GaugeF64Snapshot {
    pub fn value(&self) -> f64 {
        self.value
    }
}
