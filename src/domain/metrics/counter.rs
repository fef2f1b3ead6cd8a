use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic-by-convention signed counter
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

/// Read-only copy of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    count: i64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dec(&self, n: i64) {
        self.count.fetch_sub(n, Ordering::Relaxed);
    }

    /// Reset the count to zero
    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            count: self.count(),
        }
    }
}

impl CounterSnapshot {
    pub fn count(&self) -> i64 {
        self.count
    }
}
