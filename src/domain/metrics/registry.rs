use super::{Counter, Gauge, GaugeF64, Histogram, Meter, Metric, Timer};
use crate::domain::errors::RegistryError;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe mapping from metric name to live metric.
///
/// Readers never block writers for longer than it takes to copy the entry
/// list, so hosts may register and unregister metrics while a reporter
/// iterates.
#[derive(Debug, Default)]
pub struct Registry {
    metrics: RwLock<HashMap<String, Metric>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metric` under `name`, failing if the name is taken
    pub fn register(
        &self,
        name: impl Into<String>,
        metric: impl Into<Metric>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        match self.write().entry(name) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateMetric {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(metric.into());
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.read().get(name).cloned()
    }

    /// Return the metric registered under `name`, registering `make()` first
    /// if there is none
    pub fn get_or_register(&self, name: &str, make: impl FnOnce() -> Metric) -> Metric {
        if let Some(metric) = self.get(name) {
            return metric;
        }
        self.write()
            .entry(name.to_string())
            .or_insert_with(make)
            .clone()
    }

    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.write().remove(name)
    }

    pub fn unregister_all(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Call `f` for every registered metric.
    ///
    /// Entries are copied under the read lock and visited after it is
    /// released; iteration order is unspecified.
    pub fn each(&self, mut f: impl FnMut(&str, &Metric)) {
        let entries: Vec<(String, Metric)> = self
            .read()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect();

        for (name, metric) in &entries {
            f(name, metric);
        }
    }

    /// Run every registered health check
    pub fn run_healthchecks(&self) {
        self.each(|_, metric| {
            if let Metric::Healthcheck(check) = metric {
                check.check();
            }
        });
    }

    pub fn counter(&self, name: &str) -> Result<Arc<Counter>, RegistryError> {
        let metric = self.get_or_register(name, || Metric::Counter(Arc::default()));
        match metric {
            Metric::Counter(m) => Ok(m),
            other => Err(mismatch(name, "counter", &other)),
        }
    }

    pub fn gauge(&self, name: &str) -> Result<Arc<Gauge>, RegistryError> {
        let metric = self.get_or_register(name, || Metric::Gauge(Arc::default()));
        match metric {
            Metric::Gauge(m) => Ok(m),
            other => Err(mismatch(name, "gauge", &other)),
        }
    }

    pub fn gauge_f64(&self, name: &str) -> Result<Arc<GaugeF64>, RegistryError> {
        let metric = self.get_or_register(name, || Metric::GaugeF64(Arc::default()));
        match metric {
            Metric::GaugeF64(m) => Ok(m),
            other => Err(mismatch(name, "gauge_f64", &other)),
        }
    }

    pub fn histogram(&self, name: &str) -> Result<Arc<Histogram>, RegistryError> {
        let metric = self.get_or_register(name, || Metric::Histogram(Arc::default()));
        match metric {
            Metric::Histogram(m) => Ok(m),
            other => Err(mismatch(name, "histogram", &other)),
        }
    }

    pub fn meter(&self, name: &str) -> Result<Arc<Meter>, RegistryError> {
        let metric = self.get_or_register(name, || Metric::Meter(Arc::default()));
        match metric {
            Metric::Meter(m) => Ok(m),
            other => Err(mismatch(name, "meter", &other)),
        }
    }

    pub fn timer(&self, name: &str) -> Result<Arc<Timer>, RegistryError> {
        let metric = self.get_or_register(name, || Metric::Timer(Arc::default()));
        match metric {
            Metric::Timer(m) => Ok(m),
            other => Err(mismatch(name, "timer", &other)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Metric>> {
        self.metrics.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Metric>> {
        self.metrics.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn mismatch(name: &str, expected: &'static str, found: &Metric) -> RegistryError {
    RegistryError::KindMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}
