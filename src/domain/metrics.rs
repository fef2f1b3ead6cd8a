//! In-process instrumentation primitives
//!
//! Counters, gauges, histograms, meters and timers are cheap to update from any
//! thread and expose immutable point-in-time snapshots. The [`Registry`] maps
//! names to live metrics and is read by the reporter on every flush.

mod counter;
mod ewma;
mod gauge;
mod healthcheck;
mod histogram;
mod meter;
mod registry;
mod sample;
mod timer;

pub use counter::{Counter, CounterSnapshot};
pub use ewma::Ewma;
pub use gauge::{Gauge, GaugeF64, GaugeF64Snapshot, GaugeSnapshot};
pub use healthcheck::Healthcheck;
pub use histogram::{Histogram, HistogramSnapshot};
pub use meter::{Meter, MeterSnapshot};
pub use registry::Registry;
pub use sample::{DEFAULT_RESERVOIR_SIZE, SampleSnapshot, UniformSample};
pub use timer::{Timer, TimerSnapshot};

use std::sync::Arc;

/// A registered metric.
///
/// Every reportable shape has its own variant. `Healthcheck` can live in a
/// registry next to the others but carries no numeric state to report.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    GaugeF64(Arc<GaugeF64>),
    Histogram(Arc<Histogram>),
    Meter(Arc<Meter>),
    Timer(Arc<Timer>),
    Healthcheck(Arc<Healthcheck>),
}

impl Metric {
    /// Short lowercase name of the metric kind, used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Metric::Counter(_) => "counter",
            Metric::Gauge(_) => "gauge",
            Metric::GaugeF64(_) => "gauge_f64",
            Metric::Histogram(_) => "histogram",
            Metric::Meter(_) => "meter",
            Metric::Timer(_) => "timer",
            Metric::Healthcheck(_) => "healthcheck",
        }
    }
}

impl From<Arc<Counter>> for Metric {
    fn from(m: Arc<Counter>) -> Self {
        Metric::Counter(m)
    }
}

impl From<Arc<Gauge>> for Metric {
    fn from(m: Arc<Gauge>) -> Self {
        Metric::Gauge(m)
    }
}

impl From<Arc<GaugeF64>> for Metric {
    fn from(m: Arc<GaugeF64>) -> Self {
        Metric::GaugeF64(m)
    }
}

impl From<Arc<Histogram>> for Metric {
    fn from(m: Arc<Histogram>) -> Self {
        Metric::Histogram(m)
    }
}

impl From<Arc<Meter>> for Metric {
    fn from(m: Arc<Meter>) -> Self {
        Metric::Meter(m)
    }
}

impl From<Arc<Timer>> for Metric {
    fn from(m: Arc<Timer>) -> Self {
        Metric::Timer(m)
    }
}

impl From<Arc<Healthcheck>> for Metric {
    fn from(m: Arc<Healthcheck>) -> Self {
        Metric::Healthcheck(m)
    }
}
