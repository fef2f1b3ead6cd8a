//! Metric snapshot to record encoding
//!
//! Every reportable metric becomes exactly one point named
//! `<name>.<suffix>` whose field set depends only on the metric kind:
//!
//! | kind        | suffix      | fields                                                  |
//! |-------------|-------------|---------------------------------------------------------|
//! | counter     | `count`     | `value`                                                 |
//! | gauge       | `gauge`     | `value`                                                 |
//! | histogram   | `histogram` | `count max mean min stddev variance p50..p9999`         |
//! | meter       | `meter`     | `count m1 m5 m15 mean`                                  |
//! | timer       | `timer`     | histogram fields + `m1 m5 m15 meanrate`                 |
//!
//! Health checks carry no numbers and are skipped.

use crate::domain::errors::PointError;
use crate::domain::metrics::{HistogramSnapshot, MeterSnapshot, Metric, TimerSnapshot};
use crate::domain::point::{FieldValue, Point};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Quantiles reported for histograms and timers
pub const PERCENTILES: [f64; 6] = [0.5, 0.75, 0.95, 0.99, 0.999, 0.9999];

/// Field names for [`PERCENTILES`], positionally
pub const PERCENTILE_FIELDS: [&str; 6] = ["p50", "p75", "p95", "p99", "p999", "p9999"];

pub type Fields = BTreeMap<String, FieldValue>;

/// Encode one metric.
///
/// Returns `None` for kinds that are not reported, otherwise the point or the
/// reason it could not be built.
pub fn encode(
    name: &str,
    metric: &Metric,
    tags: &BTreeMap<String, String>,
    now: DateTime<Utc>,
) -> Option<Result<Point, PointError>> {
    let (suffix, fields) = match metric {
        Metric::Counter(m) => ("count", value_fields(m.snapshot().count().into())),
        Metric::Gauge(m) => ("gauge", value_fields(m.snapshot().value().into())),
        Metric::GaugeF64(m) => ("gauge", value_fields(m.snapshot().value().into())),
        Metric::Histogram(m) => ("histogram", histogram_fields(&m.snapshot())),
        Metric::Meter(m) => ("meter", meter_fields(&m.snapshot())),
        Metric::Timer(m) => ("timer", timer_fields(&m.snapshot())),
        Metric::Healthcheck(_) => return None,
    };

    Some(Point::new(
        format!("{name}.{suffix}"),
        tags.clone(),
        fields,
        now,
    ))
}

pub fn value_fields(value: FieldValue) -> Fields {
    Fields::from([("value".to_string(), value)])
}

pub fn histogram_fields(snapshot: &HistogramSnapshot) -> Fields {
    let mut fields = distribution_fields(
        snapshot.count(),
        snapshot.max(),
        snapshot.mean(),
        snapshot.min(),
        snapshot.std_dev(),
        snapshot.variance(),
    );
    insert_percentiles(&mut fields, &snapshot.percentiles(&PERCENTILES));
    fields
}

pub fn meter_fields(snapshot: &MeterSnapshot) -> Fields {
    Fields::from([
        ("count".to_string(), snapshot.count().into()),
        ("m1".to_string(), snapshot.rate1().into()),
        ("m5".to_string(), snapshot.rate5().into()),
        ("m15".to_string(), snapshot.rate15().into()),
        ("mean".to_string(), snapshot.rate_mean().into()),
    ])
}

pub fn timer_fields(snapshot: &TimerSnapshot) -> Fields {
    let mut fields = distribution_fields(
        snapshot.count(),
        snapshot.max(),
        snapshot.mean(),
        snapshot.min(),
        snapshot.std_dev(),
        snapshot.variance(),
    );
    insert_percentiles(&mut fields, &snapshot.percentiles(&PERCENTILES));
    // the lifetime mean rate is `meanrate` here since `mean` is the duration mean
    fields.insert("m1".to_string(), snapshot.rate1().into());
    fields.insert("m5".to_string(), snapshot.rate5().into());
    fields.insert("m15".to_string(), snapshot.rate15().into());
    fields.insert("meanrate".to_string(), snapshot.rate_mean().into());
    fields
}

fn distribution_fields(
    count: i64,
    max: i64,
    mean: f64,
    min: i64,
    std_dev: f64,
    variance: f64,
) -> Fields {
    Fields::from([
        ("count".to_string(), count.into()),
        ("max".to_string(), max.into()),
        ("mean".to_string(), mean.into()),
        ("min".to_string(), min.into()),
        ("stddev".to_string(), std_dev.into()),
        ("variance".to_string(), variance.into()),
    ])
}

fn insert_percentiles(fields: &mut Fields, values: &[f64]) {
    for (key, value) in PERCENTILE_FIELDS.iter().zip(values) {
        fields.insert(key.to_string(), (*value).into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{
        Counter, Gauge, GaugeF64, Healthcheck, Histogram, Meter, SampleSnapshot, Timer,
    };
    use std::sync::Arc;

    fn keys(point: &Point) -> Vec<&str> {
        point.fields().keys().map(String::as_str).collect()
    }

    fn tags() -> BTreeMap<String, String> {
        BTreeMap::from([("host".to_string(), "web-1".to_string())])
    }

    fn encode_ok(name: &str, metric: Metric) -> Point {
        encode(name, &metric, &tags(), Utc::now())
            .expect("metric kind should be reported")
            .expect("point should be valid")
    }

    #[test]
    fn test_counter_record() {
        let counter = Arc::new(Counter::new());
        counter.inc(42);

        let point = encode_ok("requests", Metric::Counter(counter));
        assert_eq!(point.measurement(), "requests.count");
        assert_eq!(keys(&point), vec!["value"]);
        assert_eq!(point.field("value"), Some(FieldValue::Integer(42)));
        assert_eq!(point.tags(), &tags());
    }

    #[test]
    fn test_gauge_records() {
        let gauge = Arc::new(Gauge::new());
        gauge.update(-7);
        let point = encode_ok("queue", Metric::Gauge(gauge));
        assert_eq!(point.measurement(), "queue.gauge");
        assert_eq!(point.field("value"), Some(FieldValue::Integer(-7)));

        let gauge = Arc::new(GaugeF64::new());
        gauge.update(3.5);
        let point = encode_ok("temp", Metric::GaugeF64(gauge));
        assert_eq!(point.measurement(), "temp.gauge");
        assert_eq!(keys(&point), vec!["value"]);
        assert_eq!(point.field("value"), Some(FieldValue::Float(3.5)));
    }

    #[test]
    fn test_histogram_record_field_set() {
        let histogram = Arc::new(Histogram::new());
        for v in 1..=100 {
            histogram.update(v);
        }

        let point = encode_ok("sizes", Metric::Histogram(histogram));
        assert_eq!(point.measurement(), "sizes.histogram");
        assert_eq!(
            keys(&point),
            vec![
                "count", "max", "mean", "min", "p50", "p75", "p95", "p99", "p999", "p9999",
                "stddev", "variance"
            ]
        );
        assert_eq!(point.field("count"), Some(FieldValue::Integer(100)));
        assert_eq!(point.field("min"), Some(FieldValue::Integer(1)));
        assert_eq!(point.field("max"), Some(FieldValue::Integer(100)));
        assert_eq!(point.field("p50"), Some(FieldValue::Float(50.5)));
    }

    #[test]
    fn test_percentiles_map_positionally() {
        // 10000 distinct values so each quantile lands on a different rank
        let values: Vec<i64> = (1..=10_000).collect();
        let snapshot = HistogramSnapshot::new(SampleSnapshot::new(10_000, values));
        let expected = snapshot.percentiles(&PERCENTILES);

        let fields = histogram_fields(&snapshot);
        for (key, value) in PERCENTILE_FIELDS.iter().zip(&expected) {
            assert_eq!(fields[*key], FieldValue::Float(*value), "{key}");
        }
        let p50 = fields["p50"].as_f64();
        let p75 = fields["p75"].as_f64();
        let p9999 = fields["p9999"].as_f64();
        assert!(p50 < p75 && p75 < p9999);
    }

    #[test]
    fn test_meter_record_field_set() {
        let meter = Arc::new(Meter::new());
        meter.mark(3);

        let point = encode_ok("logins", Metric::Meter(meter));
        assert_eq!(point.measurement(), "logins.meter");
        assert_eq!(keys(&point), vec!["count", "m1", "m15", "m5", "mean"]);
        assert_eq!(point.field("count"), Some(FieldValue::Integer(3)));
    }

    #[test]
    fn test_timer_record_fields() {
        let histogram = HistogramSnapshot::new(SampleSnapshot::new(
            10,
            vec![1, 1, 1, 1, 1, 1, 1, 1, 2, 2],
        ));
        let meter = MeterSnapshot::new(10, 0.1, 0.05, 0.02, 0.5);
        let fields = timer_fields(&TimerSnapshot::new(histogram, meter));

        assert_eq!(fields.len(), 16);
        assert_eq!(fields["count"], FieldValue::Integer(10));
        assert!((fields["mean"].as_f64() - 1.2).abs() < 1e-9);
        assert_eq!(fields["m1"], FieldValue::Float(0.1));
        assert_eq!(fields["m5"], FieldValue::Float(0.05));
        assert_eq!(fields["m15"], FieldValue::Float(0.02));
        assert_eq!(fields["meanrate"], FieldValue::Float(0.5));
        for key in [
            "max", "min", "stddev", "variance", "p50", "p75", "p95", "p99", "p999", "p9999",
        ] {
            assert!(fields.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_timer_record_name() {
        let timer = Arc::new(Timer::new());
        timer.update(std::time::Duration::from_millis(1));
        let point = encode_ok("latency", Metric::Timer(timer));
        assert_eq!(point.measurement(), "latency.timer");
        assert_eq!(point.fields().len(), 16);
    }

    #[test]
    fn test_healthcheck_is_skipped() {
        let check = Arc::new(Healthcheck::new(|h| h.healthy()));
        assert!(encode("db", &Metric::Healthcheck(check), &tags(), Utc::now()).is_none());
    }

    #[test]
    fn test_non_finite_gauge_is_an_error() {
        let gauge = Arc::new(GaugeF64::new());
        gauge.update(f64::NAN);
        let result = encode("temp", &Metric::GaugeF64(gauge), &tags(), Utc::now());
        assert!(matches!(
            result,
            Some(Err(PointError::UnsupportedFieldValue { .. }))
        ));
    }
}
