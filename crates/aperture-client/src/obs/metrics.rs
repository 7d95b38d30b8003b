//! Minimal metrics registry for the flow control client.
//!
//! Counter/gauge/histogram families with dynamic labels backed by `DashMap`.
//! Label sets are flattened into sorted key vectors to keep rendering
//! deterministic. Histogram buckets are fixed in microseconds.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn series(name: &str, key: &LabelKey) -> String {
    if key.is_empty() {
        name.to_string()
    } else {
        format!("{name}{{{}}}", label_str(key))
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never incremented).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let _ = writeln!(out, "{} {}", series(name, r.key()), r.value().load(Ordering::Relaxed));
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn dec(&self, labels: &[(&str, &str)]) {
        self.add(labels, -1);
    }

    fn add(&self, labels: &[(&str, &str)], v: i64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge");
        for r in self.map.iter() {
            let _ = writeln!(out, "{} {}", series(name, r.key()), r.value().load(Ordering::Relaxed));
        }
    }
}

// 1ms .. 1s; the default check timeout (200ms) falls inside the range.
const BUCKET_COUNT: usize = 8;
const BUCKETS_MICROS: [u64; BUCKET_COUNT] = [1_000, 5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 1_000_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKET_COUNT],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self.map.entry(label_key(labels)).or_insert_with(AtomicHistogram::default);
        let micros = duration.as_micros() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        for (bucket, &le) in hist.buckets.iter().zip(BUCKETS_MICROS.iter()) {
            if micros <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for r in self.map.iter() {
            let hist = r.value();
            let labels = label_str(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
            let count = hist.count.load(Ordering::Relaxed);

            for (bucket, le) in hist.buckets.iter().zip(BUCKETS_MICROS) {
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {}", bucket.load(Ordering::Relaxed));
            }
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");
            let _ = writeln!(out, "{} {}", series(&format!("{name}_sum"), r.key()), hist.sum.load(Ordering::Relaxed));
            let _ = writeln!(out, "{} {count}", series(&format!("{name}_count"), r.key()));
        }
    }
}

/// Metrics shared by a client and every flow it creates.
#[derive(Default)]
pub struct ClientMetrics {
    /// `feature`
    pub flows_started: CounterVec,
    /// `decision`: `accepted` / `rejected`
    pub decisions: CounterVec,
    /// `reason`: `timeout` / `cancelled` / `transport` / `invalid_feature`
    pub fail_open: CounterVec,
    /// `status`: `Ok` / `Error`
    pub flows_ended: CounterVec,
    pub double_end: CounterVec,
    pub flows_in_flight: GaugeVec,
    /// Check round trip, microseconds.
    pub check_duration: HistogramVec,
}

impl ClientMetrics {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.flows_started.render("aperture_flows_started_total", &mut out);
        self.decisions.render("aperture_decisions_total", &mut out);
        self.fail_open.render("aperture_fail_open_total", &mut out);
        self.flows_ended.render("aperture_flows_ended_total", &mut out);
        self.double_end.render("aperture_flow_double_end_total", &mut out);
        self.flows_in_flight.render("aperture_flows_in_flight", &mut out);
        self.check_duration.render("aperture_check_duration_micros", &mut out);
        out
    }
}
