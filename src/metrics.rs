//! Hand-rolled metrics collector: counters, gauges, and histograms with
//! Prometheus-text and JSON export.
//!
//! No external metrics crate appears anywhere in the dependency set, so
//! this follows the teacher's house style for shared mutable state:
//! plain structs behind explicit `Mutex`/`RwLock` guards, the same shape
//! as `resilience::RetryInfo`/`RetryResult`, rather than reaching for an
//! unvetted crate.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// Exponential histogram buckets, seconds: 0.005 .. 10.0 (12 buckets).
const HISTOGRAM_BUCKETS: &[f64] =
    &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Debug, Default)]
struct Counter {
    value: u64,
}

#[derive(Debug, Default)]
struct Gauge {
    value: f64,
}

#[derive(Debug, Default)]
struct Histogram {
    bucket_counts: Vec<u64>,
    sum: f64,
    count: u64,
    samples: Vec<f64>,
}

impl Histogram {
    fn new() -> Self {
        Self { bucket_counts: vec![0; HISTOGRAM_BUCKETS.len()], sum: 0.0, count: 0, samples: Vec::new() }
    }

    fn observe(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.samples.push(value);
        for (i, bound) in HISTOGRAM_BUCKETS.iter().enumerate() {
            if value <= *bound {
                self.bucket_counts[i] += 1;
            }
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

/// Process-wide metrics collector. Every public method takes labels as
/// plain strings; this keeps the type simple at the cost of not
/// validating label cardinality, acceptable for a bounded label space
/// (HTTP status classes, tool names, hosts).
#[derive(Default)]
pub struct Metrics {
    counters: RwLock<HashMap<String, Counter>>,
    gauges: RwLock<HashMap<String, Gauge>>,
    histograms: Mutex<HashMap<String, Histogram>>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn incr(&self, key: impl Into<String>, by: u64) {
        let mut counters = self.counters.write().expect("metrics counters lock poisoned");
        counters.entry(key.into()).or_default().value += by;
    }

    fn set_gauge(&self, key: impl Into<String>, value: f64) {
        let mut gauges = self.gauges.write().expect("metrics gauges lock poisoned");
        gauges.entry(key.into()).or_default().value = value;
    }

    fn observe(&self, key: impl Into<String>, value: f64) {
        let mut histograms = self.histograms.lock().expect("metrics histograms lock poisoned");
        histograms.entry(key.into()).or_insert_with(Histogram::new).observe(value);
    }

    // ---- Mandatory instrumentation points ----

    pub fn record_tool_call_start(&self, tool: &str) {
        self.incr(format!("tool_call_started_total{{tool=\"{tool}\"}}"), 1);
    }

    pub fn record_tool_call(&self, tool: &str, is_error: bool, elapsed_secs: f64) {
        let status = if is_error { "error" } else { "ok" };
        self.incr(format!("tool_call_completed_total{{tool=\"{tool}\",status=\"{status}\"}}"), 1);
        self.observe(format!("tool_call_duration_seconds{{tool=\"{tool}\"}}"), elapsed_secs);
    }

    pub fn record_http(&self, host: &str, status_class: &str, elapsed_secs: f64, is_error: bool) {
        self.incr(
            format!("http_requests_total{{host=\"{host}\",status_class=\"{status_class}\"}}"),
            1,
        );
        if is_error {
            self.incr(format!("http_errors_total{{host=\"{host}\"}}"), 1);
        }
        self.observe(format!("http_request_duration_seconds{{host=\"{host}\"}}"), elapsed_secs);
    }

    pub fn record_pagination_page(&self, tool: &str, items: u64, elapsed_secs: f64) {
        self.incr(format!("pagination_pages_total{{tool=\"{tool}\"}}"), 1);
        self.incr(format!("pagination_items_total{{tool=\"{tool}\"}}"), items);
        self.observe(format!("pagination_page_duration_seconds{{tool=\"{tool}\"}}"), elapsed_secs);
    }

    pub fn record_registry_load(&self, operations: u64, products: u64, skipped: u64) {
        self.set_gauge("registry_operations", operations as f64);
        self.set_gauge("registry_products", products as f64);
        self.incr("registry_specs_skipped_total", skipped);
    }

    pub fn record_cache_hit(&self) {
        self.incr("cache_hits_total", 1);
    }

    pub fn record_cache_miss(&self) {
        self.incr("cache_misses_total", 1);
    }

    pub fn record_retry_attempt(&self, outcome: &str) {
        self.incr(format!("retry_attempts_total{{outcome=\"{outcome}\"}}"), 1);
    }

    pub fn record_breaker_transition(&self, host: &str, to_state: &str) {
        self.incr(format!("circuit_breaker_transitions_total{{host=\"{host}\",state=\"{to_state}\"}}"), 1);
    }

    pub fn set_inflight(&self, count: i64) {
        self.set_gauge("inflight_tool_calls", count as f64);
    }

    pub fn record_process_start(&self) {
        self.incr("process_starts_total", 1);
    }

    /// Prometheus exposition text format.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        {
            let counters = self.counters.read().expect("metrics counters lock poisoned");
            out.push_str("# TYPE counters counter\n");
            for (name, c) in counters.iter() {
                out.push_str(&format!("{name} {}\n", c.value));
            }
        }
        {
            let gauges = self.gauges.read().expect("metrics gauges lock poisoned");
            out.push_str("# TYPE gauges gauge\n");
            for (name, g) in gauges.iter() {
                out.push_str(&format!("{name} {}\n", g.value));
            }
        }
        {
            let histograms = self.histograms.lock().expect("metrics histograms lock poisoned");
            out.push_str("# TYPE histograms histogram\n");
            for (name, h) in histograms.iter() {
                for (bound, count) in HISTOGRAM_BUCKETS.iter().zip(h.bucket_counts.iter()) {
                    out.push_str(&format!("{name}_bucket{{le=\"{bound}\"}} {count}\n"));
                }
                out.push_str(&format!("{name}_count {}\n", h.count));
                out.push_str(&format!("{name}_sum {}\n", h.sum));
            }
        }
        out
    }

    /// JSON export with derived percentiles.
    #[must_use]
    pub fn render_json(&self) -> serde_json::Value {
        let counters: HashMap<String, u64> = self
            .counters
            .read()
            .expect("metrics counters lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.value))
            .collect();
        let gauges: HashMap<String, f64> = self
            .gauges
            .read()
            .expect("metrics gauges lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.value))
            .collect();
        let histograms: HashMap<String, serde_json::Value> = self
            .histograms
            .lock()
            .expect("metrics histograms lock poisoned")
            .iter()
            .map(|(k, h)| {
                let min = h.samples.iter().copied().fold(f64::INFINITY, f64::min);
                let max = h.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let avg = if h.count > 0 { h.sum / h.count as f64 } else { 0.0 };
                (
                    k.clone(),
                    serde_json::json!({
                        "count": h.count,
                        "sum": h.sum,
                        "min": if h.count > 0 { min } else { 0.0 },
                        "max": if h.count > 0 { max } else { 0.0 },
                        "avg": avg,
                        "p50": h.percentile(0.50),
                        "p95": h.percentile(0.95),
                        "p99": h.percentile(0.99),
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "counters": counters,
            "gauges": gauges,
            "histograms": histograms,
        })
    }
}
