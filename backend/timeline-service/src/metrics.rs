//! Prometheus metrics for timeline assembly and caching

use prometheus::{CounterVec, Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<TimelineMetricsInner> = OnceLock::new();

struct TimelineMetricsInner {
    cache_hits: CounterVec,
    cache_misses: CounterVec,
    cache_writes: CounterVec,
    cache_invalidations: CounterVec,
    cache_errors: CounterVec,
    fanout_size: Histogram,
    assembly_failures: IntCounter,
}

impl TimelineMetricsInner {
    fn new() -> Self {
        Self {
            cache_hits: CounterVec::new(
                Opts::new("timeline_cache_hits_total", "Total timeline cache hits"),
                &["backend"],
            )
            .expect("valid metric definition"),
            cache_misses: CounterVec::new(
                Opts::new("timeline_cache_misses_total", "Total timeline cache misses"),
                &["backend"],
            )
            .expect("valid metric definition"),
            cache_writes: CounterVec::new(
                Opts::new("timeline_cache_writes_total", "Total timeline cache writes"),
                &["backend"],
            )
            .expect("valid metric definition"),
            cache_invalidations: CounterVec::new(
                Opts::new(
                    "timeline_cache_invalidations_total",
                    "Total timeline cache invalidations",
                ),
                &["backend"],
            )
            .expect("valid metric definition"),
            cache_errors: CounterVec::new(
                Opts::new("timeline_cache_errors_total", "Total timeline cache errors"),
                &["backend", "op", "error_type"],
            )
            .expect("valid metric definition"),
            fanout_size: Histogram::with_opts(
                HistogramOpts::new(
                    "timeline_assembly_fanout_size",
                    "Number of authors fetched per timeline assembly",
                )
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
            )
            .expect("valid metric definition"),
            assembly_failures: IntCounter::new(
                "timeline_assembly_failures_total",
                "Timeline assemblies aborted by a failed fetch",
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.cache_hits.clone()))?;
        registry.register(Box::new(self.cache_misses.clone()))?;
        registry.register(Box::new(self.cache_writes.clone()))?;
        registry.register(Box::new(self.cache_invalidations.clone()))?;
        registry.register(Box::new(self.cache_errors.clone()))?;
        registry.register(Box::new(self.fanout_size.clone()))?;
        registry.register(Box::new(self.assembly_failures.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static TimelineMetricsInner {
    METRICS.get_or_init(TimelineMetricsInner::new)
}

/// Register all timeline metrics with a Prometheus registry
pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
    get_metrics().register(registry)
}

/// Per-backend cache metrics handle
#[derive(Clone, Copy, Debug)]
pub struct CacheMetrics {
    backend: &'static str,
}

impl CacheMetrics {
    pub fn new(backend: &'static str) -> Self {
        Self { backend }
    }

    pub fn record_hit(&self) {
        get_metrics()
            .cache_hits
            .with_label_values(&[self.backend])
            .inc();
    }

    pub fn record_miss(&self) {
        get_metrics()
            .cache_misses
            .with_label_values(&[self.backend])
            .inc();
    }

    pub fn record_write(&self) {
        get_metrics()
            .cache_writes
            .with_label_values(&[self.backend])
            .inc();
    }

    pub fn record_invalidation(&self) {
        get_metrics()
            .cache_invalidations
            .with_label_values(&[self.backend])
            .inc();
    }

    pub fn record_error(&self, op: &str, error_type: &str) {
        get_metrics()
            .cache_errors
            .with_label_values(&[self.backend, op, error_type])
            .inc();
    }
}

pub fn record_fanout(authors: usize) {
    get_metrics().fanout_size.observe(authors as f64);
}

pub fn record_assembly_failure() {
    get_metrics().assembly_failures.inc();
}
