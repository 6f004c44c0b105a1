use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::query::CompileReport;

/// Prometheus metrics for query compilation and search
#[derive(Clone)]
pub struct QueryMetrics {
    // Counters
    pub queries_compiled: Counter,
    pub clauses_skipped: Counter,
    pub clauses_ignored: Counter,
    pub searches_total: Counter,
    pub search_errors: Counter,

    // Histograms
    pub search_latency: Histogram,

    registry: Arc<Registry>,
}

impl QueryMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let queries_compiled = Counter::with_opts(Opts::new(
            "esquery_queries_compiled_total",
            "Total number of query trees compiled",
        ))?;
        registry.register(Box::new(queries_compiled.clone()))?;

        let clauses_skipped = Counter::with_opts(Opts::new(
            "esquery_clauses_skipped_total",
            "Leaf clauses dropped because they failed to decode",
        ))?;
        registry.register(Box::new(clauses_skipped.clone()))?;

        let clauses_ignored = Counter::with_opts(Opts::new(
            "esquery_clauses_ignored_total",
            "Keys ignored because they name no known clause",
        ))?;
        registry.register(Box::new(clauses_ignored.clone()))?;

        let searches_total = Counter::with_opts(Opts::new(
            "esquery_searches_total",
            "Total number of searches executed",
        ))?;
        registry.register(Box::new(searches_total.clone()))?;

        let search_errors = Counter::with_opts(Opts::new(
            "esquery_search_errors_total",
            "Total number of failed searches",
        ))?;
        registry.register(Box::new(search_errors.clone()))?;

        let search_latency = Histogram::with_opts(
            HistogramOpts::new("esquery_search_latency_seconds", "Search round-trip latency")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(search_latency.clone()))?;

        Ok(Self {
            queries_compiled,
            clauses_skipped,
            clauses_ignored,
            searches_total,
            search_errors,
            search_latency,
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record one compilation and what it dropped
    pub fn record_compile(&self, report: &CompileReport) {
        self.queries_compiled.inc();
        self.clauses_skipped.inc_by(report.skipped as f64);
        self.clauses_ignored.inc_by(report.ignored as f64);
    }

    /// Record a completed search
    pub fn record_search(&self, duration_secs: f64) {
        self.searches_total.inc();
        self.search_latency.observe(duration_secs);
    }

    pub fn record_search_error(&self) {
        self.search_errors.inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
