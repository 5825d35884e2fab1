//! Metrics collection for observability

use prometheus::{
    Counter, CounterVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Pipeline metrics
    pub check_requests: CounterVec,
    pub check_duration: Histogram,
    pub claim_verdicts: CounterVec,
    pub evidence_per_claim: Histogram,

    // Retrieval metrics
    pub retrieval_requests: CounterVec,

    // Oracle metrics
    pub oracle_requests: CounterVec,
    pub oracle_request_duration: HistogramVec,
    pub oracle_fallbacks: CounterVec,
    pub oracle_circuit_open: Counter,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let check_requests = register_counter_vec_with_registry!(
            Opts::new("factcheck_check_requests_total", "Total fact-check requests"),
            &["outcome"],
            registry
        )?;

        let check_duration = register_histogram_with_registry!(
            HistogramOpts::new(
                "factcheck_check_duration_seconds",
                "End-to-end fact-check duration in seconds"
            )
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
            registry
        )?;

        let claim_verdicts = register_counter_vec_with_registry!(
            Opts::new("factcheck_claim_verdicts_total", "Claim verdicts by label"),
            &["verdict"],
            registry
        )?;

        let evidence_per_claim = register_histogram_with_registry!(
            HistogramOpts::new(
                "factcheck_evidence_per_claim",
                "Fused evidence items retrieved per claim"
            )
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]),
            registry
        )?;

        let retrieval_requests = register_counter_vec_with_registry!(
            Opts::new("factcheck_retrieval_requests_total", "Retriever calls by outcome"),
            &["retriever", "status"],
            registry
        )?;

        let oracle_requests = register_counter_vec_with_registry!(
            Opts::new("factcheck_oracle_requests_total", "Language oracle calls"),
            &["task", "status"],
            registry
        )?;

        let oracle_request_duration = register_histogram_vec_with_registry!(
            "factcheck_oracle_request_duration_seconds",
            "Language oracle request duration in seconds",
            &["task"],
            registry
        )?;

        let oracle_fallbacks = register_counter_vec_with_registry!(
            Opts::new(
                "factcheck_oracle_fallbacks_total",
                "Pipeline steps that fell back after an oracle failure"
            ),
            &["task"],
            registry
        )?;

        let oracle_circuit_open = register_counter_with_registry!(
            Opts::new(
                "factcheck_oracle_circuit_open_total",
                "Oracle calls rejected by the circuit breaker"
            ),
            registry
        )?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            check_requests,
            check_duration,
            claim_verdicts,
            evidence_per_claim,
            retrieval_requests,
            oracle_requests,
            oracle_request_duration,
            oracle_fallbacks,
            oracle_circuit_open,
        })
    }

    /// Record a finished check
    pub fn record_check(&self, outcome: &str, seconds: f64) {
        self.check_requests.with_label_values(&[outcome]).inc();
        self.check_duration.observe(seconds);
    }

    /// Record one claim verdict
    pub fn record_claim_verdict(&self, verdict: &str, evidence_count: usize) {
        self.claim_verdicts.with_label_values(&[verdict]).inc();
        self.evidence_per_claim.observe(evidence_count as f64);
    }

    /// Record a retriever call
    pub fn record_retrieval(&self, retriever: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.retrieval_requests
            .with_label_values(&[retriever, status])
            .inc();
    }

    /// Record an oracle call outcome
    pub fn record_oracle(&self, task: &str, status: &str) {
        self.oracle_requests.with_label_values(&[task, status]).inc();
    }

    /// Record a pipeline fallback after an oracle failure
    pub fn record_fallback(&self, task: &str) {
        self.oracle_fallbacks.with_label_values(&[task]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_record_and_export() {
        let metrics = Metrics::new().unwrap();
        metrics.record_check("completed", 1.5);
        metrics.record_claim_verdict("True", 3);
        metrics.record_oracle("align", "success");
        metrics.record_fallback("rewrite");
        metrics.record_retrieval("vector", false);

        let text = metrics.export_prometheus();
        assert!(text.contains("factcheck_check_requests_total"));
        assert!(text.contains("factcheck_claim_verdicts_total"));
        assert!(text.contains("factcheck_oracle_fallbacks_total"));
    }
}
