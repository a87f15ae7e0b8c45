//! Request metrics in Prometheus text format.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency by method, route
//!
//! The recorder lives in [`HttpMetrics`] rather than being installed as the
//! global recorder, so each router instance owns its own registry.

use std::time::Duration;

use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Histogram buckets in seconds.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub struct HttpMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), LATENCY_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();
        Ok(Self { recorder, handle })
    }

    /// Count one finished request and observe its latency.
    pub fn observe(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let method = method.to_string();
        let path = path.to_string();

        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(
                REQUESTS_TOTAL,
                "method" => method.clone(),
                "path" => path.clone(),
                "status" => status.to_string()
            )
            .increment(1);

            metrics::histogram!(
                REQUEST_DURATION,
                "method" => method,
                "path" => path
            )
            .record(elapsed.as_secs_f64());
        });
    }

    /// Current state of every metric in the scrape text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Sum of all `http_requests_total` samples in a scrape.
#[cfg(test)]
pub fn requests_total(scrape: &str) -> u64 {
    let prefix = format!("{REQUESTS_TOTAL}{{");
    scrape
        .lines()
        .filter(|line| line.starts_with(&prefix))
        .filter_map(|line| line.rsplit(' ').next())
        .filter_map(|value| value.parse::<u64>().ok())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_label_set() {
        let metrics = HttpMetrics::new().unwrap();
        metrics.observe("GET", "/health", 200, Duration::from_millis(2));
        metrics.observe("GET", "/health", 200, Duration::from_millis(3));
        metrics.observe("POST", "/products", 401, Duration::from_millis(1));

        let scrape = metrics.render();
        assert!(scrape.contains(
            r#"http_requests_total{method="GET",path="/health",status="200"} 2"#
        ));
        assert!(scrape.contains(
            r#"http_requests_total{method="POST",path="/products",status="401"} 1"#
        ));
        assert_eq!(requests_total(&scrape), 3);
    }

    #[test]
    fn latency_uses_fixed_buckets() {
        let metrics = HttpMetrics::new().unwrap();
        metrics.observe("GET", "/", 200, Duration::from_millis(30));

        let scrape = metrics.render();
        assert!(scrape.contains(r#"http_request_duration_seconds_bucket{method="GET",path="/",le="0.05"} 1"#));
        assert!(scrape.contains(r#"http_request_duration_seconds_bucket{method="GET",path="/",le="0.025"} 0"#));
    }

    #[test]
    fn registries_are_independent() {
        let a = HttpMetrics::new().unwrap();
        let b = HttpMetrics::new().unwrap();
        a.observe("GET", "/", 200, Duration::ZERO);
        assert_eq!(requests_total(&a.render()), 1);
        assert_eq!(requests_total(&b.render()), 0);
    }
}
