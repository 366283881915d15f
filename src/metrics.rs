use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};

/// Initialize the Prometheus metrics recorder and return the handle for scraping.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        "config_reloads_total",
        "Total number of configuration reload operations"
    );
    describe_histogram!(
        "config_reload_duration_seconds",
        "Configuration reload duration in seconds"
    );
    describe_counter!(
        "config_resolutions_total",
        "Total number of metadata resolutions by outcome"
    );
    describe_gauge!(
        "config_sources_loaded",
        "Number of configuration sources in the published index"
    );

    // Initialize counters with zero so they appear in output immediately
    counter!("config_reloads_total", "success" => "true").absolute(0);
    counter!("config_reloads_total", "success" => "false").absolute(0);
    for outcome in ["matched", "default", "not_found", "internal"] {
        counter!("config_resolutions_total", "outcome" => outcome).absolute(0);
    }

    Ok(handle)
}

/// Record an HTTP request with its method, path, status, and duration.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record a config reload attempt.
pub fn record_reload(success: bool, duration: Duration) {
    let labels = [("success", success.to_string())];
    counter!("config_reloads_total", &labels).increment(1);
    histogram!("config_reload_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record the outcome of one resolution.
pub fn record_resolution(outcome: &'static str) {
    counter!("config_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_sources_loaded(count: usize) {
    gauge!("config_sources_loaded").set(count as f64);
}

/// Measures one request; recorded by [`RequestTimer::finish`] once the status is known.
pub struct RequestTimer {
    start: Instant,
    method: &'static str,
    path: &'static str,
}

impl RequestTimer {
    pub fn new(method: &'static str, path: &'static str) -> Self {
        Self {
            start: Instant::now(),
            method,
            path,
        }
    }

    pub fn finish(self, status: u16) {
        record_request(self.method, self.path, status, self.start.elapsed());
    }
}
