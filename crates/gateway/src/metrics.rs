use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// Request metrics for `POST /detect`. Recording is a no-op until a meter
/// provider is installed.
#[derive(Clone)]
pub struct DetectMetrics {
    duration: Histogram<f64>,
    requests: Counter<u64>,
    rejected: Counter<u64>,
    failures: Counter<u64>,
    detections: Counter<u64>,
}

impl DetectMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        Self {
            duration: meter
                .f64_histogram("detect_duration_seconds")
                .with_description("Time to serve a detection request (upload to response)")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            requests: meter
                .u64_counter("detect_requests_total")
                .with_description("Detection requests received")
                .build(),
            rejected: meter
                .u64_counter("detect_rejected_total")
                .with_description("Requests rejected with a client error")
                .build(),
            failures: meter
                .u64_counter("detect_failures_total")
                .with_description("Requests that failed with a server error")
                .build(),
            detections: meter
                .u64_counter("detect_detections_total")
                .with_description("Objects returned across all requests")
                .build(),
        }
    }

    pub fn record_request(&self) {
        self.requests.add(1, &[]);
    }

    pub fn record_success(&self, elapsed_secs: f64, detections: usize) {
        self.duration
            .record(elapsed_secs, &[KeyValue::new("outcome", "success")]);
        self.detections.add(detections as u64, &[]);
    }

    pub fn record_rejected(&self, reason: &'static str) {
        self.rejected.add(1, &[KeyValue::new("reason", reason)]);
    }

    pub fn record_failure(&self, elapsed_secs: f64) {
        self.duration
            .record(elapsed_secs, &[KeyValue::new("outcome", "failure")]);
        self.failures.add(1, &[]);
    }
}
