use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref ADMITTED_TOTAL: Counter =
        register_counter!("rate_gate_admitted_total", "Total admitted operations").unwrap();
    pub static ref REJECTED_TOTAL: Counter =
        register_counter!("rate_gate_rejected_total", "Total rejected operations").unwrap();
    pub static ref SWEPT_TOTAL: Counter = register_counter!(
        "rate_gate_swept_total",
        "Total expired entries removed by the sweeper"
    )
    .unwrap();
    pub static ref STORE_ENTRIES: Gauge = register_gauge!(
        "rate_gate_store_entries",
        "Current number of entries in the limiter store"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "rate_gate_request_latency_seconds",
        "API request latency in seconds"
    )
    .unwrap();
}

// Render the default registry in prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metrics() {
        ADMITTED_TOTAL.inc();
        let text = render();
        assert!(text.contains("rate_gate_admitted_total"));
    }
}
