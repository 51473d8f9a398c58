//! Metrics recording for store operations.

use std::time::Instant;

/// Records the count and latency of a store operation.
///
/// Emits `geolog_store_operations_total` and
/// `geolog_store_operation_duration_ms`, both labelled by backend,
/// operation and status (`"success"` or `"error"`).
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "geolog_store_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "geolog_store_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to the status label used by [`record_operation_metrics`].
pub const fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_record_operation_metrics_renders_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_operation_metrics("sqlite", "insert", Instant::now(), "success");
            record_operation_metrics("sqlite", "find_by_id", Instant::now(), "error");
        });

        let rendered = handle.render();
        assert!(rendered.contains("geolog_store_operations_total"));
        assert!(rendered.contains("operation=\"insert\""));
        assert!(rendered.contains("status=\"error\""));
    }

    #[test]
    fn test_status_label() {
        let ok: Result<(), ()> = Ok(());
        let err: Result<(), ()> = Err(());
        assert_eq!(status_label(&ok), "success");
        assert_eq!(status_label(&err), "error");
    }
}
