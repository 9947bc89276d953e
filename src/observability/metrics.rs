//! Export metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! macros are no-ops, so library users and tests pay nothing.

use crate::export::ExportSummary;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Export attempts, labelled by `outcome`.
pub const EXPORT_REQUESTS: &str = "ground_export_requests_total";
/// Data rows written.
pub const EXPORT_ROWS: &str = "ground_export_rows_total";
/// Observations dropped for lack of a matching feature.
pub const EXPORT_ORPHANS: &str = "ground_export_orphaned_observations_total";
/// Wall time from prepare to stream close.
pub const EXPORT_DURATION: &str = "ground_export_duration_seconds";

/// Installs the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called at most once per process.
pub fn install_prometheus(listen: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()
        .map_err(|e| Error::operation("metrics_install", e))?;
    tracing::info!(%listen, "Prometheus metrics listener installed");
    Ok(())
}

/// Outcome label for an export that ended in `error`.
#[must_use]
pub const fn outcome_label(error: &Error) -> &'static str {
    match error {
        Error::ProjectNotFound(_) => "not_found",
        Error::InvalidInput(_) | Error::AmbiguousForm { .. } => "rejected",
        Error::StreamWrite(_) => "aborted",
        Error::OperationFailed { .. } => "failed",
    }
}

/// Counts an export attempt that ended with `outcome`.
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!(EXPORT_REQUESTS, "outcome" => outcome).increment(1);
}

/// Records a completed export.
pub fn record_export(summary: &ExportSummary, elapsed: Duration) {
    record_outcome("ok");
    metrics::counter!(EXPORT_ROWS).increment(summary.rows_written as u64);
    metrics::counter!(EXPORT_ORPHANS).increment(summary.orphaned_observations as u64);
    metrics::histogram!(EXPORT_DURATION).record(elapsed.as_secs_f64());
    tracing::info!(
        project_id = %summary.project_id,
        rows = summary.rows_written,
        columns = summary.columns,
        orphaned = summary.orphaned_observations,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "Export complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Error::ProjectNotFound("p".into()), "not_found")]
    #[test_case(Error::InvalidInput("x".into()), "rejected")]
    #[test_case(Error::AmbiguousForm { layer_id: "l".into(), count: 2 }, "rejected")]
    #[test_case(Error::StreamWrite("closed".into()), "aborted")]
    #[test_case(Error::operation("fetch_project", "connection reset"), "failed")]
    fn test_outcome_label(error: Error, expected: &str) {
        assert_eq!(outcome_label(&error), expected);
    }
}
