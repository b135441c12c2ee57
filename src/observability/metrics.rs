//! Metrics collection and exposition.
//!
//! # Metrics
//! - `qrmail_emails_total` (counter): email pipeline runs by outcome
//! - `qrmail_email_duration_seconds` (histogram): render + send latency
//! - `qrmail_artifacts_removed_total` (counter): cleanup results
//! - `qrmail_ledger_submissions_total` (counter): proof submissions by outcome
//! - `qrmail_ledger_confirmation_seconds` (histogram): broadcast → confirmation
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_email(outcome: &'static str, start: Instant) {
    metrics::counter!("qrmail_emails_total", "outcome" => outcome).increment(1);
    metrics::histogram!("qrmail_email_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_artifact_removal(result: &'static str) {
    metrics::counter!("qrmail_artifacts_removed_total", "result" => result).increment(1);
}

pub fn record_ledger_submission(outcome: &'static str) {
    metrics::counter!("qrmail_ledger_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_confirmation_wait(start: Instant) {
    metrics::histogram!("qrmail_ledger_confirmation_seconds").record(start.elapsed().as_secs_f64());
}
