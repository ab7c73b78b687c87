//! Prometheus metrics for ingestion, evaluation and alert transitions.
//!
//! Recording goes through the `metrics` facade, so it costs nothing when no
//! recorder is installed. [`EngineMetrics::new`] with `enabled = true` installs
//! the process-wide Prometheus recorder once and keeps its handle for
//! rendering.
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `beacon_records_ingested_total` | counter | `kind` |
//! | `beacon_evaluations_total` | counter | `domain`, `tier` |
//! | `beacon_evaluation_errors_total` | counter | `domain`, `error` |
//! | `beacon_alert_transitions_total` | counter | `domain`, `transition` |
//! | `beacon_alerts_live` | gauge | |

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::{
    errors::EngineError,
    types::{Domain, RecordKind},
};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn init_prometheus_recorder() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to install primary Prometheus recorder, attempting fallback"
                );
                let recorder = PrometheusBuilder::new().build_recorder();
                tracing::warn!(
                    "Using fallback Prometheus recorder (install error: {e}) - metrics may not be globally visible"
                );
                recorder.handle()
            }
        })
        .clone()
}

/// Records engine activity and renders it in Prometheus text format.
#[derive(Clone, Default)]
pub struct EngineMetrics {
    handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for EngineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineMetrics").field("prometheus", &self.handle.is_some()).finish()
    }
}

impl EngineMetrics {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { handle: enabled.then(init_prometheus_recorder) }
    }

    /// Metrics without an exporter. Recording is a no-op unless some other
    /// recorder is installed.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    pub fn record_ingested(&self, kind: RecordKind) {
        counter!("beacon_records_ingested_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_evaluation(&self, domain: Domain, tier: &str) {
        counter!(
            "beacon_evaluations_total",
            "domain" => domain.as_str(),
            "tier" => tier.to_string()
        )
        .increment(1);
    }

    pub fn record_evaluation_error(&self, domain: Domain, error: &EngineError) {
        counter!(
            "beacon_evaluation_errors_total",
            "domain" => domain.as_str(),
            "error" => error.as_metric_str()
        )
        .increment(1);
    }

    pub fn record_alert_transition(&self, domain: Domain, transition: &'static str) {
        counter!(
            "beacon_alert_transitions_total",
            "domain" => domain.as_str(),
            "transition" => transition
        )
        .increment(1);
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn set_live_alerts(&self, live: usize) {
        gauge!("beacon_alerts_live").set(live as f64);
    }

    /// Prometheus text exposition, or `None` when the exporter is disabled.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_metrics_do_not_render() {
        let metrics = EngineMetrics::disabled();
        metrics.record_ingested(RecordKind::Occupancy);
        metrics.set_live_alerts(3);

        assert!(!metrics.is_enabled());
        assert!(metrics.render().is_none());
    }

    #[test]
    fn test_enabled_metrics_render_text() {
        let metrics = EngineMetrics::new(true);
        metrics.record_ingested(RecordKind::Billing);
        metrics.record_evaluation(Domain::Fraud, "HIGH");
        metrics.record_alert_transition(Domain::Fraud, "opened");

        assert!(metrics.is_enabled());
        assert!(metrics.render().is_some());
    }
}
