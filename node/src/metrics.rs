//! # Prometheus Metrics
//!
//! Exposes operational metrics for the ledger node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `tally` prefix so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are reference counted) so it can be
/// shared across request handlers and the notifier.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Committed actions, by action name.
    pub actions_applied_total: IntCounterVec,
    /// Rejected actions, by error kind.
    pub actions_rejected_total: IntCounterVec,
    /// Transfer notices delivered to accounts.
    pub transfer_notices_total: IntCounter,
    /// Accounts currently known to the host.
    pub registered_accounts: IntGauge,
    /// Time spent executing one action, in seconds.
    pub action_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    ///
    /// # Errors
    ///
    /// Fails only if a metric definition is invalid or registered twice.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tally".into()), None)?;

        let actions_applied_total = IntCounterVec::new(
            Opts::new("actions_applied_total", "Total number of committed actions"),
            &["action"],
        )?;
        registry.register(Box::new(actions_applied_total.clone()))?;

        let actions_rejected_total = IntCounterVec::new(
            Opts::new("actions_rejected_total", "Total number of rejected actions"),
            &["kind"],
        )?;
        registry.register(Box::new(actions_rejected_total.clone()))?;

        let transfer_notices_total = IntCounter::new(
            "transfer_notices_total",
            "Total number of transfer notices delivered",
        )?;
        registry.register(Box::new(transfer_notices_total.clone()))?;

        let registered_accounts =
            IntGauge::new("registered_accounts", "Number of accounts known to the host")?;
        registry.register(Box::new(registered_accounts.clone()))?;

        let action_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "action_latency_seconds",
                "Action execution latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(action_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            actions_applied_total,
            actions_rejected_total,
            transfer_notices_total,
            registered_accounts,
            action_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_labelled_counters() {
        let metrics = NodeMetrics::new().unwrap();
        metrics
            .actions_applied_total
            .with_label_values(&["transfer"])
            .inc();
        metrics
            .actions_rejected_total
            .with_label_values(&["balance_locked"])
            .inc_by(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("tally_actions_applied_total{action=\"transfer\"} 1"));
        assert!(text.contains("tally_actions_rejected_total{kind=\"balance_locked\"} 2"));
    }
}
