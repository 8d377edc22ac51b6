//! Transfer notices, delivered as log lines and a metric. The node has no
//! per-account handlers to dispatch to, so a notice is observable but not
//! acted on.

use tally_ledger::{Name, Notifier, TransferNotice};

use crate::metrics::SharedMetrics;

/// Logs every notice at `info` and counts it.
pub struct TracingNotifier {
    metrics: Option<SharedMetrics>,
}

impl TracingNotifier {
    /// A notifier that also bumps `transfer_notices_total`.
    pub fn new(metrics: SharedMetrics) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    /// A notifier that only logs. Used by the offline commands.
    pub fn log_only() -> Self {
        Self { metrics: None }
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, recipient: Name, notice: &TransferNotice) {
        tracing::info!(
            %recipient,
            from = %notice.from,
            to = %notice.to,
            quantity = %notice.quantity,
            memo = %notice.memo,
            "transfer notice"
        );
        if let Some(metrics) = &self.metrics {
            metrics.transfer_notices_total.inc();
        }
    }
}
