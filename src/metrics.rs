use std::sync::OnceLock;

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Safe to call more than once: later calls return the installed handle.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("Metrics recorder already installed");
            }

            // Pre-register counters so they appear even before the first increment.
            counter!("quote_cache_hits_total").absolute(0);
            counter!("quote_cache_misses_total").absolute(0);
            counter!("provider_calls_total").absolute(0);
            counter!("history_ingests_total").absolute(0);
            counter!("history_rows_ingested_total").absolute(0);
            counter!("ledger_writes_total").absolute(0);
            counter!("ledger_write_failures_total").absolute(0);
            counter!("cache_write_failures_total").absolute(0);

            handle
        })
        .clone()
}
