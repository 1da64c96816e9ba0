//! # Prometheus Metrics
//!
//! Operational metrics for the wallet server, scraped at `/metrics` on the
//! metrics port. Everything lives in a dedicated [`prometheus::Registry`]
//! with the `vwallet` prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the server.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared across request handlers and background tasks.
#[derive(Clone)]
pub struct WalletMetrics {
    registry: Registry,
    /// Transfers accepted by `POST /api/transfer`.
    pub transfers_submitted_total: IntCounter,
    /// Withdrawals accepted by `POST /api/withdraw`.
    pub withdrawals_submitted_total: IntCounter,
    /// Conversions completed by `POST /api/convert`.
    pub conversions_total: IntCounter,
    /// Mutating requests rejected for any reason.
    pub rejected_requests_total: IntCounter,
    /// Settlement timers that fired and confirmed their transaction.
    pub settlements_confirmed_total: IntCounter,
    /// Settlements scheduled but not yet fired.
    pub pending_settlements: IntGauge,
    /// Latency of mutating requests in seconds.
    pub request_latency_seconds: Histogram,
}

fn register<M: Collector + Clone + 'static>(registry: &Registry, metric: M) -> M {
    registry
        .register(Box::new(metric.clone()))
        .expect("metric registration");
    metric
}

impl WalletMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("vwallet".into()), None)
            .expect("failed to create prometheus registry");

        let counter = |name: &str, help: &str| {
            register(&registry, IntCounter::new(name, help).expect("metric creation"))
        };

        let transfers_submitted_total =
            counter("transfers_submitted_total", "Total number of accepted transfers");
        let withdrawals_submitted_total =
            counter("withdrawals_submitted_total", "Total number of accepted withdrawals");
        let conversions_total = counter("conversions_total", "Total number of completed conversions");
        let rejected_requests_total = counter(
            "rejected_requests_total",
            "Total number of rejected transfer, convert and withdraw requests",
        );
        let settlements_confirmed_total = counter(
            "settlements_confirmed_total",
            "Total number of transactions confirmed by settlement",
        );

        let pending_settlements = register(
            &registry,
            IntGauge::new("pending_settlements", "Settlements waiting for their delay")
                .expect("metric creation"),
        );

        let request_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "request_latency_seconds",
                    "Latency of mutating wallet requests in seconds",
                )
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            )
            .expect("metric creation"),
        );

        Self {
            registry,
            transfers_submitted_total,
            withdrawals_submitted_total,
            conversions_total,
            rejected_requests_total,
            settlements_confirmed_total,
            pending_settlements,
            request_latency_seconds,
        }
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

impl Default for WalletMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<WalletMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
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
