//! Log and trace output: an `EnvFilter`ed fmt layer, plus OTLP span export
//! when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace::TracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = concat!(env!("CARGO_CRATE_NAME"), "=debug,tower_http=debug");

pub struct TelemetryConfig {
    /// OTLP gRPC endpoint, e.g. `http://localhost:4317`. No export when unset.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.is_empty()),
            service_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Installs the global subscriber. Returns the tracer provider to flush on
/// shutdown when OTLP export is on.
///
/// Must run inside a Tokio runtime when an OTLP endpoint is configured.
pub fn init_tracing(config: TelemetryConfig) -> anyhow::Result<Option<TracerProvider>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(otlp_provider)
        .transpose()?;
    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(config.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    match &config.otlp_endpoint {
        Some(endpoint) => tracing::info!(%endpoint, service = %config.service_name, "exporting spans over OTLP"),
        None => tracing::debug!("span export disabled"),
    }
    Ok(provider)
}

fn otlp_provider(endpoint: &str) -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .build())
}

/// Flushes pending spans.
pub fn shutdown_tracing(provider: Option<TracerProvider>) {
    if let Some(provider) = provider
        && let Err(e) = provider.shutdown()
    {
        tracing::error!(error = ?e, "tracer provider shutdown failed");
    }
}
