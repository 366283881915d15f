use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;
use xitca_web::{
    App,
    handler::handler_service,
    middleware::tower_http_compat::TowerHttpCompat,
    route::get,
};

use gateway_provider::{
    config::{AppState, DEFAULT_META_HEADER_PREFIX, ProviderConfig},
    fs::local::LocalFileProvider,
    loader::MultiLoader,
    metrics,
    provider::Provider,
    routes,
    telemetry::{self, TelemetryConfig},
    utils,
    writer::MultiWriter,
};

#[derive(Debug, Parser)]
#[command(name = "server", version, about = "Gateway configuration provider")]
struct Args {
    /// Path to the provider configuration file (YAML or TOML)
    #[arg(long, short, env = "CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// HTTP server port
    #[arg(long, short, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Prefix of the headers carrying request metadata
    #[arg(long, env = "META_HEADER_PREFIX", default_value = DEFAULT_META_HEADER_PREFIX)]
    meta_header_prefix: String,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // Hosts the OTLP exporter and the initial load.
    let rt = tokio::runtime::Runtime::new()?;
    let tracer = {
        let _enter = rt.enter();
        telemetry::init_tracing(TelemetryConfig::default())?
    };
    tracing::info!("starting gateway configuration provider");

    let handle = metrics::init_metrics().context("failed to install metrics recorder")?;

    let config = ProviderConfig::from_file(&args.config)
        .with_context(|| format!("failed to load provider config {}", args.config.display()))?;
    let provider = rt
        .block_on(Provider::new(
            config,
            LocalFileProvider::new(),
            Arc::new(MultiLoader::default()),
        ))
        .context("failed to initialize provider")?;

    let state = AppState {
        provider: Arc::new(provider),
        writer: Arc::new(MultiWriter::default()),
        metrics: Arc::new(handle),
        meta_prefix: Arc::from(args.meta_header_prefix.to_ascii_lowercase()),
    };

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("listening on {addr}");

    App::new()
        .with_state(state)
        .at("/", get(handler_service(routes::index)))
        .at("/api/v1/healthz", get(handler_service(routes::health)))
        .at("/api/v1/config", get(handler_service(routes::get_config)))
        .at("/api/v1/config/stats", get(handler_service(routes::get_stats)))
        .at("/api/v1/config/reload", get(handler_service(routes::reload)))
        .at("/metrics", get(handler_service(routes::metrics_handler)))
        .enclosed_fn(utils::error_handler)
        .enclosed(TowerHttpCompat::new(TraceLayer::new_for_http()))
        .serve()
        .bind(addr)?
        .run()
        .wait()?;

    telemetry::shutdown_tracing(tracer);
    Ok(())
}
