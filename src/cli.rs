//! Operator CLI for gateway provider configurations
//!
//! Usage:
//!   providerctl check -c config.yaml
//!   providerctl resolve -c config.yaml -m env=prod -m region=eu
//!   providerctl render -c config.yaml -m env=prod -o yaml
//!   providerctl source -c config.yaml env=prod

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gateway_provider::{
    RequestMetadata,
    config::ProviderConfig,
    fs::local::LocalFileProvider,
    loader::MultiLoader,
    provider::Provider,
    writer::MultiWriter,
};

#[derive(Debug, Parser)]
#[command(
    name = "providerctl",
    version,
    about = "Validate, inspect and resolve gateway provider configurations"
)]
struct Cli {
    /// Path to the provider configuration file (YAML or TOML)
    #[arg(long, short, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load every source and print the resulting index
    Check,

    /// Print the id of the source a metadata set resolves to
    Resolve {
        /// Request metadata as key=value, repeatable
        #[arg(long = "meta", short = 'm', value_parser = parse_pair)]
        meta: Vec<(String, String)>,
    },

    /// Print the bundle a metadata set resolves to
    Render {
        #[arg(long = "meta", short = 'm', value_parser = parse_pair)]
        meta: Vec<(String, String)>,

        /// Output format (json, yaml)
        #[arg(long, short = 'o', default_value = "yaml")]
        format: String,
    },

    /// Show one source by its derived id
    Source { id: String },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((k.to_lowercase(), v.to_string()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ProviderConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let rt = tokio::runtime::Runtime::new()?;
    let provider = rt
        .block_on(Provider::new(
            config,
            LocalFileProvider::new(),
            Arc::new(MultiLoader::default()),
        ))
        .context("failed to build configuration index")?;

    match cli.command {
        Commands::Check => run_check(&provider),
        Commands::Resolve { meta } => {
            let resolution = provider.resolve(&to_metadata(meta))?;
            println!("{} ({})", resolution.source.id, resolution.kind.label());
            Ok(())
        }
        Commands::Render { meta, format } => run_render(&provider, meta, &format),
        Commands::Source { id } => {
            let source = provider
                .source_for(&id)
                .ok_or_else(|| anyhow::anyhow!("no source with id '{id}'"))?;
            println!("{}", serde_yaml::to_string(source.as_ref())?);
            Ok(())
        }
    }
}

fn to_metadata(pairs: Vec<(String, String)>) -> RequestMetadata {
    pairs.into_iter().collect()
}

fn run_check(provider: &Provider<LocalFileProvider>) -> anyhow::Result<()> {
    let index = provider.snapshot();
    for source in &index.sources {
        let entry = index
            .entry(&source.id)
            .ok_or_else(|| anyhow::anyhow!("source '{}' has no bundle", source.id))?;
        println!(
            "{}{}\t{}\t{} routes\t{} middlewares\t{}",
            source.id,
            if source.default { " (default)" } else { "" },
            source.directory.display(),
            entry.bundle.routes.len(),
            entry.bundle.middlewares.len(),
            entry.etag,
        );
    }
    Ok(())
}

fn run_render(
    provider: &Provider<LocalFileProvider>,
    meta: Vec<(String, String)>,
    format: &str,
) -> anyhow::Result<()> {
    let writer = MultiWriter::default();
    let resolution = provider.resolve(&to_metadata(meta))?;

    let output = writer
        .write(format, &resolution.bundle)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown format '{}'. Supported formats: {}",
                format,
                writer.formats().join(", ")
            )
        })??;

    println!("{output}");
    Ok(())
}
