//! The engine: an atomically swapped [`ProviderIndex`] plus the Reload
//! Coordinator that rebuilds it.
//!
//! Readers take a snapshot with one atomic load and never block. A reload
//! holds the reload lock for its whole duration, builds the next generation
//! off to the side while readers keep using the current one, and publishes
//! it with a single store. A failed reload publishes nothing, and a reload
//! whose caller goes away still runs to completion.

use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::Instant,
};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    RequestMetadata,
    bundle::BundleLoader,
    cache::{CacheEntry, ProviderIndex},
    config::ProviderConfig,
    error::{ReloadError, ResolveError},
    fs::FileProvider,
    loader::MultiLoader,
    metrics,
    resolver::Resolution,
    source::{ConfigurationSource, build_sources},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub configs_loaded: usize,
    pub last_reload: DateTime<Utc>,
    pub uptime: String,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReloadOutcome {
    pub generation: u64,
    pub timestamp: DateTime<Utc>,
}

pub struct Provider<P: FileProvider> {
    config: ProviderConfig,
    loader: BundleLoader<P>,
    index: ArcSwap<ProviderIndex>,
    reload_lock: Mutex<()>,
    started: Instant,
}

impl<P: FileProvider> fmt::Debug for Provider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.index.load();
        f.debug_struct("Provider")
            .field("generation", &index.generation)
            .field("sources", &index.sources.len())
            .finish()
    }
}

impl<P: FileProvider> Provider<P> {
    /// Builds and publishes the first generation. Fails if it cannot be built.
    pub async fn new(
        config: ProviderConfig,
        fs: P,
        multiloader: Arc<MultiLoader>,
    ) -> Result<Self, ReloadError> {
        let loader = BundleLoader::new(fs, multiloader);
        let first = build_index(&config, &loader, 1).await?;
        tracing::info!(
            sources = first.sources.len(),
            default = first.default_id.as_deref().unwrap_or("-"),
            "configuration index loaded"
        );
        metrics::record_sources_loaded(first.sources.len());

        Ok(Self {
            config,
            loader,
            index: ArcSwap::from_pointee(first),
            reload_lock: Mutex::new(()),
            started: Instant::now(),
        })
    }

    /// The currently published generation.
    pub fn snapshot(&self) -> Arc<ProviderIndex> {
        self.index.load_full()
    }

    pub fn resolve(&self, request: &RequestMetadata) -> Result<Resolution, ResolveError> {
        let index = self.index.load();
        let result = index.resolve(request);

        match &result {
            Ok(r) => {
                tracing::debug!(id = %r.source.id, kind = r.kind.label(), "configuration matched metadata");
                metrics::record_resolution(r.kind.label());
            }
            Err(ResolveError::NotFound) => {
                tracing::debug!("no configuration matched metadata");
                metrics::record_resolution("not_found");
            }
            Err(ResolveError::Internal { id }) => {
                tracing::error!(id = %id, generation = index.generation, "matched source has no cache entry");
                metrics::record_resolution("internal");
            }
        }
        result
    }

    pub fn source_for(&self, id: &str) -> Option<Arc<ConfigurationSource>> {
        self.index.load().source(id).cloned()
    }

    pub fn stats(&self) -> ProviderStats {
        let index = self.index.load();
        ProviderStats {
            configs_loaded: index.cache.len(),
            last_reload: index.last_reload_at,
            uptime: format!("{:.3?}", self.started.elapsed()),
            generation: index.generation,
        }
    }

    /// Rebuilds the whole index from the static source list and publishes it.
    ///
    /// Concurrent calls run one after another. On error the previous
    /// generation stays published.
    pub async fn reload(&self) -> Result<ReloadOutcome, ReloadError> {
        let _guard = self.reload_lock.lock().await;
        let start = Instant::now();

        let generation = self.index.load().generation + 1;
        let result = build_index(&self.config, &self.loader, generation).await;
        metrics::record_reload(result.is_ok(), start.elapsed());

        match result {
            Ok(next) => {
                let outcome = ReloadOutcome {
                    generation,
                    timestamp: next.last_reload_at,
                };
                let count = next.sources.len();
                self.index.store(Arc::new(next));
                metrics::record_sources_loaded(count);
                tracing::info!(generation, sources = count, "configuration index reloaded");
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, "reload aborted, keeping current configuration");
                Err(e)
            }
        }
    }

    /// Runs [`Provider::reload`] as its own task. Dropping the handle does not
    /// cancel it: the reload still finishes and publishes.
    pub fn spawn_reload(self: &Arc<Self>) -> JoinHandle<Result<ReloadOutcome, ReloadError>> {
        let provider = Arc::clone(self);
        tokio::spawn(async move { provider.reload().await })
    }
}

async fn build_index<P: FileProvider>(
    config: &ProviderConfig,
    loader: &BundleLoader<P>,
    generation: u64,
) -> Result<ProviderIndex, ReloadError> {
    let sources = build_sources(&config.configurations, loader.fs()).await?;

    let mut cache = HashMap::with_capacity(sources.len());
    for source in &sources {
        let load_err = |source_err| ReloadError::Load {
            id: source.id.clone(),
            source: source_err,
        };
        let mut bundle = loader.load(&source.directory).await.map_err(load_err)?;
        bundle.merge_declared(&source.metadata);
        bundle.seal(Utc::now()).map_err(load_err)?;
        cache.insert(source.id.clone(), CacheEntry::new(bundle));
    }

    let sources = sources.into_iter().map(Arc::new).collect();
    Ok(ProviderIndex::new(generation, sources, cache, Utc::now()))
}
