use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};

use crate::{bundle::ConfigBundle, source::ConfigurationSource};

/// How long clients may cache a served bundle. Entries are only ever
/// replaced by a reload, never expired in place.
pub const CACHE_TTL_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub bundle: Arc<ConfigBundle>,
    pub expires_at: DateTime<Utc>,
    pub etag: String,
}

impl CacheEntry {
    pub fn new(bundle: ConfigBundle) -> Self {
        Self {
            expires_at: bundle.timestamp + Duration::seconds(CACHE_TTL_SECS),
            etag: bundle.checksum.clone(),
            bundle: Arc::new(bundle),
        }
    }
}

/// One complete, immutable generation of sources and their bundles.
#[derive(Debug)]
pub struct ProviderIndex {
    pub generation: u64,
    pub sources: Vec<Arc<ConfigurationSource>>,
    pub cache: HashMap<String, CacheEntry>,
    pub default_id: Option<String>,
    pub last_reload_at: DateTime<Utc>,
}

impl ProviderIndex {
    pub fn new(
        generation: u64,
        sources: Vec<Arc<ConfigurationSource>>,
        cache: HashMap<String, CacheEntry>,
        last_reload_at: DateTime<Utc>,
    ) -> Self {
        let default_id = sources.iter().find(|s| s.default).map(|s| s.id.clone());
        Self {
            generation,
            sources,
            cache,
            default_id,
            last_reload_at,
        }
    }

    pub fn source(&self, id: &str) -> Option<&Arc<ConfigurationSource>> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn entry(&self, id: &str) -> Option<&CacheEntry> {
        self.cache.get(id)
    }
}
