//! Matches request metadata against the sources of one index generation.
//!
//! A source scores one point per request key it declares with an equal value.
//! The first source with the strictly highest positive score wins, so ties go
//! to the earliest declared source. When nothing scores above zero the default
//! source, if any, is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    RequestMetadata,
    bundle::ConfigBundle,
    cache::ProviderIndex,
    error::ResolveError,
    source::ConfigurationSource,
};

/// How a source was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Scored(usize),
    Default,
}

impl MatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::Scored(_) => "matched",
            MatchKind::Default => "default",
        }
    }
}

/// A source together with its bundle, both from the same index generation.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub source: Arc<ConfigurationSource>,
    pub bundle: Arc<ConfigBundle>,
    pub etag: String,
    pub expires_at: DateTime<Utc>,
    pub generation: u64,
    pub kind: MatchKind,
}

pub fn score(source: &ConfigurationSource, request: &RequestMetadata) -> usize {
    request
        .iter()
        .filter(|(k, v)| source.metadata.get(*k) == Some(*v))
        .count()
}

pub fn match_source<'a>(
    index: &'a ProviderIndex,
    request: &RequestMetadata,
) -> Option<(&'a Arc<ConfigurationSource>, MatchKind)> {
    let mut best = None;
    let mut best_score = 0;

    for source in &index.sources {
        let s = score(source, request);
        if s > best_score {
            best_score = s;
            best = Some(source);
        }
    }

    if let Some(source) = best {
        return Some((source, MatchKind::Scored(best_score)));
    }

    index
        .default_id
        .as_deref()
        .and_then(|id| index.source(id))
        .map(|source| (source, MatchKind::Default))
}

impl ProviderIndex {
    pub fn resolve(&self, request: &RequestMetadata) -> Result<Resolution, ResolveError> {
        let (source, kind) = match_source(self, request).ok_or(ResolveError::NotFound)?;

        let entry = self.entry(&source.id).ok_or_else(|| ResolveError::Internal {
            id: source.id.clone(),
        })?;

        Ok(Resolution {
            source: source.clone(),
            bundle: entry.bundle.clone(),
            etag: entry.etag.clone(),
            expires_at: entry.expires_at,
            generation: self.generation,
            kind,
        })
    }
}
