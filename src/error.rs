use std::path::PathBuf;

use thiserror::Error;

use crate::loader::LoaderError;

/// A source's fragment directory could not be turned into a bundle.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },
    #[error("invalid fragment {}: {reason}", path.display())]
    Fragment { path: PathBuf, reason: String },
    #[error("failed to encode bundle: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The set of sources does not form a consistent index.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("at least one configuration is required")]
    NoSources,
    #[error("configuration[{index}]: directory is required")]
    MissingDirectory { index: usize },
    #[error("configuration[{index}]: directory does not exist: {}", directory.display())]
    DirectoryNotFound { index: usize, directory: PathBuf },
    #[error("configuration[{index}]: basic auth requires both username and password")]
    IncompleteBasicAuth { index: usize },
    #[error("duplicate configuration id: {key}")]
    DuplicateKey { key: String },
    #[error("only one configuration can be marked as default, found {count}")]
    MultipleDefaults { count: usize },
}

/// A reload attempt was aborted. The previous index stays published.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to load config {id}: {source}")]
    Load {
        id: String,
        #[source]
        source: LoadError,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("no configuration matched metadata")]
    NotFound,
    /// The matched source has no cache entry: the index is out of sync with its cache.
    #[error("config {id} not loaded")]
    Internal { id: String },
}

/// The static provider configuration file could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("unsupported configuration format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
}
