//! Bundle Loader: merges every fragment found under a directory into one
//! [`ConfigBundle`].
//!
//! Files are visited in lexicographic path order. Routes and middlewares are
//! concatenated in that order without deduplication, fragment metadata is
//! merged last-write-wins. One unreadable or malformed fragment aborts the
//! whole load.

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    Metadata, Value,
    error::LoadError,
    fingerprint::fingerprint,
    fs::FileProvider,
    loader::MultiLoader,
};

pub const BUNDLE_VERSION: &str = "1.0";

/// Merged, servable configuration of one source.
///
/// Never mutated once published: a reload builds a fresh bundle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfigBundle {
    pub version: String,
    pub routes: Vec<Value>,
    pub middlewares: Vec<Value>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// Content fingerprint, empty until [`ConfigBundle::seal`] runs.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    pub timestamp: DateTime<Utc>,
}

impl Default for ConfigBundle {
    fn default() -> Self {
        Self {
            version: BUNDLE_VERSION.to_string(),
            routes: Vec::new(),
            middlewares: Vec::new(),
            metadata: Metadata::new(),
            checksum: String::new(),
            timestamp: DateTime::<Utc>::default(),
        }
    }
}

impl ConfigBundle {
    pub fn merge(&mut self, fragment: Fragment) {
        self.routes.extend(fragment.routes);
        self.middlewares.extend(fragment.middlewares);
        self.metadata.extend(fragment.metadata);
    }

    /// Overlays the metadata declared by the owning source.
    pub fn merge_declared(&mut self, declared: &Metadata) {
        for (k, v) in declared {
            self.metadata.insert(k.clone(), v.clone());
        }
    }

    /// Computes the fingerprint and stamps the load time.
    pub fn seal(&mut self, loaded_at: DateTime<Utc>) -> Result<(), LoadError> {
        self.checksum = fingerprint(self)?;
        self.timestamp = loaded_at;
        Ok(())
    }
}

/// The part of one document that contributes to a bundle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fragment {
    pub routes: Vec<Value>,
    pub middlewares: Vec<Value>,
    pub metadata: Metadata,
}

impl Fragment {
    /// Extracts `routes`, `middlewares` and `metadata` from a parsed document.
    /// Any other top-level key is ignored.
    pub fn from_value(value: Value, path: &Path) -> Result<Self, LoadError> {
        let invalid = |reason: String| LoadError::Fragment {
            path: path.to_path_buf(),
            reason,
        };

        let mut map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(map) => map,
            other => {
                return Err(invalid(format!(
                    "expected a mapping at top level, got {}",
                    other.kind()
                )));
            }
        };

        let mut records = |key: &str| -> Result<Vec<Value>, LoadError> {
            match map.remove(key) {
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(Value::Sequence(seq)) => Ok(seq),
                Some(other) => Err(invalid(format!(
                    "'{key}' must be a sequence, got {}",
                    other.kind()
                ))),
            }
        };
        let routes = records("routes")?;
        let middlewares = records("middlewares")?;

        let mut metadata = Metadata::new();
        match map.remove("metadata") {
            None | Some(Value::Null) => {}
            Some(Value::Mapping(entries)) => {
                for (k, v) in entries {
                    let text = v.scalar_to_string().ok_or_else(|| {
                        invalid(format!("metadata '{k}' must be a scalar, got {}", v.kind()))
                    })?;
                    metadata.insert(k, text);
                }
            }
            Some(other) => {
                return Err(invalid(format!(
                    "'metadata' must be a mapping, got {}",
                    other.kind()
                )));
            }
        }

        Ok(Self {
            routes,
            middlewares,
            metadata,
        })
    }
}

#[derive(Debug)]
pub struct BundleLoader<P: FileProvider> {
    fs: P,
    multiloader: Arc<MultiLoader>,
}

impl<P: FileProvider> BundleLoader<P> {
    pub fn new(fs: P, multiloader: Arc<MultiLoader>) -> Self {
        Self { fs, multiloader }
    }

    pub fn fs(&self) -> &P {
        &self.fs
    }

    /// Loads and merges every recognized fragment under `directory`.
    pub async fn load(&self, directory: &Path) -> Result<ConfigBundle, LoadError> {
        let mut entries = self
            .fs
            .list(directory)
            .await
            .map_err(|source| LoadError::Walk {
                path: directory.to_path_buf(),
                source,
            })?;
        entries.retain(|e| self.multiloader.supports(&e.ext));
        entries.sort_by(|a, b| a.full_path.cmp(&b.full_path));

        let mut bundle = ConfigBundle::default();
        for entry in entries {
            let path = entry.full_path;
            let content = self
                .fs
                .load(&path)
                .await
                .map_err(|source| LoadError::Read {
                    path: path.clone(),
                    source,
                })?;

            let value = self
                .multiloader
                .load(&entry.ext, &content)
                .map_err(|source| LoadError::Parse {
                    path: path.clone(),
                    source,
                })?;

            let fragment = Fragment::from_value(value, &path)?;
            tracing::trace!(
                path = %path.display(),
                routes = fragment.routes.len(),
                middlewares = fragment.middlewares.len(),
                "merged fragment"
            );
            bundle.merge(fragment);
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mapping, loaders::yaml::YamlLoader, loader::Loader};
    use std::path::PathBuf;

    fn fragment(yaml: &str) -> Result<Fragment, LoadError> {
        let value = YamlLoader {}.load(yaml).unwrap();
        Fragment::from_value(value, Path::new("test.yaml"))
    }

    #[test]
    fn extracts_known_sections() {
        let f = fragment(
            r#"
version: "9"
routes:
  - name: api
middlewares:
  - name: limit
    type: rateLimit
    rule: { unit: minute, requestsPerUnit: 60 }
metadata:
  env: prod
  replicas: 3
  canary: false
"#,
        )
        .unwrap();

        assert_eq!(f.routes.len(), 1);
        assert_eq!(f.middlewares.len(), 1);
        assert_eq!(f.metadata.get("env").map(String::as_str), Some("prod"));
        assert_eq!(f.metadata.get("replicas").map(String::as_str), Some("3"));
        assert_eq!(f.metadata.get("canary").map(String::as_str), Some("false"));
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(fragment("routes: not-a-list").is_err());
        assert!(fragment("- just\n- a\n- list").is_err());
        assert!(fragment("metadata:\n  nested: { a: b }").is_err());
    }

    #[test]
    fn merge_concatenates_and_overwrites_metadata() {
        let mut bundle = ConfigBundle::default();
        let mut route = Mapping::new();
        route.insert("name".into(), Value::String("api".into()));

        for owner in ["first", "second"] {
            bundle.merge(Fragment {
                routes: vec![Value::Mapping(route.clone())],
                middlewares: vec![],
                metadata: Metadata::from([("owner".to_string(), owner.to_string())]),
            });
        }

        // same-named routes are kept, not deduplicated
        assert_eq!(bundle.routes.len(), 2);
        assert_eq!(bundle.metadata["owner"], "second");

        bundle.merge_declared(&Metadata::from([("owner".to_string(), "source".to_string())]));
        assert_eq!(bundle.metadata["owner"], "source");
    }

    #[test]
    fn seal_sets_checksum_and_timestamp() {
        let mut bundle = ConfigBundle::default();
        assert!(bundle.checksum.is_empty());

        let now = Utc::now();
        bundle.seal(now).unwrap();
        assert_eq!(bundle.checksum.len(), 64);
        assert_eq!(bundle.timestamp, now);
    }

    #[tokio::test]
    async fn loads_example_directory() {
        let loader = BundleLoader::new(
            crate::fs::local::LocalFileProvider::new(),
            Arc::new(MultiLoader::default()),
        );
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("example/prod");
        let bundle = loader.load(&dir).await.unwrap();

        assert_eq!(bundle.version, BUNDLE_VERSION);
        // routes.yaml and extra/middlewares.json only, README.md is skipped
        assert_eq!(bundle.routes.len(), 2);
        assert_eq!(bundle.middlewares.len(), 1);
        assert_eq!(bundle.metadata["tier"], "production");

        // sealing happens when the index is built
        assert!(bundle.checksum.is_empty());
    }

    #[tokio::test]
    async fn empty_yaml_is_empty_fragment_but_empty_json_fails() {
        let loader = BundleLoader::new(
            crate::fs::local::LocalFileProvider::new(),
            Arc::new(MultiLoader::default()),
        );
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("routes.yaml"), "routes:\n  - name: api\n").unwrap();
        std::fs::write(dir.path().join("blank.yml"), "  \n").unwrap();

        let bundle = loader.load(dir.path()).await.unwrap();
        assert_eq!(bundle.routes.len(), 1);

        std::fs::write(dir.path().join("blank.json"), " \n").unwrap();
        let err = loader.load(dir.path()).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { ref path, .. } if path.ends_with("blank.json")));
    }
}
