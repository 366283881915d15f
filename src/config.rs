use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;

use crate::{
    Metadata, error::ConfigError, fs::local::LocalFileProvider, provider::Provider,
    writer::MultiWriter,
};

/// Header prefix carrying request metadata, e.g. `X-Goma-Meta-Env: prod`.
pub const DEFAULT_META_HEADER_PREFIX: &str = "X-Goma-Meta-";

/// The static provider configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub configurations: Vec<SourceConfig>,
}

/// One `configurations` entry, before its key is derived.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub directory: PathBuf,
    #[serde(default)]
    pub auth: Option<HttpAuth>,
    /// If the config in this directory is the fallback
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpAuth {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BasicAuth {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl ProviderConfig {
    /// Reads a YAML or TOML provider file. Relative source directories are
    /// resolved against the directory holding the file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let mut config: ProviderConfig = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
            "toml" => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };

        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    pub fn rebase(&mut self, base: &Path) {
        for source in &mut self.configurations {
            if !source.directory.as_os_str().is_empty() && source.directory.is_relative() {
                source.directory = base.join(&source.directory);
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<Provider<LocalFileProvider>>,
    pub writer: Arc<MultiWriter>,
    pub metrics: Arc<PrometheusHandle>,
    /// Lower-cased metadata header prefix.
    pub meta_prefix: Arc<str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_folder() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("example")
    }

    #[test]
    fn parses_yaml_provider_file() {
        let config = ProviderConfig::from_file(&example_folder().join("provider.yaml")).unwrap();

        assert_eq!(config.configurations.len(), 4);
        let prod = &config.configurations[0];
        assert_eq!(prod.metadata.get("env").map(String::as_str), Some("prod"));
        assert!(prod.directory.is_absolute());
        assert!(prod.directory.ends_with("prod"));
        let auth = prod.auth.as_ref().unwrap();
        assert_eq!(auth.api_key.as_deref(), Some("prod-key"));
        assert!(config.configurations.iter().filter(|c| c.default).count() == 1);
    }

    #[test]
    fn parses_toml_provider_file() {
        let config = ProviderConfig::from_file(&example_folder().join("provider.toml")).unwrap();

        assert_eq!(config.configurations.len(), 2);
        let staging = &config.configurations[0];
        assert_eq!(
            staging.auth.as_ref().and_then(|a| a.basic_auth.as_ref()),
            Some(&BasicAuth {
                username: "admin".to_string(),
                password: "secret".to_string(),
            })
        );
        assert!(config.configurations[1].default);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = ProviderConfig::from_file(&example_folder().join("prod/README.md")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }
}
