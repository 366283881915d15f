//! Configuration sources and canonical key derivation.

use std::{collections::HashSet, path::PathBuf};

use serde::Serialize;

use crate::{
    Metadata,
    config::{HttpAuth, SourceConfig},
    error::ValidationError,
    fs::FileProvider,
};

/// Key of a source that declares no metadata.
pub const DEFAULT_KEY: &str = "default";

/// A declared configuration entry with its derived key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSource {
    pub id: String,
    pub directory: PathBuf,
    pub metadata: Metadata,
    #[serde(skip)]
    pub auth: Option<HttpAuth>,
    pub default: bool,
}

impl ConfigurationSource {
    pub fn from_config(config: &SourceConfig) -> Self {
        let metadata: Metadata = config
            .metadata
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        Self {
            id: derive_key(&metadata),
            directory: config.directory.clone(),
            metadata,
            auth: config.auth.clone(),
            default: config.default,
        }
    }
}

/// Builds the canonical key of a metadata set: `k1=v1&k2=v2`, pairs sorted
/// by key, lower-cased. An empty set maps to [`DEFAULT_KEY`].
pub fn derive_key<'a, I>(metadata: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut pairs: Vec<(&String, &String)> = metadata.into_iter().collect();
    if pairs.is_empty() {
        return DEFAULT_KEY.to_string();
    }
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
        .to_lowercase()
}

/// Turns the static configuration list into sources, rejecting any set that
/// would make an inconsistent index.
pub async fn build_sources<P: FileProvider>(
    configs: &[SourceConfig],
    fs: &P,
) -> Result<Vec<ConfigurationSource>, ValidationError> {
    if configs.is_empty() {
        return Err(ValidationError::NoSources);
    }

    let mut sources = Vec::with_capacity(configs.len());
    let mut seen = HashSet::new();
    let mut defaults = 0;

    for (index, config) in configs.iter().enumerate() {
        if config.directory.as_os_str().is_empty() {
            return Err(ValidationError::MissingDirectory { index });
        }
        if !fs.is_dir(&config.directory).await {
            return Err(ValidationError::DirectoryNotFound {
                index,
                directory: config.directory.clone(),
            });
        }
        if let Some(basic) = config.auth.as_ref().and_then(|a| a.basic_auth.as_ref())
            && (basic.username.is_empty() || basic.password.is_empty())
        {
            return Err(ValidationError::IncompleteBasicAuth { index });
        }
        if config.metadata.is_empty() {
            tracing::warn!(config = index, "empty metadata");
        }

        let source = ConfigurationSource::from_config(config);
        if !seen.insert(source.id.clone()) {
            return Err(ValidationError::DuplicateKey { key: source.id });
        }
        if source.default {
            defaults += 1;
        }
        sources.push(source);
    }

    if defaults > 1 {
        return Err(ValidationError::MultipleDefaults { count: defaults });
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_metadata_is_default() {
        assert_eq!(derive_key(&Metadata::new()), "default");
    }

    #[test]
    fn key_is_sorted_and_lowercased() {
        let m = Metadata::from_iter(pairs(&[("region", "EU"), ("env", "Prod")]));
        assert_eq!(derive_key(&m), "env=prod&region=eu");
    }

    #[test]
    fn key_ignores_insertion_order() {
        let items = pairs(&[("env", "prod"), ("region", "eu"), ("tier", "gold"), ("az", "1")]);

        let forward: HashMap<_, _> = items.iter().cloned().collect();
        let backward: HashMap<_, _> = items.iter().rev().cloned().collect();
        let sorted = Metadata::from_iter(items.clone());

        let expected = derive_key(&sorted);
        assert_eq!(derive_key(&forward), expected);
        assert_eq!(derive_key(&backward), expected);
        assert_eq!(
            derive_key(items.iter().rev().map(|(k, v)| (k, v))),
            expected
        );
    }

    #[test]
    fn source_keys_are_case_normalized() {
        let config = SourceConfig {
            directory: PathBuf::from("/tmp"),
            metadata: Metadata::from_iter(pairs(&[("Env", "prod")])),
            ..Default::default()
        };
        let source = ConfigurationSource::from_config(&config);

        assert_eq!(source.metadata.get("env").map(String::as_str), Some("prod"));
        assert_eq!(source.id, "env=prod");
    }
}
