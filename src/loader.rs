use std::fmt::Debug;

use thiserror::Error;

use crate::{
    Value,
    loaders::{json::JsonLoader, yaml::YamlLoader},
};

#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    #[error("invalid {format}: {message}")]
    ParseFailed {
        format: &'static str,
        message: String,
    },
    #[error("no loader registered for extension '{0}'")]
    UnsupportedFormat(String),
}

/// Parses one structured-document format into a [`Value`].
pub trait Loader: Debug + Send + Sync {
    /// Extensions handled by this loader, lower-case and without the dot.
    fn exts(&self) -> &'static [&'static str];
    fn load(&self, content: &str) -> Result<Value, LoaderError>;
}

#[derive(Debug)]
pub struct MultiLoader {
    pub loaders: Vec<Box<dyn Loader>>,
}

impl Default for MultiLoader {
    /// The YAML (human-editable) and JSON (strict machine) loaders.
    fn default() -> Self {
        Self::new(vec![Box::new(YamlLoader {}), Box::new(JsonLoader {})])
    }
}

impl MultiLoader {
    pub fn new(loaders: Vec<Box<dyn Loader>>) -> Self {
        Self { loaders }
    }

    fn find(&self, ext: &str) -> Option<&dyn Loader> {
        self.loaders
            .iter()
            .find(|l| l.exts().iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .map(|l| l.as_ref())
    }

    pub fn supports(&self, ext: &str) -> bool {
        self.find(ext).is_some()
    }

    pub fn load(&self, ext: &str, content: &str) -> Result<Value, LoaderError> {
        self.find(ext)
            .ok_or_else(|| LoaderError::UnsupportedFormat(ext.to_string()))?
            .load(content)
    }
}
