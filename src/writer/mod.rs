pub mod json;
pub mod yaml;

use std::fmt::Debug;

use thiserror::Error;

use crate::bundle::ConfigBundle;

#[derive(Debug, Clone, Error)]
#[error("failed to serialize to {format}: {message}")]
pub struct WriterError {
    pub format: &'static str,
    pub message: String,
}

/// Serializes a bundle into one output format.
pub trait BundleWriter: Debug + Send + Sync {
    fn ext(&self) -> &'static str;
    fn content_type(&self) -> &'static str;
    fn to_str(&self, bundle: &ConfigBundle) -> Result<String, WriterError>;
}

#[derive(Debug)]
pub struct MultiWriter {
    pub writers: Vec<Box<dyn BundleWriter>>,
}

impl Default for MultiWriter {
    fn default() -> Self {
        Self::new(vec![json::JsonWriter::new_boxed(), yaml::YamlWriter::new_boxed()])
    }
}

impl MultiWriter {
    pub fn new(writers: Vec<Box<dyn BundleWriter>>) -> Self {
        Self { writers }
    }

    pub fn find(&self, ext: &str) -> Option<&dyn BundleWriter> {
        self.writers
            .iter()
            .find(|w| w.ext().eq_ignore_ascii_case(ext))
            .map(|w| w.as_ref())
    }

    pub fn write(&self, ext: &str, bundle: &ConfigBundle) -> Option<Result<String, WriterError>> {
        self.find(ext).map(|w| w.to_str(bundle))
    }

    pub fn formats(&self) -> Vec<&'static str> {
        self.writers.iter().map(|w| w.ext()).collect()
    }
}
