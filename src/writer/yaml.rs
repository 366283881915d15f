use crate::{
    bundle::ConfigBundle,
    writer::{BundleWriter, WriterError},
};

#[derive(Debug)]
pub struct YamlWriter {}

impl BundleWriter for YamlWriter {
    fn ext(&self) -> &'static str {
        "yaml"
    }
    fn content_type(&self) -> &'static str {
        "application/yaml"
    }
    fn to_str(&self, bundle: &ConfigBundle) -> Result<String, WriterError> {
        serde_yaml::to_string(bundle).map_err(|e| WriterError {
            format: "yaml",
            message: e.to_string(),
        })
    }
}

impl YamlWriter {
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self {})
    }
}
