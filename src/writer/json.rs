use crate::{
    bundle::ConfigBundle,
    writer::{BundleWriter, WriterError},
};

#[derive(Debug)]
pub struct JsonWriter {}

impl BundleWriter for JsonWriter {
    fn ext(&self) -> &'static str {
        "json"
    }
    fn content_type(&self) -> &'static str {
        "application/json"
    }
    fn to_str(&self, bundle: &ConfigBundle) -> Result<String, WriterError> {
        serde_json::to_string(bundle).map_err(|e| WriterError {
            format: "json",
            message: e.to_string(),
        })
    }
}

impl JsonWriter {
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self {})
    }
}
