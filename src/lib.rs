use std::collections::BTreeMap;

use serde::Serialize;

pub mod authorizer;
pub mod bundle;
pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod fs;
pub mod loader;
pub mod loaders;
pub mod metrics;
pub mod provider;
pub mod request;
pub mod resolver;
pub mod routes;
pub mod source;
pub mod telemetry;
pub mod utils;
pub mod writer;

/// Opaque document carried inside a bundle.
///
/// Route and middleware records are kept in this shape and passed through
/// unparsed. Sequences keep document order. Mappings are key-sorted, which
/// makes every serialization of a `Value` canonical.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// A string value.
    String(String),
    /// An ordered list of values.
    Sequence(Sequence),
    /// A key-value mapping (object/dictionary).
    Mapping(Mapping),
    /// An integer numeric value.
    Int(i64),
    /// An unsigned integer above `i64::MAX`.
    UInt(u64),
    /// A floating-point numeric value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
    /// A null/empty value.
    Null,
}

pub type Sequence = Vec<Value>;
pub type Mapping = BTreeMap<String, Value>;

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Sequence(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders a scalar as text. Returns `None` for sequences, mappings and null.
    pub fn scalar_to_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::UInt(u) => Some(u.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Sequence(_) | Value::Mapping(_) | Value::Null => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Int(_) | Value::UInt(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
        }
    }
}

/// Metadata declared by a source, keys lower-cased and sorted.
pub type Metadata = BTreeMap<String, String>;

/// Metadata extracted from an incoming request.
pub type RequestMetadata = std::collections::HashMap<String, String>;
