use crate::{
    Mapping, Value,
    loader::{Loader, LoaderError},
};

#[derive(Debug)]
pub struct JsonLoader {}

impl Loader for JsonLoader {
    fn exts(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn load(&self, content: &str) -> Result<Value, LoaderError> {
        let d: serde_json::Value =
            serde_json::from_str(content).map_err(|e| LoaderError::ParseFailed {
                format: "json",
                message: e.to_string(),
            })?;
        Ok(from_json(d))
    }
}

pub fn from_json(json_value: serde_json::Value) -> Value {
    match json_value {
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Sequence(arr.into_iter().map(from_json).collect()),
        serde_json::Value::Object(obj) => Value::Mapping(
            obj.into_iter()
                .map(|(k, v)| (k, from_json(v)))
                .collect::<Mapping>(),
        ),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Null => Value::Null,
    }
}
