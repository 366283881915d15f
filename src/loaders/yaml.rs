use crate::{
    Mapping, Value,
    loader::{Loader, LoaderError},
};

#[derive(Debug)]
pub struct YamlLoader {}

impl Loader for YamlLoader {
    fn exts(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    /// An empty or whitespace-only document loads as `Null`.
    fn load(&self, content: &str) -> Result<Value, LoaderError> {
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        let d: serde_yaml::Value = serde_yaml::from_str(content).map_err(parse_failed)?;
        from_yaml(d)
    }
}

fn parse_failed(e: impl std::fmt::Display) -> LoaderError {
    LoaderError::ParseFailed {
        format: "yaml",
        message: e.to_string(),
    }
}

/// Convert from serde_yaml::Value to internal Value.
///
/// Mapping keys must be strings, numbers or booleans.
pub fn from_yaml(yaml_value: serde_yaml::Value) -> Result<Value, LoaderError> {
    let value = match yaml_value {
        serde_yaml::Value::String(s) => Value::String(s),

        serde_yaml::Value::Sequence(seq) => Value::Sequence(
            seq.into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?,
        ),

        serde_yaml::Value::Mapping(map) => {
            let mut mapping = Mapping::new();
            for (key, value) in map {
                let key_str = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(parse_failed(format!(
                            "unsupported mapping key: {other:?}"
                        )));
                    }
                };

                mapping.insert(key_str, from_yaml(value)?);
            }
            Value::Mapping(mapping)
        }

        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_yaml::Value::Bool(b) => Value::Boolean(b),
        serde_yaml::Value::Null => Value::Null,

        // Tagged values - extract the inner value
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value)?,
    };
    Ok(value)
}
