//! Spec document decoding and identity extraction.

use crate::error::{ErrorKind, RegistryError, Result};
use crate::normalize::{to_safe_name, RawVersion};
use serde_json::Value;
use tracing::debug;

/// A decoded spec plus the identity fields pulled from its `info` block.
#[derive(Debug, Clone)]
pub struct ParsedSpec {
    pub document: Value,
    /// `info.title` with whitespace runs collapsed to underscores.
    pub app_name: String,
    /// `info.version` as written; not yet normalized.
    pub app_version: RawVersion,
}

/// Decode `bytes` as JSON, falling back to YAML, and extract identity.
pub fn parse(bytes: &[u8]) -> Result<ParsedSpec> {
    let document = decode(bytes)?;
    let info = document.get("info");

    let title = match info.and_then(|i| i.get("title")) {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::String(_)) | Some(Value::Null) | None => {
            return Err(RegistryError::step(
                ErrorKind::InvalidSpec,
                "Missing 'info.title' in the file",
            ))
        }
        Some(_) => {
            return Err(RegistryError::step(
                ErrorKind::InvalidSpec,
                "'info.title' must be a string",
            ))
        }
    };

    let app_version = match info.and_then(|i| i.get("version")) {
        Some(Value::String(s)) if !s.trim().is_empty() => RawVersion::Text(s.clone()),
        Some(Value::Number(n)) if !is_zero(n) => RawVersion::Number(n.clone()),
        None
        | Some(Value::Null)
        | Some(Value::Bool(false))
        | Some(Value::String(_))
        | Some(Value::Number(_)) => {
            return Err(RegistryError::step(
                ErrorKind::MissingAppVersion,
                "info.version is required and cannot be empty",
            ))
        }
        Some(_) => {
            return Err(RegistryError::step(
                ErrorKind::InvalidSpec,
                "'info.version' must be a string or a number",
            ))
        }
    };

    let app_name = to_safe_name(title);
    debug!(app_name = %app_name, app_version = %app_version, "parsed spec identity");

    Ok(ParsedSpec {
        app_name,
        app_version,
        document,
    })
}

fn decode(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| {
            RegistryError::step(ErrorKind::InvalidSpec, format!("File is not valid UTF-8: {e}"))
        })?
        .trim();

    match serde_json::from_str::<Value>(text) {
        Ok(v) => Ok(v),
        Err(json_err) => match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Ok(v) => Ok(yaml_to_json(v)),
            Err(yaml_err) => {
                debug!("json decode failed: {}", json_err);
                Err(RegistryError::step(ErrorKind::InvalidSpec, yaml_err.to_string()))
            }
        },
    }
}

fn is_zero(n: &serde_json::Number) -> bool {
    n.as_f64().map(|f| f == 0.0).unwrap_or(false)
}

/// YAML allows non-string mapping keys (`200:` under `responses`), JSON does
/// not; such keys are rendered to their scalar text.
fn yaml_to_json(v: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Y;
    match v {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Y::String(s) => Value::String(s),
        Y::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        Y::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        Y::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(k: serde_yaml::Value) -> String {
    use serde_yaml::Value as Y;
    match k {
        Y::String(s) => s,
        Y::Number(n) => n.to_string(),
        Y::Bool(b) => b.to_string(),
        Y::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
