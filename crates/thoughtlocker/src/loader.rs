use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml_ng::{Mapping, Value};

use crate::checksum::REQUIRED_FIELDS;
use crate::spec::PromptSpec;

/// Errors raised while reading declarative spec files.
///
/// All of these are detected before anything touches storage.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(String),

    #[error("YAML root must be a mapping of name -> spec")]
    InvalidRoot,

    #[error("entry '{name}' must be a mapping of fields")]
    InvalidEntry { name: String },

    #[error("prompt '{name}' missing required field: {field}")]
    MissingField { name: String, field: &'static str },

    #[error("prompt '{name}' has an invalid field: {message}")]
    InvalidField { name: String, message: String },
}

/// Field set accepted for one declared spec.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeclaredSpec {
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    provider: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    model: Option<String>,
    web_search: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    reasoning_effort: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    context_size: Option<String>,
    temperature: Option<f64>,
    max_output_tokens: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    system_instruction: Option<String>,
    use_cases: Option<Vec<String>>,
    parameters: Option<serde_json::Value>,
    tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_string")]
    version: Option<String>,
    enabled: Option<bool>,
    aliases: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_string")]
    source: Option<String>,
    token_limits: Option<serde_json::Value>,
    #[serde(deserialize_with = "lenient_string")]
    notes: Option<String>,
}

/// Keys understood by [`DeclaredSpec`]; anything else is ignored.
const DECLARED_FIELDS: [&str; 18] = [
    "description",
    "provider",
    "model",
    "web_search",
    "reasoning_effort",
    "context_size",
    "temperature",
    "max_output_tokens",
    "system_instruction",
    "use_cases",
    "parameters",
    "tags",
    "version",
    "enabled",
    "aliases",
    "source",
    "token_limits",
    "notes",
];

/// Read and parse a YAML file of specs.
pub fn read_specs(path: &Path) -> Result<Vec<PromptSpec>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    parse_specs(&content)
}

/// Parse a YAML mapping of `name -> fields` into specs, in document order.
///
/// Every entry must declare all of [`REQUIRED_FIELDS`] (null is allowed).
/// The checksum of each spec is computed here.
pub fn parse_specs(content: &str) -> Result<Vec<PromptSpec>, LoadError> {
    if content.trim().is_empty() {
        return Err(LoadError::InvalidRoot);
    }

    let root: Value =
        serde_yaml_ng::from_str(content).map_err(|e| LoadError::Yaml(e.to_string()))?;

    let Value::Mapping(entries) = root else {
        return Err(LoadError::InvalidRoot);
    };

    entries
        .into_iter()
        .map(|(key, value)| {
            let name = entry_name(&key)?;
            match value {
                Value::Mapping(fields) => build_spec(name, fields),
                _ => Err(LoadError::InvalidEntry { name }),
            }
        })
        .collect()
}

fn entry_name(key: &Value) -> Result<String, LoadError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(LoadError::InvalidEntry {
            name: format!("{other:?}"),
        }),
    }
}

fn build_spec(name: String, fields: Mapping) -> Result<PromptSpec, LoadError> {
    if let Some(field) = REQUIRED_FIELDS.iter().copied().find(|f| !fields.contains_key(*f)) {
        return Err(LoadError::MissingField { name, field });
    }

    let mut known = Mapping::new();
    let mut ignored = Vec::new();
    for (key, value) in fields {
        if key.as_str().is_some_and(|k| DECLARED_FIELDS.contains(&k)) {
            known.insert(key, value);
        } else {
            ignored.push(key);
        }
    }
    if !ignored.is_empty() {
        tracing::debug!(name = %name, ?ignored, "ignoring unrecognized fields");
    }

    let declared: DeclaredSpec = serde_yaml_ng::from_value(Value::Mapping(known))
        .map_err(|e| LoadError::InvalidField {
            name: name.clone(),
            message: e.to_string(),
        })?;

    let mut spec = PromptSpec {
        name,
        description: declared.description,
        provider: declared.provider,
        model: declared.model,
        web_search: declared.web_search,
        reasoning_effort: declared.reasoning_effort,
        context_size: declared.context_size,
        temperature: declared.temperature,
        max_output_tokens: declared.max_output_tokens,
        system_instruction: declared.system_instruction.unwrap_or_default(),
        use_cases: declared.use_cases,
        parameters: declared.parameters,
        tags: declared.tags,
        version: declared.version,
        enabled: declared.enabled.unwrap_or(true),
        aliases: declared.aliases,
        source: declared.source,
        checksum: None,
        token_limits: declared.token_limits,
        notes: declared.notes,
        created_at: None,
        updated_at: None,
    };
    spec.checksum = Some(spec.compute_checksum());

    Ok(spec)
}

/// Accept any YAML scalar where free text is expected, so `version: 1.2`
/// reads as `"1.2"`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar, found {other:?}"
        ))),
    }
}
