use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::checksum;

/// A named configuration record describing how to invoke a language model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptSpec {
    pub name: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub web_search: Option<bool>,
    pub reasoning_effort: Option<String>,
    pub context_size: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<i64>,
    pub system_instruction: String,
    pub use_cases: Option<Vec<String>>,
    pub parameters: Option<Value>,
    pub tags: Option<Vec<String>>,
    /// Free-text label chosen by the author. Unrelated to `version_seq`.
    pub version: Option<String>,
    pub enabled: bool,
    pub aliases: Option<Vec<String>>,
    pub source: Option<String>,
    pub checksum: Option<String>,
    pub token_limits: Option<Value>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Flat storage form of a [`PromptSpec`], one field per table column.
///
/// Lists and nested objects are JSON text, timestamps are RFC 3339 text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecRow {
    pub name: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub web_search: Option<bool>,
    pub reasoning_effort: Option<String>,
    pub context_size: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<i64>,
    pub system_instruction: Option<String>,
    pub use_cases: Option<String>,
    pub parameters: Option<String>,
    pub tags: Option<String>,
    pub version: Option<String>,
    pub enabled: Option<bool>,
    pub aliases: Option<String>,
    pub source: Option<String>,
    pub checksum: Option<String>,
    pub token_limits: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl PromptSpec {
    /// A spec with only the identity and instruction set. Enabled by default.
    pub fn new(name: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            provider: None,
            model: None,
            web_search: None,
            reasoning_effort: None,
            context_size: None,
            temperature: None,
            max_output_tokens: None,
            system_instruction: system_instruction.into(),
            use_cases: None,
            parameters: None,
            tags: None,
            version: None,
            enabled: true,
            aliases: None,
            source: None,
            checksum: None,
            token_limits: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Build a spec from a stored row. Never fails: undecodable columns degrade.
    pub fn from_row(row: SpecRow) -> Self {
        let name = row.name;

        Self {
            use_cases: decode_list_column(&name, "use_cases", row.use_cases),
            parameters: decode_json_column(row.parameters.map(Value::String)),
            tags: decode_list_column(&name, "tags", row.tags),
            aliases: decode_list_column(&name, "aliases", row.aliases),
            token_limits: decode_json_column(row.token_limits.map(Value::String)),
            created_at: decode_timestamp_column(&name, "created_at", row.created_at),
            updated_at: decode_timestamp_column(&name, "updated_at", row.updated_at),
            description: row.description,
            provider: row.provider,
            model: row.model,
            web_search: row.web_search,
            reasoning_effort: row.reasoning_effort,
            context_size: row.context_size,
            temperature: row.temperature,
            max_output_tokens: row.max_output_tokens,
            system_instruction: row.system_instruction.unwrap_or_default(),
            version: row.version,
            enabled: row.enabled.unwrap_or(true),
            source: row.source,
            checksum: row.checksum,
            notes: row.notes,
            name,
        }
    }

    /// Flatten into column values suitable for parameterized writes.
    pub fn to_db_params(&self) -> SpecRow {
        SpecRow {
            name: self.name.clone(),
            description: self.description.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            web_search: self.web_search,
            reasoning_effort: self.reasoning_effort.clone(),
            context_size: self.context_size.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            system_instruction: Some(self.system_instruction.clone()),
            use_cases: self.use_cases.as_ref().map(encode_json),
            parameters: self.parameters.as_ref().map(encode_json),
            tags: self.tags.as_ref().map(encode_json),
            version: self.version.clone(),
            enabled: Some(self.enabled),
            aliases: self.aliases.as_ref().map(encode_json),
            source: self.source.clone(),
            checksum: self.checksum.clone(),
            token_limits: self.token_limits.as_ref().map(encode_json),
            notes: self.notes.clone(),
            created_at: self.created_at.as_ref().map(format_timestamp),
            updated_at: self.updated_at.as_ref().map(format_timestamp),
        }
    }

    /// The required fields keyed by name, as fed to the checksum.
    pub fn checksum_payload(&self) -> BTreeMap<String, Value> {
        let values = [
            opt_to_value(&self.description),
            opt_to_value(&self.provider),
            opt_to_value(&self.model),
            opt_to_value(&self.web_search),
            opt_to_value(&self.reasoning_effort),
            opt_to_value(&self.context_size),
            opt_to_value(&self.temperature),
            opt_to_value(&self.max_output_tokens),
            Value::String(self.system_instruction.clone()),
        ];

        checksum::REQUIRED_FIELDS
            .iter()
            .zip(values)
            .map(|(field, value)| ((*field).to_owned(), value))
            .collect()
    }

    pub fn compute_checksum(&self) -> String {
        checksum::compute_checksum(&self.checksum_payload())
    }

    /// True when `key` is this spec's name or one of its aliases.
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key
            || self
                .aliases
                .as_ref()
                .is_some_and(|aliases| aliases.iter().any(|a| a == key))
    }
}

/// Decode a JSON-typed column.
///
/// Objects and arrays pass through, text is parsed as JSON and wrapped as
/// `{"raw": text}` when that fails. Null and other scalars yield `None`.
pub fn decode_json_column(value: Option<Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        v @ (Value::Object(_) | Value::Array(_)) => Some(v),
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(parsed) => Some(parsed),
            Err(_) => Some(serde_json::json!({ "raw": text })),
        },
        Value::Bool(_) | Value::Number(_) => None,
    }
}

/// Storage format for timestamps: RFC 3339, UTC, fixed microsecond precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 as well as SQLite's `YYYY-MM-DD HH:MM:SS[.fff]` form.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn encode_json<T: Serialize>(value: &T) -> String {
    // Vec<String> and Value always serialize.
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_owned())
}

fn opt_to_value<T: Serialize>(value: &Option<T>) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn decode_list_column(name: &str, column: &str, text: Option<String>) -> Option<Vec<String>> {
    let text = text?;
    match serde_json::from_str::<Option<Vec<String>>>(&text) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(name, column, error = %e, "dropping undecodable list column");
            None
        }
    }
}

fn decode_timestamp_column(name: &str, column: &str, text: Option<String>) -> Option<DateTime<Utc>> {
    let text = text?;
    let parsed = parse_timestamp(&text);
    if parsed.is_none() {
        tracing::warn!(name, column, value = %text, "dropping unparseable timestamp");
    }
    parsed
}
