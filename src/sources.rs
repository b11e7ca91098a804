use serde_json::Value as Json;
use std::collections::{BTreeMap, HashMap};

use crate::{
    diagnostics::{DiagnosticKind, Diagnostics},
    error::{ConfigError, Result},
    mapping::MappingSpec,
};

/// Parsed JSON documents keyed by their `files` header.
pub type JsonSources = BTreeMap<String, Json>;

/// Where `from_env` names are looked up.
pub trait EnvLookup {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A scalar (or, for JSON sources, structured) value ready to emit.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    /// JSON `null`; emitted as the text `null`.
    Null,
    /// JSON object or array.
    Structured(Json),
}

impl SourceValue {
    pub fn from_json(v: &Json) -> Self {
        match v {
            Json::Null => Self::Null,
            Json::String(s) => Self::String(s.clone()),
            Json::Number(n) => Self::Number(n.clone()),
            Json::Bool(b) => Self::Bool(*b),
            Json::Array(_) | Json::Object(_) => Self::Structured(v.clone()),
        }
    }

    /// Text form used in env-style outputs.
    pub fn render(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
            Self::Structured(v) => v.to_string(),
        }
    }

    pub fn to_toml(&self) -> toml::Value {
        match self {
            Self::String(s) => toml::Value::String(s.clone()),
            Self::Number(n) => number_to_toml(n),
            Self::Bool(b) => toml::Value::Boolean(*b),
            // TOML has no null
            Self::Null => toml::Value::String("null".to_string()),
            Self::Structured(v) => json_to_toml(v).unwrap_or_else(|| toml::Value::String(v.to_string())),
        }
    }
}

fn number_to_toml(n: &serde_json::Number) -> toml::Value {
    if let Some(i) = n.as_i64() {
        toml::Value::Integer(i)
    } else if let Some(f) = n.as_f64() {
        toml::Value::Float(f)
    } else {
        // u64 beyond i64::MAX has no TOML integer form
        toml::Value::String(n.to_string())
    }
}

/// TOML has no null, so nulls inside arrays and tables are dropped.
fn json_to_toml(v: &Json) -> Option<toml::Value> {
    match v {
        Json::Null => None,
        Json::String(s) => Some(toml::Value::String(s.clone())),
        Json::Number(n) => Some(number_to_toml(n)),
        Json::Bool(b) => Some(toml::Value::Boolean(*b)),
        Json::Array(items) => Some(toml::Value::Array(
            items.iter().filter_map(json_to_toml).collect(),
        )),
        Json::Object(map) => {
            let mut table = toml::Table::new();
            for (k, item) in map {
                if let Some(tv) = json_to_toml(item) {
                    table.insert(k.clone(), tv);
                }
            }
            Some(toml::Value::Table(table))
        }
    }
}

/// One resolved destination key and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: SourceValue,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: SourceValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

pub fn load_json_sources(spec: &MappingSpec) -> Result<JsonSources> {
    let mut out = JsonSources::new();

    for (header, path) in spec.files.iter() {
        let text =
            std::fs::read_to_string(path).map_err(|source| ConfigError::SourceFileNotFound {
                header: header.clone(),
                path: path.clone(),
                source,
            })?;

        let doc: Json =
            serde_json::from_str(&text).map_err(|source| ConfigError::SourceParse {
                header: header.clone(),
                path: path.clone(),
                source,
            })?;

        tracing::debug!(header = %header, path = %path.display(), "loaded JSON source");
        out.insert(header.clone(), doc);
    }

    Ok(out)
}

pub fn resolve_from_env(
    spec: &MappingSpec,
    env: &dyn EnvLookup,
    diags: &mut Diagnostics,
) -> Vec<Entry> {
    let mut out = Vec::with_capacity(spec.from_env.len());

    for (var, dest) in spec.from_env.iter() {
        match env.var(var) {
            Some(value) => out.push(Entry::new(dest.clone(), SourceValue::String(value))),
            None => diags.push(
                DiagnosticKind::MissingEnvVar,
                format!("environment variable '{var}' not found, skipping"),
            ),
        }
    }

    out
}

pub fn resolve_from_files(
    spec: &MappingSpec,
    sources: &JsonSources,
    diags: &mut Diagnostics,
) -> Vec<Entry> {
    let mut out = Vec::new();

    for section in spec.sections.iter() {
        let Some(doc) = sources.get(&section.header) else {
            diags.push(
                DiagnosticKind::LiteralSection,
                format!(
                    "section '{}' names no file source, using its keys as literal values",
                    section.header
                ),
            );
            for (literal, dest) in section.entries.iter() {
                out.push(Entry::new(dest.clone(), SourceValue::String(literal.clone())));
            }
            continue;
        };

        for (json_key, dest) in section.entries.iter() {
            let Some(raw) = doc.get(json_key) else {
                diags.push(
                    DiagnosticKind::MissingKey,
                    format!(
                        "key '{json_key}' not found in JSON data for file header '{}', skipping",
                        section.header
                    ),
                );
                continue;
            };

            out.push(Entry::new(dest.clone(), SourceValue::from_json(raw)));
        }
    }

    out
}
