use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub const FILES_KEY: &str = "files";
pub const FROM_ENV_KEY: &str = "from_env";

/// Separator used in destination keys to address nested TOML tables.
pub const NESTING_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSpec {
    pub path: PathBuf,
    /// File-header name and JSON path, in document order.
    pub files: Vec<(String, PathBuf)>,
    /// Environment variable name and destination key, in document order.
    pub from_env: Vec<(String, String)>,
    pub sections: Vec<Section>,
}

/// A non-reserved top-level block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: String,
    /// Source key (or literal value) and destination key.
    pub entries: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct RawMapping {
    #[serde(default)]
    files: Option<Mapping>,

    #[serde(default)]
    from_env: Option<Mapping>,

    #[serde(flatten)]
    sections: Mapping,
}

impl MappingSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    /// Parse mapping text; `path` is only used for error messages.
    pub fn from_yaml_str(text: &str, path: &Path) -> Result<Self> {
        let raw: RawMapping =
            serde_yaml::from_str(text).map_err(|e| ConfigError::parse(path, e))?;

        if raw.files.is_none() && raw.from_env.is_none() {
            return Err(ConfigError::NoSources {
                path: path.to_path_buf(),
            });
        }

        let files = match raw.files {
            Some(m) => string_pairs(&m, path, FILES_KEY)?
                .into_iter()
                .map(|(header, p)| (header, expand_home(&p)))
                .collect(),
            None => Vec::new(),
        };

        let from_env = match raw.from_env {
            Some(m) => string_pairs(&m, path, FROM_ENV_KEY)?,
            None => Vec::new(),
        };

        let mut sections = Vec::new();
        for (k, v) in raw.sections.iter() {
            let header = scalar_to_string(k)
                .ok_or_else(|| ConfigError::parse(path, "section headers must be scalars"))?;

            let entries = match v {
                Value::Null => Vec::new(),
                Value::Mapping(m) => string_pairs(m, path, &header)?,
                _ => {
                    return Err(ConfigError::parse(
                        path,
                        format!("section '{header}' must be a mapping"),
                    ))
                }
            };

            sections.push(Section { header, entries });
        }

        Ok(Self {
            path: path.to_path_buf(),
            files,
            from_env,
            sections,
        })
    }
}

fn string_pairs(m: &Mapping, path: &Path, block: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::with_capacity(m.len());
    for (k, v) in m.iter() {
        let key = scalar_to_string(k).ok_or_else(|| {
            ConfigError::parse(path, format!("'{block}' has a non-scalar key"))
        })?;
        let val = scalar_to_string(v).ok_or_else(|| {
            ConfigError::parse(path, format!("'{block}.{key}' must map to a scalar"))
        })?;
        out.push((key, val));
    }
    Ok(out)
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}
