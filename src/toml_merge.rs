use std::path::Path;

use crate::{
    diagnostics::{DiagnosticKind, Diagnostics},
    emit::write_replace,
    error::{ConfigError, Result},
    mapping::NESTING_SEPARATOR,
    sources::Entry,
};

/// Overwrite the leaf at `path` (segments of a `__`-separated key) if every
/// segment already exists. Nothing is ever created.
///
/// Each segment is tried as written, then lower-cased, so both
/// `Creds__API_KEY` and `CREDENTIALS__PROJECT_ID` reach existing keys.
pub fn set_nested(doc: &mut toml::Table, path: &[&str], value: toml::Value) -> bool {
    let Some((leaf, parents)) = path.split_last() else {
        return false;
    };

    let mut cur: &mut toml::Table = doc;
    for seg in parents {
        match lookup_mut(cur, seg) {
            Some(toml::Value::Table(t)) => cur = t,
            _ => return false,
        }
    }

    match lookup_mut(cur, leaf) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

fn lookup_mut<'t>(table: &'t mut toml::Table, seg: &str) -> Option<&'t mut toml::Value> {
    if table.contains_key(seg) {
        table.get_mut(seg)
    } else {
        table.get_mut(&seg.to_lowercase())
    }
}

/// Apply entries in order; returns how many were written.
pub fn merge_entries(doc: &mut toml::Table, entries: &[Entry], diags: &mut Diagnostics) -> usize {
    let mut applied = 0;

    for e in entries {
        let path: Vec<&str> = e.key.split(NESTING_SEPARATOR).collect();
        if set_nested(doc, &path, e.value.to_toml()) {
            tracing::debug!(key = %e.key, "updated TOML key");
            applied += 1;
        } else {
            diags.push(
                DiagnosticKind::MissingDestinationPath,
                format!("TOML key '{}' not found in secrets.toml, skipping", e.key),
            );
        }
    }

    applied
}

pub fn load_toml(path: &Path) -> Result<toml::Table> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::DestinationNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&text).map_err(|e| ConfigError::DestinationParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Load `toml_path`, merge, and rewrite it in place.
pub fn emit_toml(entries: &[Entry], toml_path: &Path, diags: &mut Diagnostics) -> Result<usize> {
    let mut doc = load_toml(toml_path)?;
    let applied = merge_entries(&mut doc, entries, diags);

    let text = toml::to_string(&doc).map_err(|e| ConfigError::OutputWrite {
        path: toml_path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    write_replace(toml_path, &text)?;

    Ok(applied)
}
