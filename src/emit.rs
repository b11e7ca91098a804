use std::{
    collections::HashSet,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    diagnostics::{DiagnosticKind, Diagnostics},
    encode::encode,
    error::{ConfigError, Result},
    sources::Entry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// `PREFIXKEY=value`
    EnvFile,
    /// `export PREFIXKEY='value'`
    ShellExport,
}

#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    style: LineStyle,
    prefix: &'a str,
    must_base64: bool,
}

impl<'a> Emitter<'a> {
    pub fn new(style: LineStyle, prefix: &'a str, must_base64: bool) -> Self {
        Self {
            style,
            prefix,
            must_base64,
        }
    }

    pub fn line(&self, out: &mut String, entry: &Entry) {
        let value = encode(&entry.value, self.must_base64);

        match self.style {
            LineStyle::EnvFile => {
                out.push_str(self.prefix);
                out.push_str(&entry.key);
                out.push('=');
                out.push_str(&value);
                out.push('\n');
            }
            LineStyle::ShellExport => {
                out.push_str("export ");
                out.push_str(self.prefix);
                out.push_str(&entry.key);
                out.push('=');
                out.push_str(&quote_posix_single(&value));
                out.push('\n');
            }
        }
    }

    pub fn render(&self, entries: &[Entry]) -> String {
        let mut out = String::new();
        for e in entries {
            self.line(&mut out, e);
        }
        out
    }
}

pub fn render_env_lines(entries: &[Entry], prefix: &str, must_base64: bool) -> String {
    Emitter::new(LineStyle::EnvFile, prefix, must_base64).render(entries)
}

pub fn render_export_lines(entries: &[Entry], prefix: &str, must_base64: bool) -> String {
    Emitter::new(LineStyle::ShellExport, prefix, must_base64).render(entries)
}

/// Keep the first entry for each destination key; later ones are dropped
/// with a `DuplicateDestination` diagnostic.
pub fn dedupe_destinations(entries: Vec<Entry>, diags: &mut Diagnostics) -> Vec<Entry> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());

    for e in entries {
        if seen.contains(&e.key) {
            diags.push(
                DiagnosticKind::DuplicateDestination,
                format!("destination '{}' already set by an earlier entry, skipping", e.key),
            );
            continue;
        }
        seen.insert(e.key.clone());
        out.push(e);
    }

    out
}

/// Overwrite `path` with one line per entry. Returns the number of lines.
pub fn emit_env(
    entries: &[Entry],
    prefix: &str,
    must_base64: bool,
    path: &Path,
) -> Result<usize> {
    let text = render_env_lines(entries, prefix, must_base64);
    write_replace(path, &text)?;
    Ok(entries.len())
}

/// Write `text` to a sibling temp file, then rename it over `path`.
/// `path` holds either its old content or the new one, never a partial write.
pub fn write_replace(path: &Path, text: &str) -> Result<()> {
    let tmp_path = tmp_sibling(path);

    let res = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(text.as_bytes())?;
            file.sync_all()
        })
        .and_then(|_| std::fs::rename(&tmp_path, path));

    if let Err(source) = res {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ConfigError::OutputWrite {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn emit_stdout(
    entries: &[Entry],
    prefix: &str,
    must_base64: bool,
    out: &mut dyn Write,
) -> Result<usize> {
    let text = render_export_lines(entries, prefix, must_base64);

    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|source| ConfigError::OutputWrite {
            path: "<stdout>".into(),
            source,
        })?;

    Ok(entries.len())
}

fn quote_posix_single(s: &str) -> String {
    let mut out = String::from("'");
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}
