use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors. Per-entry problems are reported as diagnostics instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The mapping file does not exist or cannot be read.
    #[error("mapping file not found: {}", path.display())]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mapping file is not valid YAML or has the wrong shape.
    #[error("invalid mapping file {}: {detail}", path.display())]
    ConfigParse { path: PathBuf, detail: String },

    /// Neither `files` nor `from_env` is present.
    #[error("neither 'files' nor 'from_env' section found in mapping file {}", path.display())]
    NoSources { path: PathBuf },

    /// A JSON source listed under `files` is missing.
    #[error("source file not found for '{header}': {}", path.display())]
    SourceFileNotFound {
        header: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON source listed under `files` does not parse.
    #[error("invalid JSON in source file for '{header}': {}", path.display())]
    SourceParse {
        header: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The TOML document to merge into is missing.
    #[error("secrets.toml not found: {}", path.display())]
    DestinationNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML document to merge into does not parse.
    #[error("invalid TOML in {}: {detail}", path.display())]
    DestinationParse { path: PathBuf, detail: String },

    #[error("target dlt_dest_bigquery requires --secrets_toml")]
    MissingSecretsToml,

    /// Writing the destination failed.
    #[error("failed to write {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn parse(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
