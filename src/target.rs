use clap::ValueEnum;
use std::fmt;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

pub const DEFAULT_PREFIX: &str = "SECRET_";
pub const DEFAULT_OUTPUT: &str = ".env_encoded";

/// The tool a run produces credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// `.env` file for docker compose, configurable prefix, plain values.
    #[value(name = "docker")]
    Docker,
    /// `.env` file for Kestra, fixed `SECRET_` prefix, base64 values.
    #[value(name = "kestra")]
    Kestra,
    /// In-place merge into a dlt `secrets.toml`.
    #[value(name = "dlt_dest_bigquery")]
    DltDestBigquery,
    /// `export` lines on stdout, configurable prefix, plain values.
    #[value(name = "export_to_env")]
    ExportToEnv,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Docker => "docker",
            Target::Kestra => "kestra",
            Target::DltDestBigquery => "dlt_dest_bigquery",
            Target::ExportToEnv => "export_to_env",
        }
    }

    /// Work out prefix and encoding for this target, noting CLI options that
    /// have no effect here.
    pub fn settings(self, prefix: &str, no_encode: bool, diags: &mut Diagnostics) -> TargetSettings {
        let custom_prefix = prefix != DEFAULT_PREFIX;

        match self {
            Target::Docker => TargetSettings::new(Destination::EnvFile, prefix, false),
            Target::ExportToEnv => TargetSettings::new(Destination::Stdout, prefix, false),
            Target::Kestra => {
                if no_encode {
                    diags.push(
                        DiagnosticKind::IgnoredOption,
                        "--no_encode ignored: kestra values are always base64-encoded",
                    );
                }
                if custom_prefix {
                    diags.push(
                        DiagnosticKind::IgnoredOption,
                        format!("--prefix '{prefix}' ignored: kestra always uses '{DEFAULT_PREFIX}'"),
                    );
                }
                TargetSettings::new(Destination::EnvFile, DEFAULT_PREFIX, true)
            }
            Target::DltDestBigquery => {
                if custom_prefix {
                    diags.push(
                        DiagnosticKind::IgnoredOption,
                        "--prefix ignored for dlt_dest_bigquery",
                    );
                }
                TargetSettings::new(Destination::Toml, "", false)
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    EnvFile,
    Stdout,
    Toml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSettings {
    pub destination: Destination,
    pub prefix: String,
    pub must_base64: bool,
}

impl TargetSettings {
    fn new(destination: Destination, prefix: &str, must_base64: bool) -> Self {
        Self {
            destination,
            prefix: prefix.to_string(),
            must_base64,
        }
    }
}
