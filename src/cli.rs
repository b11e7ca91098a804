use clap::Parser;
use std::path::PathBuf;

use crate::{
    processor::RunOptions,
    target::{Target, DEFAULT_OUTPUT, DEFAULT_PREFIX},
};

#[derive(Parser, Debug)]
#[command(
    name = "secretmap",
    version,
    about = "Move secrets from JSON files or environment variables into an .env file, shell exports, or a secrets.toml using a YAML mapping."
)]
pub struct Args {
    /// Path to the YAML mapping file
    pub mapping_file: PathBuf,

    /// Tool the credentials are written for
    #[arg(value_enum)]
    pub target_tool: Target,

    /// Output .env file (docker, kestra)
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Prefix for emitted variable names (docker, export_to_env)
    #[arg(short = 'p', long = "prefix", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Write values without base64 encoding
    #[arg(long = "no_encode", default_value_t = false)]
    pub no_encode: bool,

    /// secrets.toml to update in place (required for dlt_dest_bigquery)
    #[arg(long = "secrets_toml", required_if_eq("target_tool", "dlt_dest_bigquery"))]
    pub secrets_toml: Option<PathBuf>,

    /// Log per-entry progress (overrides SECRETMAP_LOG)
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            mapping_file: self.mapping_file.clone(),
            target: self.target_tool,
            output: self.output.clone(),
            prefix: self.prefix.clone(),
            no_encode: self.no_encode,
            secrets_toml: self.secrets_toml.clone(),
        }
    }
}
