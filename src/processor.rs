use std::{io::Write, path::PathBuf};

use crate::{
    diagnostics::Diagnostics,
    emit::{dedupe_destinations, emit_env, emit_stdout},
    error::{ConfigError, Result},
    mapping::MappingSpec,
    sources::{load_json_sources, resolve_from_env, resolve_from_files, EnvLookup},
    target::{Destination, Target, DEFAULT_OUTPUT, DEFAULT_PREFIX},
    toml_merge::emit_toml,
};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mapping_file: PathBuf,
    pub target: Target,
    pub output: PathBuf,
    pub prefix: String,
    pub no_encode: bool,
    pub secrets_toml: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(mapping_file: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            mapping_file: mapping_file.into(),
            target,
            output: PathBuf::from(DEFAULT_OUTPUT),
            prefix: DEFAULT_PREFIX.to_string(),
            no_encode: false,
            secrets_toml: None,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub target: Target,
    /// File that was written, `None` for stdout.
    pub destination: Option<PathBuf>,
    /// Entries resolved from all sources.
    pub resolved: usize,
    /// Entries that made it into the destination.
    pub written: usize,
    pub diagnostics: Diagnostics,
}

/// Where this run writes, resolved before any input is read.
enum Sink {
    EnvFile(PathBuf),
    Stdout,
    Toml(PathBuf),
}

pub struct Processor<'a> {
    env: &'a dyn EnvLookup,
}

impl<'a> Processor<'a> {
    pub fn new(env: &'a dyn EnvLookup) -> Self {
        Self { env }
    }

    /// `stdout` receives the `export_to_env` output; other targets never touch it.
    pub fn run(&self, opts: &RunOptions, stdout: &mut dyn Write) -> Result<RunReport> {
        let mut diags = Diagnostics::new();
        let settings = opts.target.settings(&opts.prefix, opts.no_encode, &mut diags);

        let sink = match settings.destination {
            Destination::EnvFile => Sink::EnvFile(opts.output.clone()),
            Destination::Stdout => Sink::Stdout,
            Destination::Toml => Sink::Toml(
                opts.secrets_toml
                    .clone()
                    .ok_or(ConfigError::MissingSecretsToml)?,
            ),
        };

        let spec = MappingSpec::load(&opts.mapping_file)?;
        let sources = load_json_sources(&spec)?;

        let mut entries = resolve_from_env(&spec, self.env, &mut diags);
        entries.extend(resolve_from_files(&spec, &sources, &mut diags));
        let resolved = entries.len();

        tracing::debug!(
            target_tool = %opts.target,
            resolved,
            sources = sources.len(),
            "resolved mapping"
        );

        let (destination, written) = match sink {
            Sink::EnvFile(path) => {
                let entries = dedupe_destinations(entries, &mut diags);
                let n = emit_env(&entries, &settings.prefix, settings.must_base64, &path)?;
                (Some(path), n)
            }
            Sink::Stdout => {
                let entries = dedupe_destinations(entries, &mut diags);
                let n = emit_stdout(&entries, &settings.prefix, settings.must_base64, stdout)?;
                (None, n)
            }
            Sink::Toml(path) => {
                let n = emit_toml(&entries, &path, &mut diags)?;
                (Some(path), n)
            }
        };

        tracing::info!(
            target_tool = %opts.target,
            written,
            skipped = diags.skipped(),
            "secrets emitted"
        );

        Ok(RunReport {
            target: opts.target,
            destination,
            resolved,
            written,
            diagnostics: diags,
        })
    }
}
