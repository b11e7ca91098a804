pub mod cli;
pub mod diagnostics;
pub mod emit;
pub mod encode;
pub mod error;
pub mod mapping;
pub mod processor;
pub mod sources;
pub mod target;
pub mod toml_merge;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::ConfigError;
pub use mapping::MappingSpec;
pub use processor::{Processor, RunOptions, RunReport};
pub use sources::{EnvLookup, ProcessEnv, SourceValue};
pub use target::Target;
