use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A `from_env` variable is not set.
    MissingEnvVar,
    /// A key mapped from a JSON source is not in that document.
    MissingKey,
    /// A TOML destination path does not already exist.
    MissingDestinationPath,
    /// A section header names no loaded source and is treated as literal values.
    LiteralSection,
    /// An env-style destination key was already emitted in this run.
    DuplicateDestination,
    /// A CLI option has no effect for the selected target.
    IgnoredOption,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::MissingEnvVar => "missing_env_var",
            DiagnosticKind::MissingKey => "missing_key",
            DiagnosticKind::MissingDestinationPath => "missing_destination_path",
            DiagnosticKind::LiteralSection => "literal_section",
            DiagnosticKind::DuplicateDestination => "duplicate_destination",
            DiagnosticKind::IgnoredOption => "ignored_option",
        }
    }

    /// Whether the entry the diagnostic refers to was dropped from the output.
    pub fn is_skip(self) -> bool {
        !matches!(
            self,
            DiagnosticKind::LiteralSection | DiagnosticKind::IgnoredOption
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(kind = kind.as_str(), "{message}");
        self.items.push(Diagnostic { kind, message });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn skipped(&self) -> usize {
        self.items.iter().filter(|d| d.kind.is_skip()).count()
    }
}
