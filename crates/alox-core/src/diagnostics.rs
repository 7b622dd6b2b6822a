use crate::span::SourceLocation;
use parking_lot::Mutex;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(text)
    }
}

/// A source location in a diagnostic together with a sub-message.
///
/// `source` names the module the location belongs to (its full path key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub source: String,
    pub location: SourceLocation,
    pub message: String,
}

impl Label {
    pub fn new(
        source: impl Into<String>,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            location,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub source_context: Option<String>,
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            source_context: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_source_context(mut self, context: impl Into<String>) -> Self {
        self.source_context = Some(context.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Downgrade an error into a warning, keeping everything else.
    pub fn into_warning(mut self) -> Self {
        if self.severity == Severity::Error {
            self.severity = Severity::Warning;
        }
        self
    }

    /// One line per item: header, labels, notes.
    pub fn render_plain(&self, fallback_context: Option<&str>) -> Vec<String> {
        let context = self
            .source_context
            .as_deref()
            .or(fallback_context)
            .unwrap_or("compiler");
        let header = match self.code.as_ref() {
            Some(code) => format!("[{}] {}: {} ({})", context, self.severity, self.message, code),
            None => format!("[{}] {}: {}", context, self.severity, self.message),
        };
        let mut lines = vec![header];
        for label in &self.labels {
            lines.push(format!(
                "   at {}:{} = {}",
                label.source, label.location, label.message
            ));
        }
        for note in &self.notes {
            lines.push(format!("   note: {}", note));
        }
        lines
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;

        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }

        for label in &self.labels {
            write!(f, " ({}:{}: {})", label.source, label.location, label.message)?;
        }

        Ok(())
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[derive(Debug, Clone)]
pub struct DiagnosticReport<T> {
    pub value: Option<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> DiagnosticReport<T> {
    pub fn success(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostics: Vec::new(),
        }
    }

    pub fn success_with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            value: Some(value),
            diagnostics,
        }
    }

    pub fn failure(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            value: None,
            diagnostics,
        }
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }

    pub fn into_result(self) -> Result<(T, Vec<Diagnostic>), Vec<Diagnostic>> {
        match self.value {
            Some(value) => Ok((value, self.diagnostics)),
            None => Err(self.diagnostics),
        }
    }
}

/// Thread-safe diagnostic sink shared by concurrently compiled modules.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticManager {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }

    pub fn add_diagnostics(&self, mut new_diagnostics: Vec<Diagnostic>) {
        self.diagnostics.lock().append(&mut new_diagnostics);
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics.lock())
    }

    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }

    /// Forward diagnostics to the log. The fallback context is used when a
    /// diagnostic does not specify one.
    pub fn emit(diagnostics: &[Diagnostic], fallback_context: Option<&str>) {
        for diagnostic in diagnostics {
            for line in diagnostic.render_plain(fallback_context) {
                match diagnostic.severity {
                    Severity::Error => tracing::error!("{}", line),
                    Severity::Warning => tracing::warn!("{}", line),
                    Severity::Note => tracing::info!("{}", line),
                }
            }
        }
    }
}
