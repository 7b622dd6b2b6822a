use crate::config::PipelineOptions;
use alox_core::diagnostics::{has_errors, Diagnostic, DiagnosticManager};
use std::error::Error;
use std::fmt;

/// Diagnostics of one pipeline run. Stage output is logged once the stage
/// finishes and kept in `reported`.
#[derive(Debug, Default, Clone)]
pub struct PipelineDiagnostics {
    pub items: Vec<Diagnostic>,
    pub reported: Vec<Diagnostic>,
}

impl PipelineDiagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn emit_stage(&mut self, stage: &'static str, options: &PipelineOptions) {
        if self.items.is_empty() {
            return;
        }
        let tolerance = &options.error_tolerance;
        let shown = if tolerance.show_all_errors || tolerance.max_errors == 0 {
            self.items.len()
        } else {
            tolerance.max_errors.min(self.items.len())
        };
        DiagnosticManager::emit(&self.items[..shown], Some(stage));
        if shown < self.items.len() {
            tracing::warn!("[{}] {} more diagnostics suppressed", stage, self.items.len() - shown);
        }
        self.reported.append(&mut self.items);
    }

    pub fn extend(&mut self, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            return;
        }
        self.items.extend(diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.items) || has_errors(&self.reported)
    }

    /// Everything collected, reported first.
    pub fn into_vec(mut self) -> Vec<Diagnostic> {
        self.reported.append(&mut self.items);
        self.reported
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineError {
    pub stage: &'static str,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

impl Error for PipelineError {}
