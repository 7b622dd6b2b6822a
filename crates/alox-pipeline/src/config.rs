use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for pipeline execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Debug options
    pub debug: DebugOptions,
    /// Error tolerance options
    pub error_tolerance: ErrorToleranceOptions,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

/// Debug options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Log every translated IR module
    pub print_ir: bool,
    /// Log every lowered LIR program
    pub print_lir: bool,
    /// Enable verbose output
    pub verbose: bool,
}

/// Error tolerance configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorToleranceOptions {
    /// Report lowering failures as warnings and keep the partial program
    pub enabled: bool,
    /// Maximum number of errors to collect before giving up (0 = unlimited)
    pub max_errors: usize,
    /// Log every diagnostic of a stage instead of the first `max_errors`
    pub show_all_errors: bool,
    /// Keep lowering the remaining modules after one fails
    pub continue_on_error: bool,
}

impl Default for ErrorToleranceOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            max_errors: 10,
            show_all_errors: false,
            continue_on_error: true,
        }
    }
}

impl ErrorToleranceOptions {
    /// Whether `count` errors exhaust the budget.
    pub fn exhausted(&self, count: usize) -> bool {
        self.max_errors != 0 && count >= self.max_errors
    }
}

impl PipelineOptions {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read pipeline options from {}", path.display()))?;
        Self::from_json(&text)
            .wrap_err_with(|| format!("invalid pipeline options in {}", path.display()))
    }

    pub fn log_level(&self) -> &str {
        match &self.log_level {
            Some(level) => level,
            None if self.debug.verbose => "debug",
            None => "info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options = PipelineOptions::from_json(r#"{ "error_tolerance": { "enabled": true } }"#)
            .expect("valid options");
        assert!(options.error_tolerance.enabled);
        assert_eq!(options.error_tolerance.max_errors, 10);
        assert!(options.error_tolerance.continue_on_error);
        assert!(!options.debug.print_ir);
        assert_eq!(options.log_level(), "info");
    }

    #[test]
    fn explicit_log_level_wins_over_verbosity() {
        let mut options = PipelineOptions::default();
        options.debug.verbose = true;
        assert_eq!(options.log_level(), "debug");

        options.log_level = Some("alox_backend=trace".to_string());
        assert_eq!(options.log_level(), "alox_backend=trace");
    }

    #[test]
    fn unlimited_budget_is_never_exhausted() {
        let tolerance = ErrorToleranceOptions {
            max_errors: 0,
            ..Default::default()
        };
        assert!(!tolerance.exhausted(1_000));
        assert!(ErrorToleranceOptions::default().exhausted(10));
    }
}
