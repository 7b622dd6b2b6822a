use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Name recorded in log output and diagnostics.
    pub module_name: String,
    /// Report lowering failures as warnings and keep the partial program.
    pub tolerate_errors: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            module_name: "main".to_string(),
            tolerate_errors: false,
        }
    }
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    pub fn with_tolerate_errors(mut self, tolerate: bool) -> Self {
        self.tolerate_errors = tolerate;
        self
    }
}
