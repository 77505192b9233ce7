//! Analyzer configuration

use serde::{Deserialize, Serialize};

/// Options for [`crate::Analyzer`]. Deserialisable so hosts can embed it in
/// their own settings; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Run the recovery parse when the strict parse fails
    pub recovery: bool,
    /// Run semantic validation on clean documents
    pub validate: bool,
    /// Value of [`crate::Diagnostic::source`]
    pub source_name: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            recovery: true,
            validate: true,
            source_name: "rehearse".to_string(),
        }
    }
}

impl AnalyzerConfig {
    pub fn with_recovery(mut self, recovery: bool) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AnalyzerConfig = serde_json::from_str(r#"{"recovery": false}"#).unwrap();
        assert!(!config.recovery);
        assert!(config.validate);
        assert_eq!(config.source_name, "rehearse");
    }

    #[test]
    fn test_builders() {
        let config = AnalyzerConfig::default()
            .with_validation(false)
            .with_source_name("lsp");
        assert!(config.recovery);
        assert!(!config.validate);
        assert_eq!(config.source_name, "lsp");
    }
}
