//! Application configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables for the generative service.

use crate::editor::EditorConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tkf_events::EventLogConfig;
use tkf_fabric::FabricConfig;
use tkf_knowledge::GeneratorConfig;
use tkf_llm::LlmConfig;

/// Top-level configuration of the `tkf` tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generative service
    pub llm: LlmConfig,
    /// Event log
    pub events: EventLogConfig,
    /// Admission engine
    pub fabric: FabricConfig,
    /// Candidate generator
    pub generator: GeneratorConfig,
    /// Editor agent
    pub editor: EditorConfig,
    /// Directory of persona profiles
    pub personas_dir: Option<PathBuf>,
    /// Directory of browser runs
    pub runs_dir: Option<PathBuf>,
    /// Initial-knowledge artifact
    pub init_knowledge: Option<PathBuf>,
}

impl AppConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` for invalid TOML.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Load from a file when given, else defaults; then apply the environment
    ///
    /// # Errors
    /// `ConfigError` when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply `TKF_LLM_*` / `OPENAI_*` environment overrides
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.llm = self.llm.with_env_overrides();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tkf_fabric::AdmissionMode;

    #[test]
    fn parses_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            personas_dir = "data/personas"

            [fabric]
            admission_mode = "serializable"
            check_timeout_secs = 30

            [editor]
            max_steps = 4

            [llm]
            model = "gpt-4o"
            "#,
        )
        .unwrap();

        assert_eq!(config.personas_dir, Some(PathBuf::from("data/personas")));
        assert_eq!(config.fabric.admission_mode, AdmissionMode::Serializable);
        assert_eq!(config.fabric.check_timeout_secs, Some(30));
        assert_eq!(config.fabric.max_updates, 100_000);
        assert_eq!(config.editor.max_steps, 4);
        assert_eq!(config.llm.model, "gpt-4o");
        assert!(config.generator.validate_concurrently);
        assert_eq!(config.events.max_events, 100_000);
    }

    #[test]
    fn invalid_toml() {
        let err = AppConfig::from_toml("[fabric]\nadmission_mode = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tkf.toml");
        std::fs::write(&path, "runs_dir = \"runs\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.runs_dir, Some(PathBuf::from("runs")));

        let missing = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
