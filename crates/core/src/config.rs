//! Configuration management for the Finsight advisor.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.finsight/config.yaml)
//!
//! The configuration is workspace-centric, with persisted state (the knowledge
//! index) stored under `.finsight/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// This struct holds all global options that affect pipeline behavior:
/// which generation and embedding providers to use, where the knowledge
/// index lives, and how calls to external capabilities are bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .finsight/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider (e.g., "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Custom endpoint for the generation provider
    pub endpoint: Option<String>,

    /// API key for providers that require one
    pub api_key: Option<String>,

    /// Embedding provider ("trigram" or "ollama")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Timeout in seconds for generation and retrieval calls
    pub call_timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embeddings: Option<EmbeddingSection>,
    logging: Option<LoggingSection>,
    workspace: Option<WorkspaceSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            call_timeout_secs: 60,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `FINSIGHT_WORKSPACE`: Override workspace path
    /// - `FINSIGHT_CONFIG`: Path to config file
    /// - `FINSIGHT_PROVIDER`: Generation provider
    /// - `FINSIGHT_MODEL`: Generation model identifier
    /// - `FINSIGHT_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("FINSIGHT_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("FINSIGHT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".finsight/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("FINSIGHT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("FINSIGHT_MODEL") {
            config.model = model;
        }

        if let Ok(key) = std::env::var("FINSIGHT_API_KEY") {
            config.api_key = Some(key);
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(env_var) = llm.api_key_env {
                if let Ok(key) = std::env::var(&env_var) {
                    result.api_key = Some(key);
                }
            }
            if let Some(timeout) = llm.timeout_secs {
                result.call_timeout_secs = timeout;
            }
        }

        if let Some(embeddings) = config_file.embeddings {
            if let Some(provider) = embeddings.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embeddings.model {
                result.embedding_model = model;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .finsight directory.
    pub fn finsight_dir(&self) -> PathBuf {
        self.workspace.join(".finsight")
    }

    /// Get the path to the knowledge index database.
    pub fn store_path(&self) -> PathBuf {
        self.finsight_dir().join("knowledge.db")
    }

    /// Ensure the .finsight directory exists.
    pub fn ensure_finsight_dir(&self) -> AppResult<()> {
        let dir = self.finsight_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .finsight directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        let known_embedding_providers = ["trigram", "ollama"];
        if !known_embedding_providers.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedding_providers.join(", ")
            )));
        }

        if self.call_timeout_secs == 0 {
            return Err(AppError::Config(
                "call_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.embedding_provider, "trigram");
        assert_eq!(config.call_timeout_secs, 60);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_finsight_dir() {
        let config = AppConfig::default();
        let dir = config.finsight_dir();
        assert!(dir.ends_with(".finsight"));
        assert!(config.store_path().ends_with(".finsight/knowledge.db"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.1".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.1");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_embedding_provider() {
        let mut config = AppConfig::default();
        config.embedding_provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = AppConfig::default();
        config.call_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
