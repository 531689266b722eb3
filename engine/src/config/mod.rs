//! Configuration management
//!
//! This module handles loading, validation, and management of the Codepin configuration.
//! Configuration is stored in TOML format at ~/.codepin/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **generation**: Code-generation model endpoint and sampling settings
//! - **research**: Context provider settings (optional)
//! - **storage**: Content-addressed storage backend
//! - **manifest**: Manifest database location and owner document key
//! - **server**: HTTP bind address (optional)
//!
//! Credentials are never stored here. Each section names the environment
//! variable that holds its credential (`api_key_env`, `jwt_env`).
//!
//! # Examples
//!
//! ```no_run
//! use codepin_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Model: {}", config.generation.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Code generation backend
    pub generation: GenerationConfig,

    /// Context provider
    #[serde(default)]
    pub research: ResearchConfig,

    /// Content-addressed storage
    pub storage: StorageConfig,

    /// Manifest persistence
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Code generation backend configuration
///
/// Any OpenAI-compatible chat completions endpoint works; the default points
/// at Groq.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the chat completions API
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Penalty for repeated tokens (-2.0 to 2.0)
    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f32,

    /// Ask the provider for a JSON-object response
    #[serde(default = "default_true")]
    pub json_mode: bool,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,
}

/// Context provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Enable model-backed research; when disabled the fallback text is used
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model used for research (defaults to the generation model)
    #[serde(default)]
    pub model: Option<String>,

    /// Upper bound on research tokens
    #[serde(default = "default_research_max_tokens")]
    pub max_tokens: u32,

    /// Research timeout in seconds
    #[serde(default = "default_research_timeout")]
    pub timeout_secs: u64,

    /// Text injected when research is unavailable
    #[serde(default = "default_research_fallback")]
    pub fallback: String,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to publish to (pinata, memory)
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Upload endpoint
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Gateway host used to build retrieval links
    #[serde(default)]
    pub gateway: Option<String>,

    /// Environment variable holding the upload JWT
    #[serde(default = "default_jwt_env")]
    pub jwt_env: String,

    /// Per-upload timeout in seconds
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

/// Manifest persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// SQLite database path (defaults to <data_dir>/codepin.db)
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Key of the owner document every manifest is appended to
    #[serde(default = "default_owner_key")]
    pub owner_key: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            database: None,
            owner_key: default_owner_key(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.codepin")
}

fn default_generation_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_generation_model() -> String {
    "moonshotai/kimi-k2-instruct-0905".to_string()
}

fn default_temperature() -> f32 {
    0.6
}

fn default_max_tokens() -> u32 {
    9000
}

fn default_top_p() -> f32 {
    1.0
}

fn default_frequency_penalty() -> f32 {
    0.8
}

fn default_generation_timeout() -> u64 {
    120
}

fn default_generation_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_research_max_tokens() -> u32 {
    1500
}

fn default_research_timeout() -> u64 {
    30
}

fn default_research_fallback() -> String {
    "No research context available. Use current stable library versions.".to_string()
}

fn default_storage_backend() -> String {
    "pinata".to_string()
}

fn default_upload_url() -> String {
    "https://uploads.pinata.cloud/v3/files".to_string()
}

fn default_jwt_env() -> String {
    "PINATA_JWT".to_string()
}

fn default_upload_timeout() -> u64 {
    60
}

fn default_owner_key() -> String {
    "system".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            frequency_penalty: default_frequency_penalty(),
            json_mode: true,
            timeout_secs: default_generation_timeout(),
            api_key_env: default_generation_key_env(),
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            max_tokens: default_research_max_tokens(),
            timeout_secs: default_research_timeout(),
            fallback: default_research_fallback(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            upload_url: default_upload_url(),
            gateway: None,
            jwt_env: default_jwt_env(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.codepin/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, PipelineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, PipelineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable ~ paths
        let config = Self::default_config();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| PipelineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = config;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.codepin/config.toml)
    fn default_config_path() -> Result<PathBuf, PipelineError> {
        let home = dirs::home_dir().ok_or_else(|| {
            PipelineError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".codepin").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
            },
            generation: GenerationConfig::default(),
            research: ResearchConfig::default(),
            storage: StorageConfig::default(),
            manifest: ManifestConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Path of the manifest database
    pub fn database_path(&self) -> PathBuf {
        self.manifest
            .database
            .clone()
            .unwrap_or_else(|| self.core.data_dir.join("codepin.db"))
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates log level, sampling settings and backend names
    /// - Expands ~ in paths
    /// - Creates the data directory if it doesn't exist
    fn validate_and_process(&mut self) -> Result<(), PipelineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(PipelineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let generation = &self.generation;
        if generation.base_url.trim().is_empty() {
            return Err(PipelineError::Config(
                "generation.base_url must not be empty".to_string(),
            ));
        }
        if generation.model.trim().is_empty() {
            return Err(PipelineError::Config(
                "generation.model must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(PipelineError::Config(
                "generation.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&generation.top_p) {
            return Err(PipelineError::Config(
                "generation.top_p must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(-2.0..=2.0).contains(&generation.frequency_penalty) {
            return Err(PipelineError::Config(
                "generation.frequency_penalty must be between -2.0 and 2.0".to_string(),
            ));
        }
        if generation.max_tokens == 0 {
            return Err(PipelineError::Config(
                "generation.max_tokens must be greater than 0".to_string(),
            ));
        }
        if generation.timeout_secs == 0
            || self.research.timeout_secs == 0
            || self.storage.timeout_secs == 0
        {
            return Err(PipelineError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        let valid_backends = ["pinata", "memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(PipelineError::Config(format!(
                "Invalid storage backend '{}'. Must be one of: {}",
                self.storage.backend,
                valid_backends.join(", ")
            )));
        }

        if self.manifest.owner_key.trim().is_empty() {
            return Err(PipelineError::Config(
                "manifest.owner_key must not be empty".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(database) = &self.manifest.database {
            self.manifest.database = Some(expand_path(database)?);
        }

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                PipelineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, PipelineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| PipelineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            PipelineError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| PipelineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.generation.max_tokens, 9000);
        assert!(config.generation.json_mode);
        assert_eq!(config.storage.backend, "pinata");
        assert_eq!(config.manifest.owner_key, "system");
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.generation.model, deserialized.generation.model);
        assert_eq!(config.storage.upload_url, deserialized.storage.upload_url);
    }

    #[test]
    fn test_database_path_defaults_to_data_dir() {
        let mut config = Config::default_config();
        config.core.data_dir = PathBuf::from("/var/lib/codepin");

        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/codepin/codepin.db")
        );

        config.manifest.database = Some(PathBuf::from("/tmp/other.db"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/other.db"));
    }
}
