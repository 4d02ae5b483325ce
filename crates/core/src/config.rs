//! Configuration management for the codeindex CLI.
//!
//! This module handles loading and merging process-level configuration from:
//! - Environment variables
//! - Command-line flags
//! - The `logging` and `network` sections of the settings file
//!   (`.codeindex/settings.yaml`)
//!
//! Indexing settings (provider, credentials, Qdrant endpoint) live in the same
//! settings file but are read through the index crate's `ConfigSource`, not here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Directory under the workspace holding codeindex state.
pub const STATE_DIR: &str = ".codeindex";

/// Default settings file name inside [`STATE_DIR`].
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Default secrets file name inside [`STATE_DIR`].
pub const SECRETS_FILE: &str = "secrets.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root being indexed
    pub workspace: PathBuf,

    /// Optional settings file override
    pub config_file: Option<PathBuf>,

    /// Optional secrets file override
    pub secrets_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Proxy for outbound HTTP (embedders and Qdrant)
    pub proxy_url: Option<String>,
}

/// Process-level sections of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsFile {
    logging: Option<LoggingConfig>,
    network: Option<NetworkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NetworkConfig {
    #[serde(rename = "proxyUrl")]
    proxy_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            secrets_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            proxy_url: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CODEINDEX_WORKSPACE`: Override workspace path
    /// - `CODEINDEX_CONFIG`: Path to settings file
    /// - `CODEINDEX_SECRETS`: Path to secrets file
    /// - `CODEINDEX_PROXY_URL`: Proxy for outbound HTTP
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("CODEINDEX_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("CODEINDEX_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if let Ok(secrets_file) = std::env::var("CODEINDEX_SECRETS") {
            config.secrets_file = Some(PathBuf::from(secrets_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let settings_path = config.settings_path();
        if settings_path.exists() {
            config = config.merge_yaml(&settings_path)?;
        }

        // Environment variables override the settings file
        if let Ok(proxy_url) = std::env::var("CODEINDEX_PROXY_URL") {
            config.proxy_url = Some(proxy_url);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge the process-level sections of a YAML settings file.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read settings file {:?}: {}", path, e))
        })?;

        let settings: SettingsFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse settings file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = settings.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(network) = settings.network {
            if network.proxy_url.is_some() {
                result.proxy_url = network.proxy_url;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and files.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        secrets_file: Option<PathBuf>,
        log_level: Option<String>,
        proxy_url: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(secrets_file) = secrets_file {
            self.secrets_file = Some(secrets_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if let Some(proxy_url) = proxy_url {
            self.proxy_url = Some(proxy_url);
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

    /// Get the path to the .codeindex directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Settings file holding `codebaseIndexConfig` and process sections.
    pub fn settings_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.state_dir().join(SETTINGS_FILE))
    }

    /// Secrets file holding API keys.
    pub fn secrets_path(&self) -> PathBuf {
        self.secrets_file
            .clone()
            .unwrap_or_else(|| self.state_dir().join(SECRETS_FILE))
    }

    /// Absolute workspace path, used for collection identity.
    pub fn workspace_root(&self) -> PathBuf {
        std::fs::canonicalize(&self.workspace).unwrap_or_else(|_| self.workspace.clone())
    }
}
