//! Configuration System
//!
//! Layered configuration for the generation pipeline: a TOML file (workspace
//! `toolsmith.toml` or the XDG config directory) merged with `TOOLSMITH_*`
//! environment overrides, plus numbered environment fallback slots for
//! provider credentials so a bare shell environment can still configure
//! failover.

use crate::error::ToolError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Volcano Ark endpoint for `ark` providers without an explicit URL.
pub const DEFAULT_ARK_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Directory where generated artifacts are persisted
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Generation toggle and transport timeouts
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Provider descriptors, ordered by failover priority
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            generation: GenerationConfig::default(),
            providers: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Master switch for AI generation
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds; generation of a full page can take a while
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

/// Backend vendor kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Volcano Ark (Doubao), OpenAI-compatible chat completions
    Ark,
    /// Any OpenAI-compatible endpoint
    OpenaiCompat,
}

/// One provider descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name, used in logs and failure reports
    pub name: String,

    /// Backend vendor
    pub kind: ProviderKind,

    /// API credential
    pub api_key: String,

    /// Model or endpoint identifier passed to the backend
    pub model: String,

    /// Endpoint base URL; `None` uses the vendor default
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Provider name cannot be empty".to_string());
        }
        if self.api_key.trim().is_empty() {
            return Err("API key cannot be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if self.kind == ProviderKind::OpenaiCompat && self.base_url.is_none() {
            return Err("openai_compat providers require a base_url".to_string());
        }
        Ok(())
    }

    /// Effective endpoint base URL.
    pub fn effective_base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url,
            None => DEFAULT_ARK_BASE_URL,
        }
    }
}

impl ToolConfig {
    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for provider in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(format!("Provider '{}': {}", provider.name, e));
            }
        }

        let mut names: Vec<&str> = self.providers.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.providers.len() {
            errors.push("Provider names must be unique".to_string());
        }

        if self.output_dir.as_os_str().is_empty() {
            errors.push("Output directory cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Whether generation can be attempted at all: enabled and at least one
    /// provider configured.
    pub fn generation_available(&self) -> bool {
        self.generation.enabled && !self.providers.is_empty()
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the standard layering: defaults, config file
    /// (explicit path, workspace `toolsmith.toml`, or XDG config dir), then
    /// `TOOLSMITH_*` environment overrides and numbered provider slots.
    pub fn load(explicit_path: Option<&Path>) -> Result<ToolConfig, ToolError> {
        let mut builder = Config::builder();

        match explicit_path {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()));
            }
            None => {
                if let Some(xdg_path) = Self::xdg_config_path() {
                    builder = builder.add_source(File::from(xdg_path).required(false));
                }
                builder =
                    builder.add_source(File::from(PathBuf::from("toolsmith.toml")).required(false));
            }
        }

        let mut config: ToolConfig = builder
            .add_source(
                Environment::with_prefix("TOOLSMITH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Self::append_env_providers(&mut config);

        config
            .validate()
            .map_err(|errors| ToolError::ConfigError(errors.join("; ")))?;
        Ok(config)
    }

    /// Default XDG config file path (`~/.config/toolsmith/toolsmith.toml`).
    pub fn xdg_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "toolsmith")
            .map(|dirs| dirs.config_dir().join("toolsmith.toml"))
    }

    /// Append providers from numbered environment slots
    /// (`TOOLSMITH_ARK_API_KEY`, `_2`, `_3`) after the file-configured list.
    /// A blank slot is skipped; slot order defines failover priority among
    /// the environment providers.
    fn append_env_providers(config: &mut ToolConfig) {
        for (suffix, name) in [("", "ark-primary"), ("_2", "ark-backup-2"), ("_3", "ark-backup-3")]
        {
            let api_key = match std::env::var(format!("TOOLSMITH_ARK_API_KEY{}", suffix)) {
                Ok(v) if !v.trim().is_empty() => v,
                _ => continue,
            };
            if config.providers.iter().any(|p| p.name == name) {
                continue;
            }
            let model = std::env::var(format!("TOOLSMITH_ARK_ENDPOINT_ID{}", suffix))
                .unwrap_or_else(|_| "doubao-pro-32k".to_string());
            let base_url = std::env::var(format!("TOOLSMITH_ARK_BASE_URL{}", suffix))
                .ok()
                .filter(|v| !v.trim().is_empty());
            config.providers.push(ProviderConfig {
                name: name.to_string(),
                kind: ProviderKind::Ark,
                api_key,
                model,
                base_url,
            });
        }
    }

    /// Write a commented example configuration file. Refuses to overwrite an
    /// existing file.
    pub fn write_example(path: &Path) -> Result<(), ToolError> {
        if path.exists() {
            return Err(ToolError::ConfigError(format!(
                "Refusing to overwrite existing file: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, EXAMPLE_CONFIG)?;
        Ok(())
    }
}

const EXAMPLE_CONFIG: &str = r#"# toolsmith configuration
#
# Copy this file to toolsmith.toml (workspace) or
# ~/.config/toolsmith/toolsmith.toml and fill in your provider credentials.
# Configure more than one provider to get failover.

# Directory where generated artifacts are written
output_dir = "output"

[generation]
# Master switch for AI generation; with it off, only cached artifacts and
# canned templates are served
enabled = true
connect_timeout_secs = 30
read_timeout_secs = 120

# Providers are tried in the order listed here
[[providers]]
name = "ark-primary"
kind = "ark"
api_key = "your_api_key_here"
model = "your_endpoint_id_here"
# base_url defaults to https://ark.cn-beijing.volces.com/api/v3

#[[providers]]
#name = "local-fallback"
#kind = "openai_compat"
#api_key = "unused"
#model = "llama3"
#base_url = "http://localhost:11434/v1"

[logging]
level = "info"
format = "text"
output = "stderr"
"#;
