//! Configuration file management for eduplan.
//!
//! Provides a TOML-based config file at `~/.config/eduplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use eduplan_core::config::DEFAULT_BASE_URL;
use eduplan_core::{ApiKey, GenerationConfig, ModelCandidates};

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODELS: &str = "EDUPLAN_MODELS";
pub const ENV_BASE_URL: &str = "EDUPLAN_GEMINI_BASE_URL";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Fallback order, first entry tried first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-attempt timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the eduplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/eduplan` or `~/.config/eduplan`,
/// on macOS too.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("eduplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("eduplan")
}

/// Return the path to the eduplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the file holds the API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Flags that take part in resolution.
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub api_key: Option<&'a str>,
    pub models: Option<&'a str>,
    pub bind: Option<&'a str>,
    pub port: Option<u16>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct EduplanConfig {
    pub generation: GenerationConfig,
    pub bind: String,
    pub port: u16,
}

impl EduplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// A missing API key is not an error here; generation reports it later.
    pub fn resolve(cli: &CliOverrides<'_>) -> Result<Self> {
        let file = load_config().ok();
        Self::resolve_with(cli, file.unwrap_or_default())
    }

    pub fn resolve_with(cli: &CliOverrides<'_>, file: ConfigFile) -> Result<Self> {
        let gemini = file.gemini;

        // API key: blank values at any level fall through to the next.
        let api_key = cli
            .api_key
            .and_then(ApiKey::new)
            .or_else(|| env_var(ENV_API_KEY).and_then(ApiKey::new))
            .or_else(|| gemini.api_key.as_deref().and_then(ApiKey::new));

        let models = if let Some(list) = cli.models {
            ModelCandidates::parse_list(list).context("invalid --models list")?
        } else if let Some(list) = env_var(ENV_MODELS) {
            ModelCandidates::parse_list(&list)
                .with_context(|| format!("invalid {ENV_MODELS} value"))?
        } else if let Some(list) = gemini.models {
            ModelCandidates::new(list).context("invalid [gemini].models in config file")?
        } else {
            ModelCandidates::default()
        };

        let base_url = env_var(ENV_BASE_URL)
            .or(gemini.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut generation = GenerationConfig::new(api_key)
            .with_models(models)
            .with_base_url(base_url);
        if let Some(secs) = gemini.timeout_secs {
            generation = generation.with_attempt_timeout(Duration::from_secs(secs));
        }

        let bind = cli
            .bind
            .map(str::to_string)
            .or(file.server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let port = cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT);

        Ok(Self {
            generation,
            bind,
            port,
        })
    }
}

/// Non-blank environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
