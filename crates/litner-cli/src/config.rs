//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for litner
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub eutils: EutilsConfig,
    pub fetch: FetchConfig,
    pub annotate: AnnotateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EutilsConfig {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub tool: String,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        let client = litner_pubmed::EutilsConfig::default();
        Self {
            base_url: client.base_url,
            api_key: std::env::var("NCBI_API_KEY").ok(),
            email: client.email,
            tool: client.tool,
            request_delay_ms: litner_pubmed::Config::default().request_delay.as_millis() as u64,
            timeout_secs: client.timeout_secs,
        }
    }
}

impl EutilsConfig {
    /// Client settings for [`litner_pubmed::EutilsClient`]
    pub fn client_config(&self) -> litner_pubmed::EutilsConfig {
        litner_pubmed::EutilsConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            email: self.email.clone(),
            tool: self.tool.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub page_size: usize,
    pub prefix: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let defaults = litner_pubmed::Config::default();
        Self {
            page_size: defaults.page_size,
            prefix: defaults.prefix,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AnnotateConfig {
    pub lexicon: Option<PathBuf>,
    pub chunk_size: Option<usize>,
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./litner.toml (current directory)
    /// 2. ~/.config/litner/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("litner.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "litner") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
