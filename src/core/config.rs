use super::theme::Theme;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const APP_ID_ENV: &str = "OPENEXCHANGERATES_APP_ID";
pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org";

fn default_currencies() -> Vec<String> {
    ["USD", "EUR", "LKR", "JPY", "GBP", "KRW"]
        .iter()
        .map(|code| code.to_string())
        .collect()
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_target_currency() -> String {
    "EUR".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenExchangeRatesConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub app_id: Option<String>,
}

impl Default for OpenExchangeRatesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_id: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub openexchangerates: Option<OpenExchangeRatesConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_target_currency")]
    pub target_currency: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    pub flags_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            currencies: default_currencies(),
            base_currency: default_base_currency(),
            target_currency: default_target_currency(),
            theme: Theme::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            debounce_ms: default_debounce_ms(),
            flags_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "currenz", "currenz")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        self.providers
            .openexchangerates
            .as_ref()
            .map_or(DEFAULT_BASE_URL, |p| &p.base_url)
    }

    /// API key from the environment, falling back to the config file.
    pub fn app_id(&self) -> Result<String> {
        self.app_id_with_override(std::env::var(APP_ID_ENV).ok())
    }

    pub fn app_id_with_override(&self, env_value: Option<String>) -> Result<String> {
        let configured = self
            .providers
            .openexchangerates
            .as_ref()
            .and_then(|p| p.app_id.clone());

        match env_value.or(configured) {
            Some(app_id) if !app_id.trim().is_empty() => Ok(app_id.trim().to_string()),
            _ => bail!(
                "No exchange rate API key configured. Set {} or providers.openexchangerates.app_id",
                APP_ID_ENV
            ),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
