use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
pub const DEFAULT_CACHE_CAPACITY: usize = 10;
const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// A single finding from [`Config::validate`]
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors block loading; warnings are only logged.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field,
            message: message.into(),
        });
    }

    fn warn(&mut self, field: &'static str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field,
            message: message.into(),
        });
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ValidationIssue::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// How an SDK instance answers weather queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Serve one city per call, from cache while fresh
    #[default]
    OnDemand,
    /// Refresh every stale cached city and return the whole cache
    Polling,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnDemand => "on_demand",
            Self::Polling => "polling",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "on_demand" => Ok(Self::OnDemand),
            "polling" => Ok(Self::Polling),
            other => Err(ConfigError::Invalid(format!(
                "unknown mode '{}', expected 'on_demand' or 'polling'",
                other
            ))),
        }
    }
}

/// Units of measurement requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin, metres per second
    #[default]
    Standard,
    /// Celsius, metres per second
    Metric,
    /// Fahrenheit, miles per hour
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap API key (falls back to OPENWEATHER_API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider root URL, without the `/data/2.5` path
    pub base_url: String,

    /// Per-request timeout. Requests are never retried.
    pub request_timeout_secs: u64,

    /// Age after which a cached record is refreshed
    pub cache_ttl_secs: u64,

    /// Maximum number of distinct cities kept by on-demand queries
    pub cache_capacity: usize,

    /// Units sent to the provider; omitted from requests when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,

    /// Language for weather descriptions (e.g. "en", "de")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Mode used by the demo binary when none is given
    pub default_mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            units: None,
            lang: None,
            default_mode: Mode::OnDemand,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Return the API key or a `MissingSetting` error
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingSetting(format!("api_key (or {})", API_KEY_ENV)))
    }

    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_or_create(&Self::config_path()?)
    }

    /// Load `path`, first writing a default file there if none exists.
    ///
    /// The API key from the environment is applied after the file is read
    /// and is never written back.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::default().save_to(path)?;
        }

        Self::load_from(path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        if config.api_key.is_none() {
            config.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.base_url, "base_url", &mut result);

        if self.request_timeout_secs == 0 {
            result.error("request_timeout_secs", "Request timeout must be greater than 0");
        } else if self.request_timeout_secs > 300 {
            result.warn(
                "request_timeout_secs",
                "Request timeout is unusually long (>300 seconds)",
            );
        }

        if self.cache_ttl_secs == 0 {
            result.warn(
                "cache_ttl_secs",
                "Caching disabled (0 seconds), every query hits the provider",
            );
        }

        if self.cache_capacity == 0 {
            result.error("cache_capacity", "Cache capacity must be greater than 0");
        }

        if let Some(lang) = &self.lang {
            if lang.trim().is_empty() {
                result.error("lang", "Language code must not be empty");
            }
        }

        if self.require_api_key().is_err() {
            result.warn(
                "api_key",
                format!("No API key configured - set api_key or {}", API_KEY_ENV),
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &'static str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("weather-sdk");

        Ok(config_dir.join("config.toml"))
    }
}
