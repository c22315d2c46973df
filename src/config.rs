//! Configuration management for `WeatherDesk`
//!
//! Handles loading configuration from files and environment variables
//! and validates all settings. The weather API key is never compiled in;
//! it comes from the config file or `WEATHERDESK_WEATHER__API_KEY`.

use crate::WeatherDeskError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherDeskConfig {
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Resolution flow timings
    pub resolver: ResolverConfig,
    /// Positioning provider
    pub geolocation: GeolocationConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// WeatherAPI.com key
    pub api_key: Option<String>,
    /// Base URL for the weather API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

/// Timings of the location-resolution flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Delay before retrying with a suggested location
    pub suggestion_retry_delay_ms: u64,
    /// Application-level bound on a pending positioning request
    pub soft_timeout_ms: u64,
    /// Timeout handed to the positioning provider itself
    pub position_timeout_ms: u64,
    /// Ask the positioning provider for its most accurate fix
    pub high_accuracy: bool,
}

/// Positioning provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// `ip`, `static` or `none`
    pub provider: String,
    /// Endpoint used by the `ip` provider
    pub ip_lookup_url: String,
    /// Latitude reported by the `static` provider
    pub latitude: Option<f64>,
    /// Longitude reported by the `static` provider
    pub longitude: Option<f64>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.weatherapi.com/v1".to_string(),
            timeout_seconds: 10,
            max_retries: 2,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            suggestion_retry_delay_ms: 1500,
            soft_timeout_ms: 10_000,
            position_timeout_ms: 8_000,
            high_accuracy: true,
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            provider: "ip".to_string(),
            ip_lookup_url: "http://ip-api.com/json/?fields=status,message,lat,lon".to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn suggestion_retry_delay(&self) -> Duration {
        Duration::from_millis(self.suggestion_retry_delay_ms)
    }

    #[must_use]
    pub fn soft_timeout(&self) -> Duration {
        Duration::from_millis(self.soft_timeout_ms)
    }

    #[must_use]
    pub fn position_timeout(&self) -> Duration {
        Duration::from_millis(self.position_timeout_ms)
    }
}

impl WeatherDeskConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHERDESK_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("WEATHERDESK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherDeskConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherdesk").join("config.toml"))
    }

    /// Fill empty or zeroed fields left by a partial config file
    pub fn apply_defaults(&mut self) {
        let defaults = Self::default();
        if self.weather.base_url.is_empty() {
            self.weather.base_url = defaults.weather.base_url;
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = defaults.weather.timeout_seconds;
        }
        if self.geolocation.provider.is_empty() {
            self.geolocation.provider = defaults.geolocation.provider;
        }
        if self.geolocation.ip_lookup_url.is_empty() {
            self.geolocation.ip_lookup_url = defaults.geolocation.ip_lookup_url;
        }
        if self.logging.level.is_empty() {
            self.logging.level = defaults.logging.level;
        }
        if self.logging.format.is_empty() {
            self.logging.format = defaults.logging.format;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_geolocation()?;
        Ok(())
    }

    /// The API key, or a configuration error explaining where to put it
    pub fn require_api_key(&self) -> std::result::Result<&str, WeatherDeskError> {
        self.weather.api_key.as_deref().ok_or_else(|| {
            WeatherDeskError::config(
                "Weather API key is required. Set weather.api_key in the config file or WEATHERDESK_WEATHER__API_KEY.",
            )
        })
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(WeatherDeskError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(WeatherDeskError::config(
                    "Weather API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }

            if api_key.len() > 100 {
                return Err(WeatherDeskError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                WeatherDeskError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.weather.max_retries > 10 {
            return Err(WeatherDeskError::config("Weather API max retries cannot exceed 10").into());
        }

        if self.resolver.soft_timeout_ms > 300_000 || self.resolver.position_timeout_ms > 300_000 {
            return Err(
                WeatherDeskError::config("Geolocation timeouts cannot exceed 300 seconds").into(),
            );
        }

        if self.resolver.soft_timeout_ms <= self.resolver.position_timeout_ms {
            return Err(WeatherDeskError::config(format!(
                "Soft timeout ({} ms) must be longer than the positioning timeout ({} ms)",
                self.resolver.soft_timeout_ms, self.resolver.position_timeout_ms
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherDeskError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherDeskError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather API base URL", &self.weather.base_url),
            ("IP lookup URL", &self.geolocation.ip_lookup_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherDeskError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_geolocation(&self) -> Result<()> {
        match self.geolocation.provider.as_str() {
            "ip" | "none" => Ok(()),
            "static" => match (self.geolocation.latitude, self.geolocation.longitude) {
                (Some(lat), Some(lon))
                    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
                {
                    Ok(())
                }
                (Some(_), Some(_)) => Err(WeatherDeskError::config(
                    "Static geolocation coordinates are out of range",
                )
                .into()),
                _ => Err(WeatherDeskError::config(
                    "Static geolocation requires both geolocation.latitude and geolocation.longitude",
                )
                .into()),
            },
            other => Err(WeatherDeskError::config(format!(
                "Invalid geolocation provider '{other}'. Must be one of: ip, static, none"
            ))
            .into()),
        }
    }
}
