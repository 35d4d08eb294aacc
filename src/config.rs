//! Configuration management for `tempcast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TempcastError;
use crate::models::{Location, LocationCatalog};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TempcastConfig {
    /// Warehouse SQL API connection settings
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    /// Prediction function and history tables
    #[serde(default)]
    pub model: ModelConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Warehouse SQL API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Account URL, e.g. `https://myorg-myaccount.snowflakecomputing.com`
    #[serde(default)]
    pub account_url: String,
    /// Bearer token (key-pair JWT, OAuth or programmatic access token)
    pub token: Option<String>,
    /// Value of the `X-Snowflake-Authorization-Token-Type` header
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    /// Server-side statement timeout in seconds
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u32,
    /// Per HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// Maximum number of retries for transient transport failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay between status polls of a statement still running
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Status polls before giving up on a running statement
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

/// Prediction function and history table names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_udf_name")]
    pub udf_name: String,
    /// Year the model predicts; history is read for the year before
    #[serde(default = "default_prediction_year")]
    pub prediction_year: i32,
    #[serde(default = "default_timeseries_table")]
    pub timeseries_table: String,
    #[serde(default = "default_station_index_table")]
    pub station_index_table: String,
    /// Locations offered in the selector
    #[serde(default = "default_locations")]
    pub locations: Vec<Location>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// PEM certificate chain; TLS is used when both paths are set
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_token_type() -> String {
    "KEYPAIR_JWT".to_string()
}

fn default_statement_timeout() -> u32 {
    60
}

fn default_request_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_polls() -> u32 {
    120
}

fn default_udf_name() -> String {
    "predict_temperature_udf".to_string()
}

fn default_prediction_year() -> i32 {
    2025
}

fn default_timeseries_table() -> String {
    "WEATHER__ENVIRONMENT.CYBERSYN.NOAA_WEATHER_METRICS_TIMESERIES".to_string()
}

fn default_station_index_table() -> String {
    "WEATHER__ENVIRONMENT.CYBERSYN.NOAA_WEATHER_STATION_INDEX".to_string()
}

fn default_locations() -> Vec<Location> {
    vec![Location::flagstaff()]
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            account_url: String::new(),
            token: None,
            token_type: default_token_type(),
            database: None,
            schema: None,
            warehouse: None,
            role: None,
            statement_timeout_seconds: default_statement_timeout(),
            request_timeout_seconds: default_request_timeout(),
            max_retries: default_max_retries(),
            poll_interval_ms: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            udf_name: default_udf_name(),
            prediction_year: default_prediction_year(),
            timeseries_table: default_timeseries_table(),
            station_index_table: default_station_index_table(),
            locations: default_locations(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TempcastConfig {
    /// Load configuration from a TOML file (default location when `None`)
    /// overlaid with `TEMPCAST_*` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
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

        // TEMPCAST_WAREHOUSE__ACCOUNT_URL -> warehouse.account_url
        builder = builder.add_source(
            Environment::with_prefix("TEMPCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TempcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tempcast").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.warehouse.token_type.is_empty() {
            self.warehouse.token_type = default_token_type();
        }
        if self.warehouse.statement_timeout_seconds == 0 {
            self.warehouse.statement_timeout_seconds = default_statement_timeout();
        }
        if self.warehouse.request_timeout_seconds == 0 {
            self.warehouse.request_timeout_seconds = default_request_timeout();
        }
        if self.warehouse.poll_interval_ms == 0 {
            self.warehouse.poll_interval_ms = default_poll_interval();
        }
        if self.warehouse.max_polls == 0 {
            self.warehouse.max_polls = default_max_polls();
        }
        if self.model.udf_name.is_empty() {
            self.model.udf_name = default_udf_name();
        }
        if self.model.locations.is_empty() {
            self.model.locations = default_locations();
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.location_catalog()?;
        Ok(())
    }

    /// Validate that the warehouse can actually be reached with these settings
    pub fn validate_credentials(&self) -> Result<()> {
        if self.warehouse.account_url.is_empty() {
            return Err(TempcastError::config(
                "warehouse.account_url is required (or set TEMPCAST_WAREHOUSE__ACCOUNT_URL)",
            )
            .into());
        }

        match &self.warehouse.token {
            None => Err(TempcastError::config(
                "warehouse.token is required (or set TEMPCAST_WAREHOUSE__TOKEN)",
            )
            .into()),
            Some(token) if token.trim().is_empty() => {
                Err(TempcastError::config("warehouse.token cannot be empty").into())
            }
            Some(_) => Ok(()),
        }
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.warehouse.request_timeout_seconds > 300 {
            return Err(
                TempcastError::config("Warehouse request timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.warehouse.statement_timeout_seconds > 3600 {
            return Err(TempcastError::config(
                "Warehouse statement timeout cannot exceed 3600 seconds",
            )
            .into());
        }

        if self.warehouse.max_retries > 10 {
            return Err(TempcastError::config("Warehouse max retries cannot exceed 10").into());
        }

        if !(1900..=2200).contains(&self.model.prediction_year) {
            return Err(TempcastError::config(format!(
                "Prediction year {} is out of range",
                self.model.prediction_year
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TempcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TempcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let url = &self.warehouse.account_url;
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TempcastError::config(
                "Warehouse account URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(TempcastError::config(
                "server.tls_cert_path and server.tls_key_path must be set together",
            )
            .into());
        }

        Ok(())
    }

    /// Build the location catalog, validating every configured postal code
    pub fn location_catalog(&self) -> Result<LocationCatalog> {
        let locations = self
            .model
            .locations
            .iter()
            .map(|l| Location::new(l.postal_code.clone(), l.label.clone()))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(LocationCatalog::new(locations)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TempcastConfig::default();
        assert_eq!(config.model.udf_name, "predict_temperature_udf");
        assert_eq!(config.model.prediction_year, 2025);
        assert_eq!(config.warehouse.request_timeout_seconds, 30);
        assert_eq!(config.warehouse.token_type, "KEYPAIR_JWT");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert!(config.warehouse.token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_required() {
        let mut config = TempcastConfig::default();
        assert!(config.validate_credentials().is_err());

        config.warehouse.account_url = "https://org-acct.snowflakecomputing.com".to_string();
        assert!(config.validate_credentials().is_err());

        config.warehouse.token = Some("   ".to_string());
        assert!(config.validate_credentials().is_err());

        config.warehouse.token = Some("eyJhbGciOi".to_string());
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TempcastConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = TempcastConfig::default();
        config.warehouse.request_timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = TempcastConfig::default();
        config.warehouse.account_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_half_tls() {
        let mut config = TempcastConfig::default();
        config.server.tls_cert_path = Some(PathBuf::from("cert.pem"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_location_catalog_from_config() {
        let mut config = TempcastConfig::default();
        config.model.locations.push(Location {
            postal_code: "86001".to_string(),
            label: "Flagstaff North (86001)".to_string(),
        });
        let catalog = config.location_catalog().unwrap();
        assert_eq!(catalog.len(), 2);

        config.model.locations.push(Location {
            postal_code: "bad".to_string(),
            label: "Bad".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("tempcast-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[warehouse]
account_url = "https://org-acct.snowflakecomputing.com"
token = "secret-token"
warehouse = "COMPUTE_WH"

[model]
prediction_year = 2026

[[model.locations]]
postal_code = "86005"
label = "Flagstaff (86005)"

[[model.locations]]
postal_code = "85001"
label = "Phoenix (85001)"

[server]
port = 9090
"#,
        )
        .unwrap();

        let config = TempcastConfig::load_from_path(Some(path)).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(config.warehouse.warehouse.as_deref(), Some("COMPUTE_WH"));
        assert_eq!(config.model.prediction_year, 2026);
        assert_eq!(config.model.locations.len(), 2);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.format, "pretty");
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = TempcastConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("tempcast"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
