use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "PARCEL_CONFIG";

const ACCESS_KEY_ENV: &str = "PARCEL_WEATHER_ACCESS_KEY";
const BASE_URL_ENV: &str = "PARCEL_WEATHER_BASE_URL";
const DATABASE_PATH_ENV: &str = "PARCEL_DATABASE_PATH";
const PORT_ENV: &str = "PARCEL_PORT";

const VALID_UNITS: [&str; 3] = ["m", "f", "s"];
const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parcel")
        .join("properties.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Weather provider settings.
///
/// Defaults: 3 attempts, 15000ms per-attempt timeout, 1000ms backoff unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Provider credential; usually supplied via `PARCEL_WEATHER_ACCESS_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Provider unit system: `m` (metric), `f` (fahrenheit) or `s` (scientific)
    #[serde(default = "default_weather_units")]
    pub units: String,

    #[serde(default = "default_weather_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_weather_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_weather_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
}

fn default_weather_base_url() -> String {
    "http://api.weatherstack.com".to_string()
}

fn default_weather_units() -> String {
    "f".to_string()
}

fn default_weather_timeout_ms() -> u64 {
    15_000
}

fn default_weather_max_attempts() -> u32 {
    3
}

fn default_weather_backoff_unit_ms() -> u64 {
    1_000
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            access_key: None,
            units: default_weather_units(),
            timeout_ms: default_weather_timeout_ms(),
            max_attempts: default_weather_max_attempts(),
            backoff_unit_ms: default_weather_backoff_unit_ms(),
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    /// Upper bound on a single lookup: every attempt times out and every
    /// backoff between attempts is taken.
    pub fn worst_case_latency(&self) -> Duration {
        let attempts = u64::from(self.max_attempts.max(1));
        let backoff_total: u64 = (1..attempts).map(|n| self.backoff_unit_ms * n).sum();
        Duration::from_millis(self.timeout_ms * attempts + backoff_total)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            weather: WeatherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `PARCEL_CONFIG` or the default location,
    /// creating a default file if none exists, then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let config_path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => Self::config_path()?,
        };

        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file, creating it with defaults
    /// if it doesn't exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ACCESS_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.weather.access_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.weather.base_url = url;
        }
        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(port) = lookup(PORT_ENV) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", PORT_ENV, port),
            }
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        match &self.weather.access_key {
            None => result.add_warning(
                "weather.access_key",
                format!(
                    "No weather access key configured (set {}); property creation will be rejected",
                    ACCESS_KEY_ENV
                ),
            ),
            Some(key) if key.trim().is_empty() => {
                result.add_error("weather.access_key", "Access key cannot be empty if provided")
            }
            Some(_) => {}
        }

        if !VALID_UNITS.contains(&self.weather.units.as_str()) {
            result.add_error(
                "weather.units",
                format!(
                    "Invalid units '{}'. Must be one of: {}",
                    self.weather.units,
                    VALID_UNITS.join(", ")
                ),
            );
        }

        if self.weather.timeout_ms == 0 {
            result.add_error("weather.timeout_ms", "Timeout must be greater than 0");
        } else if self.weather.timeout_ms > 60_000 {
            result.add_warning("weather.timeout_ms", "Timeout is unusually long (>60s)");
        }

        if self.weather.max_attempts == 0 || self.weather.max_attempts > 10 {
            result.add_error("weather.max_attempts", "Max attempts must be between 1 and 10");
        }

        if self.weather.backoff_unit_ms == 0 {
            result.add_warning(
                "weather.backoff_unit_ms",
                "Backoff disabled (0ms); retries will fire immediately",
            );
        }

        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            result.add_error(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the default configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("parcel");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::collections::HashMap;

    fn configured() -> Config {
        let mut config = Config::default();
        config.weather.access_key = Some("test-access-key".to_string());
        config
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.weather.max_attempts, 3);
        assert_eq!(config.weather.timeout_ms, 15_000);
        assert_eq!(config.weather.backoff_unit_ms, 1_000);
        assert_eq!(config.weather.units, "f");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_valid_default_config() {
        let result = configured().validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_access_key_is_warning() {
        let result = Config::default().validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.access_key"));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = configured();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = configured();
        config.weather.base_url = "ftp://weather.example.com".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_and_attempts() {
        let mut config = configured();
        config.weather.timeout_ms = 0;
        config.weather.max_attempts = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "weather.timeout_ms"));
        assert!(result.errors.iter().any(|e| e.field == "weather.max_attempts"));
    }

    #[test]
    fn test_invalid_units_and_log_level() {
        let mut config = configured();
        config.weather.units = "k".to_string();
        config.logging.level = "loud".to_string();
        let result = config.validate();
        assert_eq!(result.errors.len(), 2);
        let summary = result.error_summary();
        assert!(summary.contains("weather.units"));
        assert!(summary.contains("logging.level"));
    }

    #[test]
    fn test_worst_case_latency() {
        let config = WeatherConfig::default();
        // 3 x 15s plus 1s + 2s of backoff
        assert_eq!(config.worst_case_latency(), Duration::from_millis(48_000));
    }

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PARCEL_WEATHER_ACCESS_KEY", "env-key"),
            ("PARCEL_DATABASE_PATH", "/tmp/parcel-test.db"),
            ("PARCEL_PORT", "9090"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.weather.access_key.as_deref(), Some("env-key"));
        assert_eq!(config.database.path, PathBuf::from("/tmp/parcel-test.db"));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.weather.base_url, "http://api.weatherstack.com");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "PARCEL_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.weather.max_attempts, 3);
    }

    #[test]
    fn test_load_from_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[weather]\naccess_key = \"file-key\"\nmax_attempts = 5\n\n[server]\nport = 3000\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.weather.access_key.as_deref(), Some("file-key"));
        assert_eq!(config.weather.max_attempts, 5);
        assert_eq!(config.weather.timeout_ms, 15_000);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather\nmax_attempts = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
