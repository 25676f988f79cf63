use crate::error::{AppError, Result};
use crate::models::SearchParameters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Environment variable naming an optional override file
pub const CONFIG_PATH_ENV: &str = "TESSERAE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/tesserae.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// REST API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Status polling behaviour
    #[serde(default)]
    pub polling: PollingConfig,

    /// Default search settings
    #[serde(default)]
    pub search: SearchDefaults,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, the file named by
    /// `TESSERAE_CONFIG` (if present) and `TESSERAE__*` environment variables
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Some(Path::new(&config_path)))
    }

    /// Load configuration with an explicit override file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config: Config = builder
            // Override with environment variables (prefix: TESSERAE_)
            .add_source(
                config::Environment::with_prefix("TESSERAE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::Configuration("api.base_url must be set".to_string()));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(AppError::Configuration(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::Configuration(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.polling.backoff_factor < 1.0 {
            return Err(AppError::Configuration(
                "polling.backoff_factor must be at least 1.0".to_string(),
            ));
        }
        if self.polling.max_interval_ms < self.polling.interval_ms {
            return Err(AppError::Configuration(
                "polling.max_interval_ms must not be below polling.interval_ms".to_string(),
            ));
        }
        if self.search.language.trim().is_empty() {
            return Err(AppError::Configuration(
                "search.language must be set".to_string(),
            ));
        }
        self.search.parameters.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://tesserae.caset.buffalo.edu/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay before the second status check (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Multiplier applied to the delay after every check
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Ceiling for the delay (milliseconds)
    #[serde(default = "default_max_poll_interval")]
    pub max_interval_ms: u64,

    /// Maximum number of status checks; 0 polls until a terminal status
    #[serde(default)]
    pub max_polls: u32,

    /// Retries allowed for a status check that failed without a response
    #[serde(default)]
    pub transient_retries: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            backoff_factor: default_backoff_factor(),
            max_interval_ms: default_max_poll_interval(),
            max_polls: 0,
            transient_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    /// Language whose corpus backs `corpus` stoplists
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub parameters: SearchParameters,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            language: default_language(),
            parameters: SearchParameters::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("tesserae-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_poll_interval() -> u64 {
    250
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_max_poll_interval() -> u64 {
    5_000
}

fn default_language() -> String {
    "latin".to_string()
}

fn default_log_level() -> String {
    "tesserae_client=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitType;
    use parking_lot::Mutex;
    use std::io::Write;

    /// Serializes tests that read or write `TESSERAE__*` variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets environment variables for one test and removes them on drop
    struct EnvVars(Vec<&'static str>);

    impl EnvVars {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self(vars.iter().map(|(key, _)| *key).collect())
        }
    }

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for key in &self.0 {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_embedded_defaults_load() {
        let _lock = ENV_LOCK.lock();
        let config = Config::load_from(None).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.search.language, "latin");
        assert_eq!(config.search.parameters.feature, "lemmata");
        assert_eq!(config.search.parameters.unit_type, UnitType::Line);
        assert_eq!(config.polling.max_polls, 0);
    }

    #[test]
    fn test_override_file() {
        let _lock = ENV_LOCK.lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://tesserae.example.org/api"

[search]
language = "greek"

[search.parameters]
feature = "form"
stoplist_size = 25
stoplist_basis = "texts"
frequency_basis = "texts"
max_distance = "5"
distance_basis = "span"
score_basis = "form"
unit_type = "phrase"
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "https://tesserae.example.org/api");
        assert_eq!(config.search.language, "greek");
        assert_eq!(config.search.parameters.max_distance, 5);
        assert_eq!(config.search.parameters.unit_type, UnitType::Phrase);
    }

    #[test]
    fn test_missing_override_file_is_ignored() {
        let _lock = ENV_LOCK.lock();
        let config = Config::load_from(Some(Path::new("does/not/exist.toml")));
        assert!(config.is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.api.base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.polling.backoff_factor = 0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search.parameters.max_distance = 0;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_environment_overrides_file_and_defaults() {
        let _lock = ENV_LOCK.lock();

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[polling]
max_polls = 5

[search]
language = "greek"
"#
        )
        .unwrap();

        let _vars = EnvVars::set(&[
            ("TESSERAE__POLLING__MAX_POLLS", "7"),
            ("TESSERAE__SEARCH__LANGUAGE", "english"),
            ("TESSERAE__SEARCH__PARAMETERS__MAX_DISTANCE", "4"),
            ("TESSERAE__API__TIMEOUT_SECS", "12"),
        ]);

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.polling.max_polls, 7);
        assert_eq!(config.search.language, "english");
        assert_eq!(config.search.parameters.max_distance, 4);
        assert_eq!(config.api.timeout_secs, 12);
        // Untouched keys keep their defaults
        assert_eq!(config.search.parameters.feature, "lemmata");
        assert_eq!(config.polling.interval_ms, 250);
    }
}
