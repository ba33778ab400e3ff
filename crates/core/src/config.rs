use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub batch: BatchSettings,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub base_url: String,
    pub session_token: SecretString,
}

/// Thresholds and intervals for the batched profile/status fetcher.
#[derive(Clone, Debug)]
pub struct BatchSettings {
    pub max_batch: usize,
    pub profiles_flush_interval: Duration,
    pub statuses_flush_interval: Duration,
    pub enable_status_batching: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub session_token: Option<String>,
    pub max_batch: Option<usize>,
    pub enable_status_batching: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://localhost:8065".to_owned(),
                session_token: SecretString::from(String::new()),
            },
            batch: BatchSettings::default(),
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_batch: 100,
            profiles_flush_interval: Duration::from_secs(10),
            statuses_flush_interval: Duration::from_secs(20),
            enable_status_batching: true,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    batch: Option<BatchPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    base_url: Option<String>,
    session_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchPatch {
    max_batch: Option<usize>,
    profiles_flush_secs: Option<u64>,
    statuses_flush_secs: Option<u64>,
    enable_status_batching: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl ClientConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("huddle.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(base_url) = server.base_url {
                self.server.base_url = base_url;
            }
            if let Some(session_token_value) = server.session_token {
                self.server.session_token = SecretString::from(session_token_value);
            }
        }

        if let Some(batch) = patch.batch {
            if let Some(max_batch) = batch.max_batch {
                self.batch.max_batch = max_batch;
            }
            if let Some(secs) = batch.profiles_flush_secs {
                self.batch.profiles_flush_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = batch.statuses_flush_secs {
                self.batch.statuses_flush_interval = Duration::from_secs(secs);
            }
            if let Some(enabled) = batch.enable_status_batching {
                self.batch.enable_status_batching = enabled;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HUDDLE_BASE_URL") {
            self.server.base_url = value;
        }
        if let Some(value) = read_env("HUDDLE_SESSION_TOKEN") {
            self.server.session_token = SecretString::from(value);
        }
        if let Some(value) = read_env("HUDDLE_MAX_BATCH") {
            self.batch.max_batch = parse_usize("HUDDLE_MAX_BATCH", &value)?;
        }
        if let Some(value) = read_env("HUDDLE_PROFILES_FLUSH_SECS") {
            self.batch.profiles_flush_interval =
                Duration::from_secs(parse_u64("HUDDLE_PROFILES_FLUSH_SECS", &value)?);
        }
        if let Some(value) = read_env("HUDDLE_STATUSES_FLUSH_SECS") {
            self.batch.statuses_flush_interval =
                Duration::from_secs(parse_u64("HUDDLE_STATUSES_FLUSH_SECS", &value)?);
        }
        if let Some(value) = read_env("HUDDLE_ENABLE_STATUS_BATCHING") {
            self.batch.enable_status_batching =
                parse_bool("HUDDLE_ENABLE_STATUS_BATCHING", &value)?;
        }
        if let Some(value) = read_env("HUDDLE_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("HUDDLE_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.server.base_url = base_url;
        }
        if let Some(session_token_value) = overrides.session_token {
            self.server.session_token = SecretString::from(session_token_value);
        }
        if let Some(max_batch) = overrides.max_batch {
            self.batch.max_batch = max_batch;
        }
        if let Some(enabled) = overrides.enable_status_batching {
            self.batch.enable_status_batching = enabled;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        let trimmed = self.server.base_url.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::Validation("server.base_url must not be empty".to_owned()));
        }
        self.server.base_url = trimmed.to_owned();

        if self.batch.max_batch == 0 {
            return Err(ConfigError::Validation("batch.max_batch must be at least 1".to_owned()));
        }
        if self.batch.profiles_flush_interval.is_zero() {
            return Err(ConfigError::Validation(
                "batch.profiles_flush_secs must be non-zero".to_owned(),
            ));
        }
        if self.batch.statuses_flush_interval.is_zero() {
            return Err(ConfigError::Validation(
                "batch.statuses_flush_secs must be non-zero".to_owned(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let default = PathBuf::from("huddle.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
    }
}
