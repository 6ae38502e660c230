//! Configuration layer: typed settings with layered precedence
//! (`clickfill.toml` → explicit file → environment).

use std::{num::NonZeroUsize, path::Path, path::PathBuf, str::FromStr};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const LOCAL_CONFIG_BASENAME: &str = "clickfill";
const ENV_PREFIX: &str = "CLICKFILL";
const DEFAULT_EXERCISES_DIR: &str = "exercises";
const DEFAULT_LOG_DIRECTORY: &str = "logs";
const DEFAULT_SERVER_ADDRESS: &str = "http://localhost:3000/";
const DEFAULT_CONTENT_TYPE_NAMESPACE: &str = "clickdragfillin";
const DEFAULT_FEEDBACK_ID_PREFIX: &str = "acos-feedback-";
const DEFAULT_FEEDBACK_ID_LENGTH: usize = 15;

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub content: ContentSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    /// Directory inside each content package that holds exercise files.
    pub exercises_dir: String,
    /// Root of the per-exercise submission logs.
    pub log_directory: PathBuf,
    /// Base address used for absolute URLs and as the feedback iframe origin.
    pub server_address: String,
    pub content_type_namespace: String,
    pub feedback_id_prefix: String,
    pub feedback_id_length: NonZeroUsize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: LevelFilter::INFO,
                format: LogFormat::Compact,
            },
            content: ContentSettings::default(),
        }
    }
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            exercises_dir: DEFAULT_EXERCISES_DIR.to_string(),
            log_directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            content_type_namespace: DEFAULT_CONTENT_TYPE_NAMESPACE.to_string(),
            feedback_id_prefix: DEFAULT_FEEDBACK_ID_PREFIX.to_string(),
            feedback_id_length: NonZeroUsize::new(DEFAULT_FEEDBACK_ID_LENGTH)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment).
///
/// Environment keys use a `CLICKFILL__` prefix and `__` between sections,
/// e.g. `CLICKFILL__CONTENT__SERVER_ADDRESS`.
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    content: RawContentSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    exercises_dir: Option<String>,
    log_directory: Option<PathBuf>,
    server_address: Option<String>,
    content_type_namespace: Option<String>,
    feedback_id_prefix: Option<String>,
    feedback_id_length: Option<usize>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, content } = raw;

        let logging = build_logging_settings(logging)?;
        let content = build_content_settings(content)?;

        Ok(Self { logging, content })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let exercises_dir = non_empty(
        content.exercises_dir,
        DEFAULT_EXERCISES_DIR,
        "content.exercises_dir",
    )?;
    let server_address = non_empty(
        content.server_address,
        DEFAULT_SERVER_ADDRESS,
        "content.server_address",
    )?;
    let content_type_namespace = non_empty(
        content.content_type_namespace,
        DEFAULT_CONTENT_TYPE_NAMESPACE,
        "content.content_type_namespace",
    )?;

    let log_directory = content
        .log_directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIRECTORY));

    let feedback_id_prefix = content
        .feedback_id_prefix
        .unwrap_or_else(|| DEFAULT_FEEDBACK_ID_PREFIX.to_string());

    let feedback_id_length = NonZeroUsize::new(
        content
            .feedback_id_length
            .unwrap_or(DEFAULT_FEEDBACK_ID_LENGTH),
    )
    .ok_or_else(|| LoadError::invalid("content.feedback_id_length", "must be greater than zero"))?;

    Ok(ContentSettings {
        exercises_dir,
        log_directory,
        server_address,
        content_type_namespace,
        feedback_id_prefix,
        feedback_id_length,
    })
}

fn non_empty(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
