//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events (targets `canfar::storage` and
//! `canfar::vospace`). Binaries and tests call [`init_subscriber`] or
//! [`init_from_env`] once to route them somewhere.
//!
//! ```rust,ignore
//! use canfar_storage::observability::{init_subscriber, SubscriberConfig, OutputFormat};
//!
//! let _guard = init_subscriber(SubscriberConfig {
//!     log_level: tracing::Level::DEBUG,
//!     output_format: OutputFormat::Json,
//!     log_file: None,
//! })?;
//! ```

use crate::error::StorageError;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "CANFAR_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "CANFAR_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "CANFAR_LOG_FILE";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            other => Err(StorageError::ConfigurationError(format!(
                "Invalid log format: {other}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::WARN,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

fn parse_level(level: &str) -> Result<tracing::Level, StorageError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        other => Err(StorageError::ConfigurationError(format!(
            "Invalid log level: {other}. Valid options: trace, debug, info, warn, error"
        ))),
    }
}

impl SubscriberConfig {
    /// Read `CANFAR_LOG_LEVEL`, `CANFAR_LOG_FORMAT` and `CANFAR_LOG_FILE`.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            config.log_level = parse_level(&level)?;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.output_format = format.parse()?;
        }
        config.log_file = lookup(LOG_FILE_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Ok(config)
    }

    /// `EnvFilter` directive covering this crate's targets.
    pub fn filter_directive(&self) -> String {
        let level = self.log_level.as_str().to_lowercase();
        format!("canfar={level},canfar_storage={level}")
    }
}

fn make_writer(config: &SubscriberConfig) -> Result<(BoxMakeWriter, Option<WorkerGuard>), StorageError> {
    let Some(path) = &config.log_file else {
        return Ok((BoxMakeWriter::new(std::io::stderr), None));
    };
    let file_name = path.file_name().ok_or_else(|| {
        StorageError::ConfigurationError(format!("Invalid log file path: {}", path.display()))
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(writer), Some(guard)))
}

/// Install the global subscriber.
///
/// The returned guard must be held while logging to a file. An already
/// installed subscriber is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, StorageError> {
    let filter = config.filter_directive();
    let (writer, guard) = make_writer(&config)?;
    let ansi = config.log_file.is_none();

    let init_result = match config.output_format {
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .try_init(),
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .with_writer(writer)
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .flatten_event(true)
            .with_writer(writer)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("global default trace dispatcher has already been set") {
                Ok(guard)
            } else {
                Err(StorageError::ConfigurationError(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        }
    }
}

/// [`init_subscriber`] with [`SubscriberConfig::from_env`].
pub fn init_from_env() -> Result<Option<WorkerGuard>, StorageError> {
    init_subscriber(SubscriberConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = SubscriberConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.log_level, tracing::Level::WARN);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert!(config.log_file.is_none());
        assert_eq!(config.filter_directive(), "canfar=warn,canfar_storage=warn");
    }

    #[test]
    fn reads_all_variables() {
        let config = SubscriberConfig::from_lookup(lookup(&[
            (LOG_LEVEL_ENV, "DEBUG"),
            (LOG_FORMAT_ENV, "json-compact"),
            (LOG_FILE_ENV, "/var/log/canfar.log"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/canfar.log")));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(SubscriberConfig::from_lookup(lookup(&[(LOG_LEVEL_ENV, "loud")])).is_err());
        assert!(SubscriberConfig::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])).is_err());
    }

    #[test]
    fn file_writer_needs_file_name() {
        let config = SubscriberConfig {
            log_file: Some(PathBuf::from("/")),
            ..SubscriberConfig::default()
        };
        assert!(make_writer(&config).is_err());
    }

    #[test]
    fn file_writer_returns_guard() {
        let dir = tempfile::tempdir().unwrap();
        let config = SubscriberConfig {
            log_file: Some(dir.path().join("storage.log")),
            ..SubscriberConfig::default()
        };
        let (_writer, guard) = make_writer(&config).unwrap();
        assert!(guard.is_some());
    }
}
