//! Subscriber installation.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Unknown log format: {0} (expected \"text\" or \"json\")")]
    UnknownFormat(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryOptions {
    pub service_name: String,
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl TelemetryOptions {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            format: LogFormat::default(),
            default_filter: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }
}

/// Install a text subscriber on stderr honouring `RUST_LOG`.
pub fn init_telemetry(service_name: &str) -> Result<(), TelemetryError> {
    init_with_options(TelemetryOptions::new(service_name))
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
///
/// Fails if a global subscriber is already installed.
pub fn init_with_options(options: TelemetryOptions) -> Result<(), TelemetryError> {
    let filter = build_filter(&options.default_filter);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match options.format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.map_err(|e| TelemetryError::Install(e.to_string()))?;

    tracing::info!(service.name = %options.service_name, format = %options.format, "telemetry initialized");
    Ok(())
}

fn build_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!("xml".parse::<LogFormat>(), Err(TelemetryError::UnknownFormat(_))));
    }

    #[test]
    fn options_default_to_text_at_info() {
        let options = TelemetryOptions::new("pdfchat");
        assert_eq!(options.format, LogFormat::Text);
        assert_eq!(options.default_filter, "info");
    }
}
