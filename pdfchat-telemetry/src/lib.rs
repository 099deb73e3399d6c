//! # pdfchat-telemetry
//!
//! Logging bootstrap for pdfchat binaries and the spans shared by its crates.
//!
//! ```rust,ignore
//! use pdfchat_telemetry::{LogFormat, TelemetryOptions, init_with_options};
//!
//! init_with_options(TelemetryOptions::new("pdfchat").with_format(LogFormat::Json))?;
//! ```

pub mod init;
pub mod spans;

pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, TelemetryError, TelemetryOptions, init_telemetry,
    init_with_options,
};
pub use spans::{chat_span, delete_span, ingest_span, search_span};
