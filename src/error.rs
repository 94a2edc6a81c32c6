//! Error types for configuration blob operations.
//!
//! Each codec reports failures from its own family (`ValidationError`,
//! `EncodingError`, `DecodeError`, `ExternalToolError`). The packer and the
//! CLI lift them into [`CfgError`].

use std::time::Duration;

use thiserror::Error;

use crate::codec::resolution;
use crate::codec::timercam::Mode;

/// Bad, missing or out-of-range input fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Configuration mode must be specified")]
    MissingMode,

    #[error("Invalid mode: {mode}. Must be one of: {}", Mode::names().join(", "))]
    UnknownMode { mode: String },

    #[error(
        "{} mode only supports these resolutions for '{field}':\n{}",
        .mode.as_str().to_uppercase(),
        resolution::describe(.allowed)
    )]
    InvalidResolution {
        mode: Mode,
        field: &'static str,
        allowed: &'static [u8],
    },

    #[error("Missing required fields for {context}: {}", .fields.join(", "))]
    MissingFields { context: String, fields: Vec<String> },

    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Maximum of 3 WiFi networks supported, got {count}")]
    TooManyNetworks { count: usize },
}

/// Input that cannot fit the fixed layout of a format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Field '{field}' is {len} bytes, at most {max} fit")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Payload is {len} bytes, at most {max} fit in the block")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Generated image is {actual} bytes, expected {expected}")]
    ImageSizeMismatch { expected: usize, actual: usize },
}

/// A binary blob that does not verify.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid file size: expected at least {expected} bytes, got {actual}")]
    InvalidSize { expected: usize, actual: usize },

    #[error("{field} checksum check failed (stored {stored:#04x}, computed {computed:#04x}) - configuration may be corrupted")]
    ChecksumMismatch {
        field: &'static str,
        stored: u8,
        computed: u8,
    },

    #[error("Malformed blob: {0}")]
    Malformed(String),
}

impl DecodeError {
    /// Field name carried by a checksum mismatch.
    pub const fn mismatched_field(&self) -> Option<&'static str> {
        match self {
            Self::ChecksumMismatch { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Failure of the delegated NVS image generator.
#[derive(Error, Debug)]
pub enum ExternalToolError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {}{}", .status.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")), format_stderr(.stderr))]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("'{program}' did not finish within {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("'{program}' reported success but produced no image at {path}")]
    MissingOutput { program: String, path: String },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Primary error type for m5cfg operations.
#[derive(Error, Debug)]
pub enum CfgError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),

    // Input errors
    #[error("Input file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    // Settings errors
    #[error("Settings file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Settings parse error: {0}")]
    ConfigParse(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl CfgError {
    /// Short machine-readable name of the error family.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Encoding(_) => "encoding",
            Self::Decode(_) => "decode",
            Self::ExternalTool(_) => "external_tool",
            Self::Json(_) => "input",
            Self::ConfigNotFound { .. } | Self::ConfigParse(_) => "settings",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Encoding(_)
                | Self::Json(_)
                | Self::ConfigNotFound { .. }
                | Self::ConfigParse(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Validation(ValidationError::MissingFields { .. }) => {
                Some("Add the listed fields to the input JSON")
            }
            Self::Validation(ValidationError::TooManyNetworks { .. }) => {
                Some("Remove networks until at most 3 remain")
            }
            Self::Encoding(EncodingError::FieldTooLong { .. }) => {
                Some("SSIDs are limited to 48 bytes and passwords to 47 bytes")
            }
            Self::Decode(DecodeError::ChecksumMismatch { .. }) => {
                Some("Read the blob from the device again; it may be corrupted")
            }
            Self::ExternalTool(ExternalToolError::Spawn { .. }) => {
                Some("Check the [nvs] program setting; run: m5cfg config")
            }
            Self::ConfigNotFound { .. } => Some("Check the --config path"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using CfgError.
pub type Result<T> = std::result::Result<T, CfgError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CfgError::Other(format!("{}: {e}", f().into())))
    }
}
