//! Error types for the heart-disease preprocessing pipeline.
//!
//! The pipeline uses a two-tier policy. Hard failures (a required filter
//! column is missing, the input file cannot be read) are represented by
//! [`PreprocessingError`] and abort the run. Soft conditions, such as an
//! optional encoding column being absent, are not errors at all: they are
//! recorded as [`StepOutcome::Skipped`](crate::types::StepOutcome::Skipped)
//! and the pipeline continues.
//!
//! Errors are serializable so a caller can forward them as `{code, message}`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// A column required by the implausible-value filter is absent.
    #[error("Required column '{0}' not found in dataset")]
    MissingRequiredColumn(String),

    /// Input file does not exist.
    #[error("Input file not found at '{}'", .0.display())]
    InputNotFound(PathBuf),

    /// Input file exists but could not be parsed as a table.
    #[error("Failed to load '{}': {reason}", path.display())]
    LoadFailed { path: PathBuf, reason: String },

    /// Output file could not be written.
    #[error("Failed to write '{}': {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal invariant broken.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRequiredColumn(_) => "SCHEMA_ERROR",
            Self::InputNotFound(_) => "NOT_FOUND",
            Self::LoadFailed { .. } => "LOAD_ERROR",
            Self::WriteFailed { .. } => "WRITE_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the failure came from the file boundary rather than the pipeline.
    pub fn is_io_boundary(&self) -> bool {
        match self {
            Self::InputNotFound(_) | Self::LoadFailed { .. } | Self::WriteFailed { .. } => true,
            Self::WithContext { source, .. } => source.is_io_boundary(),
            _ => false,
        }
    }

    /// Check if the caller can fix this by changing its input or settings.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InputNotFound(_) | Self::InvalidConfig(_) | Self::MissingRequiredColumn(_) => {
                true
            }
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for PreprocessingError {
    fn from(e: crate::config::ConfigValidationError) -> Self {
        PreprocessingError::InvalidConfig(e.to_string())
    }
}

impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}
