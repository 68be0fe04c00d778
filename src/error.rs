//! Error types for format-shifter
//!
//! This module provides error handling for the library, including:
//! - The crate-wide [`Error`] enum returned from fallible operations
//! - [`ConversionError`] produced by [`ImageCodec`](crate::codec::ImageCodec) implementations
//! - [`DownloadError`] produced by [`FileSink`](crate::sink::FileSink) implementations
//!
//! Conversion errors never escape a running batch: the pipeline folds them into
//! the task state. Download errors escape only from single-file downloads.

use crate::types::{BatchId, Status, TaskId};
use thiserror::Error;

/// Boxed underlying cause carried by value-style errors
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for format-shifter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for format-shifter
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "conversion.default_quality")
        key: Option<String>,
    },

    /// Image conversion failed
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Writing a converted file failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// A task was asked to move between two states that are not connected
    #[error("task {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// The task that rejected the transition
        id: TaskId,
        /// The state the task was in
        from: Status,
        /// The state that was requested
        to: Status,
    },

    /// Task not present in the batch
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Batch not tracked by the pipeline (never run there, or released)
    #[error("batch not found: {0}")]
    BatchNotFound(BatchId),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation was cancelled before it could finish
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for a configuration error pointing at a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Failure reported by an image codec
///
/// The `Display` output is the human-readable message only; it is stored
/// verbatim as the error message of a failed task.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConversionError {
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl ConversionError {
    /// Create a conversion error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a conversion error that wraps an underlying cause
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Input bytes could not be decoded as the declared format
    pub fn decode(format: crate::types::ImageFormat, reason: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "Failed to decode input image as {}: {}",
            format.display_name(),
            reason
        ))
    }

    /// Target format cannot be produced by this codec
    pub fn unsupported_format(format: crate::types::ImageFormat) -> Self {
        Self::new(format!(
            "{} output format not supported",
            format.display_name()
        ))
    }

    /// Encoding into the target format failed
    pub fn encode(format: crate::types::ImageFormat, reason: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "Failed to encode image to {}: {}",
            format.display_name(),
            reason
        ))
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while handing converted bytes to a file sink
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The task has no converted output to write
    #[error("task {task_id} has no converted output")]
    MissingOutput {
        /// The task that was asked to download
        task_id: TaskId,
    },

    /// The file name cannot be used as a plain file name
    #[error("invalid file name {name:?}: {reason}")]
    InvalidFileName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The underlying write failed (permissions, storage exhausted, ...)
    #[error("failed to write {file_name}: {source}")]
    WriteFailed {
        /// The file that could not be written
        file_name: String,
        /// The I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The sink declined to store the file (e.g. collision with Skip policy)
    #[error("{file_name} was not saved: {reason}")]
    Rejected {
        /// The file that was not stored
        file_name: String,
        /// Why the sink declined
        reason: String,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageFormat;
    use std::error::Error as _;

    #[test]
    fn conversion_error_displays_only_the_message() {
        let err = ConversionError::with_source(
            "Failed to decode input image",
            std::io::Error::other("bad header"),
        );
        assert_eq!(err.to_string(), "Failed to decode input image");
        assert_eq!(err.source().unwrap().to_string(), "bad header");
    }

    #[test]
    fn conversion_error_helpers_name_the_format() {
        assert_eq!(
            ConversionError::unsupported_format(ImageFormat::Heic).to_string(),
            "HEIC output format not supported"
        );
        assert!(
            ConversionError::decode(ImageFormat::Heic, "truncated")
                .message()
                .contains("HEIC")
        );
        assert!(
            ConversionError::encode(ImageFormat::Jpg, "out of memory")
                .message()
                .contains("JPEG")
        );
    }

    #[test]
    fn conversion_error_converts_into_crate_error() {
        let err: Error = ConversionError::new("boom").into();
        assert!(matches!(err, Error::Conversion(_)));
        assert_eq!(err.to_string(), "conversion error: boom");
    }

    #[test]
    fn invalid_transition_mentions_both_states() {
        let err = Error::InvalidTransition {
            id: TaskId::new("task_1_0"),
            from: Status::Completed,
            to: Status::Pending,
        };
        let msg = err.to_string();
        assert!(msg.contains("task_1_0"));
        assert!(msg.contains("Completed"));
        assert!(msg.contains("Pending"));
    }

    #[test]
    fn batch_not_found_names_the_batch() {
        let err = Error::BatchNotFound(BatchId(0xbeef));
        assert_eq!(err.to_string(), "batch not found: 000000000000beef");
    }

    #[test]
    fn write_failed_keeps_io_cause() {
        let err = DownloadError::WriteFailed {
            file_name: "a_converted.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("a_converted.png"));
        assert!(err.source().is_some());
    }

    #[test]
    fn config_helper_sets_key() {
        match Error::config("conversion.default_quality", "out of range") {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("conversion.default_quality"));
                assert_eq!(message, "out of range");
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }
}
