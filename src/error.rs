//! Error types for snapshot capture operations

use thiserror::Error;

/// Result type alias for snapshot capture operations
pub type Result<T> = std::result::Result<T, SnapError>;

/// Error types for snapshot capture operations
#[derive(Error, Debug)]
pub enum SnapError {
    /// Input/output errors (permission denied, missing directory, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding errors
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// None of the allow-listed tasks is exported by the simulator
    #[error("No candidate grasp tasks available in this simulator install.")]
    NoCandidateTasks,

    /// Task name not known to the registry or the simulator
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Frame buffer that cannot be turned into an image
    #[error("Unsupported frame buffer: {0}")]
    UnsupportedBuffer(String),

    /// Action rejected by the simulator
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Simulator launch, reset, step or shutdown failures
    #[error("Simulator error: {0}")]
    Simulator(String),
}

impl SnapError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unsupported buffer error
    pub fn unsupported_buffer<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedBuffer(msg.into())
    }

    /// Create a new invalid action error
    pub fn invalid_action<S: Into<String>>(msg: S) -> Self {
        Self::InvalidAction(msg.into())
    }

    /// Create a new simulator error
    pub fn simulator<S: Into<String>>(msg: S) -> Self {
        Self::Simulator(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = SnapError::invalid_config("test config error");
        assert!(matches!(err, SnapError::InvalidConfig(_)));

        let err = SnapError::unsupported_buffer("shape (2, 2, 2)");
        assert!(matches!(err, SnapError::UnsupportedBuffer(_)));

        let err = SnapError::simulator("engine died");
        assert!(matches!(err, SnapError::Simulator(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SnapError::NoCandidateTasks;
        assert_eq!(
            err.to_string(),
            "No candidate grasp tasks available in this simulator install."
        );

        let err = SnapError::invalid_action("expected 8 values, got 3");
        assert_eq!(err.to_string(), "Invalid action: expected 8 values, got 3");
    }

    #[test]
    fn test_file_io_error_context() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = SnapError::file_io_error("create output directory", Path::new("/root/x"), &io_err);
        let message = err.to_string();
        assert!(message.contains("create output directory"));
        assert!(message.contains("/root/x"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_config_value_error() {
        let err = SnapError::config_value_error("steps", 0, "1 or more");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Invalid steps: 0 (valid range: 1 or more)"
        );
    }
}
