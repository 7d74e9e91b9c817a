//! Error types for MathGenius
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Note that most of these never reach the student: the model gateway maps
//! every provider failure to a fixed fallback string, and the session turns
//! attachment failures into a degraded send. The typed errors exist for the
//! layers underneath and for the command-line surface.

use thiserror::Error;

/// Main error type for MathGenius operations
#[derive(Error, Debug)]
pub enum MathGeniusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, unexpected responses, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Unknown grade or topic
    #[error("Curriculum error: {0}")]
    Curriculum(String),

    /// Attachment could not be read or encoded
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Math typesetting failed for a single segment
    #[error("Typesetting error: {0}")]
    Typesetting(String),

    /// Invalid interactive command
    #[error("Command error: {0}")]
    Command(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for MathGenius operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = MathGeniusError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_provider_error_display() {
        let error = MathGeniusError::Provider("HTTP 503".to_string());
        assert_eq!(error.to_string(), "Provider error: HTTP 503");
    }

    #[test]
    fn test_curriculum_error_display() {
        let error = MathGeniusError::Curriculum("unknown grade 5".to_string());
        assert_eq!(error.to_string(), "Curriculum error: unknown grade 5");
    }

    #[test]
    fn test_attachment_error_display() {
        let error = MathGeniusError::Attachment("file too large".to_string());
        assert_eq!(error.to_string(), "Attachment error: file too large");
    }

    #[test]
    fn test_typesetting_error_display() {
        let error = MathGeniusError::Typesetting("unbalanced braces".to_string());
        assert_eq!(error.to_string(), "Typesetting error: unbalanced braces");
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = MathGeniusError::MissingCredentials("gemini".to_string());
        assert_eq!(
            error.to_string(),
            "Missing credentials for provider: gemini"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: MathGeniusError = io_error.into();
        assert!(matches!(error, MathGeniusError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: MathGeniusError = json_error.into();
        assert!(matches!(error, MathGeniusError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: MathGeniusError = yaml_error.into();
        assert!(matches!(error, MathGeniusError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MathGeniusError>();
    }
}
