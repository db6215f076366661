//! # Error Types Module
//!
//! This module defines the error types used throughout the bot.
//! Startup errors (`MissingCredentialError`, `ConfigError`) are fatal, while
//! per-event errors (`RecognitionError`, `PlatformDeliveryError`) are isolated
//! to the event that caused them.

use std::path::PathBuf;

use thiserror::Error;

/// A credential could not be loaded at startup
#[derive(Debug, Error)]
pub enum MissingCredentialError {
    /// The credential file does not exist or cannot be read
    #[error("credential file {path} cannot be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The credential file exists but holds nothing but whitespace
    #[error("credential file {0} is empty")]
    EmptyFile(PathBuf),
    /// The environment variable is not set or is blank
    #[error("environment variable {0} is not set")]
    UnsetVariable(String),
}

/// Invalid or incomplete configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Credential(#[from] MissingCredentialError),
    #[error("{variable} is required when {reason}")]
    Missing {
        variable: &'static str,
        reason: &'static str,
    },
    #[error("invalid value {value:?} for {variable}: {reason}")]
    Invalid {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure of a call to the image recognition API
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The image could not be read from disk
    #[error("cannot read image: {0}")]
    Io(#[from] std::io::Error),
    /// The API did not answer within the configured timeout
    #[error("recognition request timed out: {0}")]
    Timeout(String),
    /// Connection or protocol failure
    #[error("recognition request failed: {0}")]
    Transport(String),
    /// The API answered with a non-success status
    #[error("recognition API returned {status}: {message}")]
    Api { status: u16, message: String },
    /// The API answered with a body we cannot decode
    #[error("malformed recognition response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for RecognitionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RecognitionError::Timeout(err.to_string())
        } else if err.is_decode() {
            RecognitionError::MalformedResponse(err.to_string())
        } else {
            RecognitionError::Transport(err.to_string())
        }
    }
}

/// The messaging platform refused or failed a request
#[derive(Debug, Error)]
pub enum PlatformDeliveryError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("file download failed: {0}")]
    Download(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_error_messages() {
        let err = MissingCredentialError::UnsetVariable("TELEGRAM_TOKEN".to_string());
        assert_eq!(err.to_string(), "environment variable TELEGRAM_TOKEN is not set");

        let err = MissingCredentialError::EmptyFile(PathBuf::from("/tmp/key"));
        assert_eq!(err.to_string(), "credential file /tmp/key is empty");
    }

    #[test]
    fn test_config_error_wraps_credential_error() {
        let err: ConfigError = MissingCredentialError::UnsetVariable("X".to_string()).into();
        assert!(matches!(err, ConfigError::Credential(_)));
        assert_eq!(err.to_string(), "environment variable X is not set");
    }

    #[test]
    fn test_recognition_error_messages() {
        let err = RecognitionError::Api {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "recognition API returned 401: Unauthorized");

        let err = RecognitionError::Timeout("after 30s".to_string());
        assert!(err.to_string().contains("timed out"));
    }
}
