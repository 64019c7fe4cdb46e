//! Error types for the resource follower.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The main error type for follow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when reading local files or writing to a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP errors from the reqwest client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The resource identifier could not be parsed into a file path or URL.
    #[error("Invalid resource identifier: {message}")]
    InvalidResource { message: String },

    /// Configuration errors detected before polling begins.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The charset label is not recognized by encoding_rs.
    #[error("Unknown charset: {label}")]
    UnknownCharset { label: String },

    /// The server answered with a status outside the success range.
    #[error("Unexpected HTTP status: {status}")]
    HttpStatus { status: u16 },

    /// The follow timeout elapsed with `fail_on_timeout` set.
    #[error(
        "Follow timed out at {at}: no completion within {timeout_secs}s (elapsed {elapsed_secs}s)"
    )]
    TimedOut {
        elapsed_secs: u64,
        timeout_secs: u64,
        at: DateTime<Utc>,
    },

    /// Stream has been closed or dropped.
    #[error("Stream closed")]
    StreamClosed,
}

/// A convenient Result type for follow operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_error = IoError::new(ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();

        match error {
            Error::Io(_) => {}
            _ => panic!("Expected Error::Io variant"),
        }

        assert!(error.to_string().contains("I/O error"));
        assert!(error.to_string().contains("File not found"));
    }

    #[test]
    fn test_invalid_resource_error() {
        let error = Error::InvalidResource {
            message: "unsupported scheme: ftp".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Invalid resource identifier: unsupported scheme: ftp"
        );
    }

    #[test]
    fn test_config_error() {
        let error = Error::Config {
            message: "more than one sink selected".to_string(),
        };

        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("more than one sink selected"));
    }

    #[test]
    fn test_unknown_charset_error() {
        let error = Error::UnknownCharset {
            label: "utf-99".to_string(),
        };

        assert_eq!(error.to_string(), "Unknown charset: utf-99");
    }

    #[test]
    fn test_http_status_error() {
        let error = Error::HttpStatus { status: 503 };
        assert_eq!(error.to_string(), "Unexpected HTTP status: 503");
    }

    #[test]
    fn test_timed_out_error_mentions_both_durations() {
        let error = Error::TimedOut {
            elapsed_secs: 301,
            timeout_secs: 300,
            at: Utc::now(),
        };

        let message = error.to_string();
        assert!(message.contains("300s"));
        assert!(message.contains("301s"));
    }

    #[test]
    fn test_error_io_chain_preserved() {
        let io_error = IoError::new(ErrorKind::PermissionDenied, "Access denied");
        let error: Error = io_error.into();

        match &error {
            Error::Io(inner) => {
                assert_eq!(inner.kind(), ErrorKind::PermissionDenied);
                assert_eq!(inner.to_string(), "Access denied");
            }
            _ => panic!("Expected Error::Io variant"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        let success: Result<i32> = Ok(42);
        let failure: Result<i32> = Err(Error::StreamClosed);

        assert!(success.is_ok());
        assert!(failure.is_err());
    }

    #[test]
    fn test_error_send_sync_traits() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
