//! Error types and handling for `tempcast`

use axum::http::StatusCode;
use reqwest_retry::RetryError;
use thiserror::Error;

/// Main error type for the `tempcast` application
#[derive(Error, Debug)]
pub enum TempcastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The warehouse accepted the request but rejected the statement
    #[error("Warehouse error {code} (SQLSTATE {sql_state}): {message}")]
    Warehouse {
        code: String,
        sql_state: String,
        message: String,
    },

    /// Transport-level failures talking to the warehouse
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Statement did not finish within the polling budget
    #[error("Timed out: {message}")]
    Timeout { message: String },

    /// A query that must return a value returned nothing
    #[error("Empty result: {message}")]
    EmptyResult { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TempcastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn http<S: Into<String>>(message: S) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn empty_result<S: Into<String>>(message: S) -> Self {
        Self::EmptyResult {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TempcastError::Config { .. } => {
                "Configuration error. Please check your config file and warehouse credentials."
                    .to_string()
            }
            TempcastError::Validation { message } => format!("Invalid input: {message}"),
            TempcastError::Warehouse { message, .. } => {
                format!("The warehouse rejected the query: {message}")
            }
            TempcastError::Http { .. } => {
                "Unable to reach the warehouse. Please check your network connection.".to_string()
            }
            TempcastError::Timeout { .. } => {
                "The warehouse did not answer in time. Please try again.".to_string()
            }
            TempcastError::EmptyResult { message } => {
                format!("The prediction function returned no value: {message}")
            }
            TempcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// HTTP status used when this error reaches the web layer
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            TempcastError::Validation { .. } => StatusCode::BAD_REQUEST,
            TempcastError::Warehouse { .. }
            | TempcastError::Http { .. }
            | TempcastError::EmptyResult { .. } => StatusCode::BAD_GATEWAY,
            TempcastError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            TempcastError::Config { .. } | TempcastError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest_middleware::Error> for TempcastError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => {
                // The retry middleware wraps the last transport error
                let timed_out = match e.downcast_ref::<RetryError>() {
                    Some(
                        RetryError::WithRetries { err: inner, .. } | RetryError::Error(inner),
                    ) => is_timeout(inner),
                    None => false,
                };
                if timed_out {
                    TempcastError::timeout(e.to_string())
                } else {
                    TempcastError::http(e.to_string())
                }
            }
        }
    }
}

fn is_timeout(err: &reqwest_middleware::Error) -> bool {
    matches!(err, reqwest_middleware::Error::Reqwest(e) if e.is_timeout())
}

impl From<reqwest::Error> for TempcastError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TempcastError::timeout(err.to_string())
        } else {
            TempcastError::http(err.to_string())
        }
    }
}
