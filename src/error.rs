// src/error.rs

//! Unified error handling for the content pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Signing the service account assertion failed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials were rejected or could not be exchanged for a token
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Remote API answered with a non-success status
    #[error("{kind} error for '{context}' (HTTP {status}): {message}")]
    Api {
        kind: ApiErrorKind,
        context: String,
        status: u16,
        message: String,
    },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Image download or processing error
    #[error("Image error for {context}: {message}")]
    Image { context: String, message: String },
}

/// Classification of remote API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Authorization,
    Client,
    Server,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiErrorKind::Authorization => "Authorization",
            ApiErrorKind::Client => "API client",
            ApiErrorKind::Server => "API server",
        };
        f.write_str(label)
    }
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an authorization error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an image error with context.
    pub fn image(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Image {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an API error from an HTTP status code.
    pub fn api(context: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => ApiErrorKind::Authorization,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Client,
        };
        Self::Api {
            kind,
            context: context.into(),
            status,
            message: message.into(),
        }
    }

    /// Whether this error means the credentials cannot be used at all.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            AppError::Auth(_)
                | AppError::Api {
                    kind: ApiErrorKind::Authorization,
                    ..
                }
        )
    }
}
