//! Error types for the language-model pipeline

use crate::database::DatabaseError;
use thiserror::Error;

/// Result type for completion and schema operations
pub type AiResult<T> = Result<T, AiError>;

/// Errors that can occur while generating SQL or answers
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout error: operation took longer than {timeout_secs}s")]
    TimeoutError { timeout_secs: u64 },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error: {status_code} - {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Schema error: {0}")]
    SchemaError(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AiError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiError::NetworkError(_) | AiError::TimeoutError { .. } | AiError::RateLimited(_)
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AiError::ConfigurationError(msg) => {
                format!("Configuration issue: {}. Check your config file or environment variables.", msg)
            }
            AiError::NetworkError(msg) => {
                format!("Network error: {}. Check your internet connection.", msg)
            }
            AiError::TimeoutError { timeout_secs } => {
                format!("Request timed out after {} seconds. Try again or increase timeout_seconds in config.", timeout_secs)
            }
            AiError::AuthenticationError(msg) => {
                format!("Authentication failed: {}. Check FIREWORKS_API_KEY or ai.api_key in config.", msg)
            }
            AiError::RateLimited(msg) => {
                format!("The model endpoint is rate limiting requests: {}. Wait a moment and retry.", msg)
            }
            AiError::ApiError {
                status_code,
                message,
            } => format!("API error ({}): {}", status_code, message),
            AiError::MalformedResponse(msg) => {
                format!("The model returned a response that could not be read: {}", msg)
            }
            AiError::SchemaError(e) => {
                format!("Schema extraction failed: {}. Ensure the database file exists.", e)
            }
            _ => self.to_string(),
        }
    }
}
