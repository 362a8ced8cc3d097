//! Exchange adapter error types
//!
//! All exchange-related errors are wrapped in the ExchangeError enum.
//! Unsupported-venue and connection failures are fatal during startup; the
//! runner maps them into `AppError::Exchange`.

use thiserror::Error;

/// Exchange-specific error types for adapter operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// No adapter implementation exists for the configured exchange id
    #[error("Unsupported exchange: '{0}'")]
    Unsupported(String),

    /// Connection to exchange failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or unexpected response from exchange
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation attempted on a disconnected adapter
    #[error("Not connected to exchange")]
    NotConnected,
}

/// Result type alias for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
