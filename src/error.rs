//! Application-wide error types using thiserror
//!
//! Fatal startup errors unwind to `main` and terminate the process non-zero
//! after cleanup has run. Cleanup-step and reporting-cycle errors are never
//! wrapped in `AppError`; they are logged and contained where they occur.

use crate::adapters::errors::ExchangeError;
use crate::grid::GridError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration document unreadable or malformed
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    /// Configuration parsed but structurally invalid for the chosen grid type
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),

    /// Unsupported exchange or connection failure during startup
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// Pre-start spot reserve verification failed
    #[error("Startup reserve check failed: {0}")]
    ReserveCheck(String),

    /// A grid collaborator (coordinator, engine) failed fatally
    #[error("Grid system error: {0}")]
    Grid(#[from] GridError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
