//! gridbot — grid trading daemon
//!
//! Headless lifecycle orchestrator for an unattended grid-trading process:
//! - YAML configuration translated into typed grid parameters
//! - Staged startup with fail-fast abort semantics
//! - Periodic statistics reporting while running
//! - SIGTERM/SIGINT graceful shutdown with fault-isolated cleanup

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod grid;

pub use error::AppError;
