//! Logging configuration
//!
//! Structured logging via tracing, suitable for headless deployments where
//! stdout is captured by the process supervisor.
//!
//! # Environment Variables
//! - `LOG_FORMAT`: Output format - `json` (default) or `pretty`
//! - `RUST_LOG`: Log level filter (default: `info`)
//!
//! The `--debug` CLI flag raises a named set of subsystem targets to DEBUG
//! on top of whatever `RUST_LOG` selects.

use tracing_subscriber::EnvFilter;

/// Subsystem targets raised to DEBUG by the `--debug` flag
const DEBUG_TARGETS: &[&str] = &["gridbot::core", "gridbot::grid", "gridbot::adapters"];

/// Initialize logging with configurable format.
///
/// Reads `LOG_FORMAT` from the environment:
/// - `json` (default): machine-parseable output for production
/// - `pretty`: human-readable output for development
///
/// Respects `RUST_LOG` for level filtering (default: `info`).
pub fn init_logging(debug: bool) {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if debug {
        for target in DEBUG_TARGETS {
            env_filter = env_filter.add_directive(
                format!("{}=debug", target)
                    .parse()
                    .expect("static debug directive"),
            );
        }
    }

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .pretty()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .json()
                .init();
        }
    }
}
