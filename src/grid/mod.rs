//! Grid system collaborators
//!
//! Strategy, engine, tracker, coordinator and the spot reserve policy. The
//! lifecycle orchestrator in `core` only sequences construction, start and
//! stop of these objects; their trading internals stay behind the
//! `Coordinator` and `ReserveMonitor` seams.

pub mod coordinator;
pub mod engine;
pub mod reserve;
pub mod state;

pub use coordinator::{Coordinator, GridCoordinator, GridStatistics};
pub use engine::{GridEngine, GridStrategy, PositionTracker};
pub use reserve::{ReserveMonitor, SpotReserveManager, SpotReserveMonitor};
pub use state::{GridState, GridStateSnapshot};

use thiserror::Error;

/// Errors raised by grid collaborators (coordinator, engine, reserve).
///
/// During startup these are fatal; during cleanup they are logged and
/// isolated so sibling teardown steps still run.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Grid system already running")]
    AlreadyRunning,

    #[error("Grid system is not running")]
    NotRunning,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Reserve policy violation: {0}")]
    Reserve(String),

    #[error("Exchange error: {0}")]
    Exchange(#[from] crate::adapters::ExchangeError),
}

/// Result type alias for grid operations
pub type GridResult<T> = std::result::Result<T, GridError>;
