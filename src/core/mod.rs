//! Daemon lifecycle
//!
//! The startup sequencer, shutdown signal plumbing, statistics reporter
//! and the fault-isolated teardown sequencer.

pub mod cleanup;
pub mod runner;
pub mod shutdown;
pub mod stats;

pub use cleanup::{run_cleanup, StatsHandle};
pub use runner::{GridDaemon, StartupPhase};
pub use shutdown::{install_signal_bridge, ShutdownSignal};
pub use stats::{statistics_task, DEFAULT_STATS_INTERVAL_SECS};
