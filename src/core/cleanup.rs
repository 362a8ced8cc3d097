//! Fault-isolated teardown sequencer
//!
//! Every teardown step runs regardless of whether earlier steps failed.
//! Failures are logged per step and the count is returned so the caller can
//! pick an exit disposition. The order is fixed: running flag, statistics
//! reporter, exit cleanup, coordinator stop, reserve monitor stop, adapter
//! disconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::adapters::ExchangeAdapter;
use crate::grid::{Coordinator, ReserveMonitor};

/// Handle to the statistics reporter task, cancelled and awaited during
/// teardown.
pub struct StatsHandle {
    pub cancel: CancellationToken,
    pub handle: JoinHandle<()>,
}

/// Run the full teardown sequence. Returns the number of failed steps.
pub async fn run_cleanup<C, M, A>(
    running: &AtomicBool,
    stats: Option<StatsHandle>,
    coordinator: Option<Arc<C>>,
    reserve_monitor: Option<Arc<M>>,
    adapter: Option<Arc<Mutex<A>>>,
) -> usize
where
    C: Coordinator + ?Sized,
    M: ReserveMonitor + ?Sized,
    A: ExchangeAdapter,
{
    info!("Beginning shutdown sequence");
    let mut failures = 0usize;

    running.store(false, Ordering::SeqCst);

    if let Some(stats) = stats {
        stats.cancel.cancel();
        if let Err(err) = stats.handle.await {
            // A panicked reporter must not block the rest of teardown.
            error!(error = %err, "Statistics reporter did not stop cleanly");
            failures += 1;
        }
    }

    if let Some(coordinator) = coordinator {
        if let Err(err) = coordinator.cleanup_on_exit().await {
            error!(error = %err, "Exit cleanup failed");
            failures += 1;
        }
        if let Err(err) = coordinator.stop().await {
            error!(error = %err, "Coordinator stop failed");
            failures += 1;
        }
    }

    if let Some(monitor) = reserve_monitor {
        if let Err(err) = monitor.stop().await {
            error!(error = %err, "Reserve monitor stop failed");
            failures += 1;
        }
    }

    if let Some(adapter) = adapter {
        let mut adapter = adapter.lock().await;
        if adapter.is_connected() {
            if let Err(err) = adapter.disconnect().await {
                error!(error = %err, "Adapter disconnect failed");
                failures += 1;
            }
        }
    }

    if failures == 0 {
        info!("Shutdown sequence complete");
    } else {
        error!(failed_steps = failures, "Shutdown sequence completed with errors");
    }
    failures
}
