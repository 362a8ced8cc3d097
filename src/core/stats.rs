//! Periodic statistics reporter
//!
//! Runs alongside the coordinator and logs an operational report on a
//! fixed interval. A failed report cycle is logged and skipped; the loop
//! only exits on cancellation or when the running flag clears.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::grid::{Coordinator, GridStatistics};

/// Default reporting interval in seconds.
pub const DEFAULT_STATS_INTERVAL_SECS: u64 = 300;

/// Statistics reporting loop.
///
/// Sleeps for `interval`, then emits one report. Cancellation always takes
/// priority over the timer, and a cleared running flag ends the loop at the
/// next wakeup.
pub async fn statistics_task<C: Coordinator>(
    coordinator: Arc<C>,
    running: Arc<AtomicBool>,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!(interval_secs = interval.as_secs(), "Statistics reporter started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Statistics reporter stopping");
                break;
            }
            _ = sleep(interval) => {}
        }

        if !running.load(Ordering::SeqCst) {
            info!("Grid no longer running, statistics reporter exiting");
            break;
        }

        match coordinator.statistics() {
            Ok(stats) => log_report(&stats),
            Err(err) => {
                error!(error = %err, "Failed to collect statistics, will retry next cycle");
            }
        }
    }
}

fn log_report(stats: &GridStatistics) {
    info!(
        symbol = %stats.symbol,
        grid_type = stats.grid_type,
        uptime_secs = stats.uptime_secs,
        position = %stats.current_position,
        avg_cost = %stats.average_price,
        price = %stats.current_price,
        active_orders = stats.active_orders,
        fills = stats.total_filled,
        volume = %stats.total_volume,
        realized_pnl = %stats.realized_pnl,
        unrealized_pnl = %stats.unrealized_pnl,
        total_pnl = %stats.total_pnl,
        pnl_pct = %stats.pnl_percentage.round_dp(4),
        apr_pct = %stats.apr.round_dp(2),
        "Grid statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridError, GridResult, GridStateSnapshot};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::AtomicU32;
    use tokio::time::timeout;

    struct FlakyCoordinator {
        calls: AtomicU32,
        fail_first: bool,
    }

    #[async_trait]
    impl Coordinator for FlakyCoordinator {
        async fn start(&self) -> GridResult<()> {
            Ok(())
        }
        async fn stop(&self) -> GridResult<()> {
            Ok(())
        }
        async fn cleanup_on_exit(&self) -> GridResult<()> {
            Ok(())
        }
        fn statistics(&self) -> GridResult<GridStatistics> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(GridError::Engine("stats unavailable".to_string()));
            }
            Ok(GridStatistics {
                symbol: "SOL_USDC".to_string(),
                grid_type: "long",
                uptime_secs: 60,
                current_position: Decimal::ZERO,
                average_price: Decimal::ZERO,
                current_price: Decimal::ZERO,
                active_orders: 0,
                total_filled: 0,
                total_volume: Decimal::ZERO,
                realized_pnl: Decimal::ZERO,
                unrealized_pnl: Decimal::ZERO,
                total_pnl: Decimal::ZERO,
                pnl_percentage: Decimal::ZERO,
                apr: Decimal::ZERO,
            })
        }
        fn state_snapshot(&self) -> GridStateSnapshot {
            GridStateSnapshot::default()
        }
    }

    #[tokio::test]
    async fn test_reporter_stops_on_cancel() {
        let coordinator = Arc::new(FlakyCoordinator {
            calls: AtomicU32::new(0),
            fail_first: false,
        });
        let running = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(statistics_task(
            coordinator,
            running,
            Duration::from_secs(300),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter should stop on cancel")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_survives_failing_cycle() {
        let coordinator = Arc::new(FlakyCoordinator {
            calls: AtomicU32::new(0),
            fail_first: true,
        });
        let running = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(statistics_task(
            coordinator.clone(),
            running,
            Duration::from_secs(300),
            cancel.clone(),
        ));

        // Two full intervals: first cycle fails, second succeeds.
        tokio::time::sleep(Duration::from_secs(650)).await;
        cancel.cancel();
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter should still be alive after a failed cycle")
            .unwrap();

        assert!(coordinator.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_exits_when_running_flag_clears() {
        let coordinator = Arc::new(FlakyCoordinator {
            calls: AtomicU32::new(0),
            fail_first: false,
        });
        let running = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(statistics_task(
            coordinator.clone(),
            running,
            Duration::from_secs(300),
            cancel,
        ));

        tokio::time::sleep(Duration::from_secs(350)).await;
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter should exit once the grid stops")
            .unwrap();

        assert_eq!(coordinator.calls.load(Ordering::SeqCst), 0);
    }
}
