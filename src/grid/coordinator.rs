//! Grid coordinator
//!
//! Top-level handle over the strategy, engine and tracker. The lifecycle
//! orchestrator drives it exclusively through the `Coordinator` trait:
//! start once at the end of startup, poll statistics on the reporting
//! interval, and run `cleanup_on_exit` then `stop` during teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adapters::ExchangeAdapter;
use crate::config::GridConfig;
use crate::grid::engine::{GridEngine, GridStrategy, PositionTracker};
use crate::grid::state::{GridState, GridStateSnapshot};
use crate::grid::{GridError, GridResult};

/// Seconds in a (non-leap) year, for annualizing returns.
const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

// ============================================================================
// Statistics
// ============================================================================

/// Aggregated runtime statistics, computed from a state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStatistics {
    pub symbol: String,
    pub grid_type: &'static str,
    pub uptime_secs: u64,
    pub current_position: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub active_orders: u64,
    pub total_filled: u64,
    pub total_volume: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    pub pnl_percentage: Decimal,
    pub apr: Decimal,
}

impl GridStatistics {
    /// Derive statistics from a state snapshot. PnL percentage is taken
    /// against the traded volume; APR annualizes it over the uptime. Both
    /// guard their zero denominators.
    pub fn from_snapshot(
        config: &GridConfig,
        snap: &GridStateSnapshot,
        uptime_secs: u64,
    ) -> Self {
        let unrealized_pnl = if snap.current_position == Decimal::ZERO {
            Decimal::ZERO
        } else {
            (snap.current_price - snap.average_price) * snap.current_position
        };
        let total_pnl = snap.realized_pnl + unrealized_pnl;

        let pnl_percentage = if snap.total_volume > Decimal::ZERO {
            total_pnl / snap.total_volume * Decimal::from(100)
        } else {
            Decimal::ZERO
        };

        let apr = if uptime_secs > 0 {
            pnl_percentage * Decimal::from(SECONDS_PER_YEAR) / Decimal::from(uptime_secs)
        } else {
            Decimal::ZERO
        };

        Self {
            symbol: config.symbol.clone(),
            grid_type: config.grid_type.as_str(),
            uptime_secs,
            current_position: snap.current_position,
            average_price: snap.average_price,
            current_price: snap.current_price,
            active_orders: snap.active_orders,
            total_filled: snap.total_filled,
            total_volume: snap.total_volume,
            realized_pnl: snap.realized_pnl,
            unrealized_pnl,
            total_pnl,
            pnl_percentage,
            apr,
        }
    }
}

// ============================================================================
// Coordinator trait
// ============================================================================

/// Lifecycle surface the orchestrator depends on.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Begin trading. Fails if already running.
    async fn start(&self) -> GridResult<()>;

    /// Stop trading. Idempotent for an already stopped coordinator.
    async fn stop(&self) -> GridResult<()>;

    /// Venue-side cleanup (order cancellation, position close) performed
    /// before `stop` during teardown. Honors the exit-cleanup setting.
    async fn cleanup_on_exit(&self) -> GridResult<()>;

    /// Current aggregated statistics.
    fn statistics(&self) -> GridResult<GridStatistics>;

    /// Raw point-in-time state.
    fn state_snapshot(&self) -> GridStateSnapshot;
}

// ============================================================================
// GridCoordinator
// ============================================================================

/// Concrete coordinator binding the configuration, strategy, engine and
/// tracker built during startup.
pub struct GridCoordinator<A: ExchangeAdapter> {
    config: GridConfig,
    strategy: GridStrategy,
    engine: GridEngine<A>,
    tracker: PositionTracker,
    state: GridState,
    running: AtomicBool,
    started_at: Mutex<Option<Instant>>,
}

impl<A: ExchangeAdapter> GridCoordinator<A> {
    pub fn new(
        config: GridConfig,
        strategy: GridStrategy,
        engine: GridEngine<A>,
        tracker: PositionTracker,
        state: GridState,
    ) -> Self {
        Self {
            config,
            strategy,
            engine,
            tracker,
            state,
            running: AtomicBool::new(false),
            started_at: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    async fn uptime_secs(&self) -> u64 {
        self.started_at
            .lock()
            .await
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }
}

#[async_trait]
impl<A: ExchangeAdapter + 'static> Coordinator for GridCoordinator<A> {
    async fn start(&self) -> GridResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GridError::AlreadyRunning);
        }

        let ladder = self.strategy.grid_levels(&self.config);
        self.engine
            .refresh_price(&self.config.symbol, &self.state)
            .await?;
        for (index, price) in ladder.iter().enumerate() {
            debug!(
                order_id = %self.engine.client_order_id(index),
                price = %price,
                "Grid level registered"
            );
        }
        self.state.set_active_orders(ladder.len() as u64);
        *self.started_at.lock().await = Some(Instant::now());

        info!(
            symbol = %self.config.symbol,
            grid_type = self.config.grid_type.as_str(),
            levels = ladder.len(),
            "Grid coordinator started"
        );
        Ok(())
    }

    async fn stop(&self) -> GridResult<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.state.set_active_orders(0);
        info!(symbol = %self.config.symbol, "Grid coordinator stopped");
        Ok(())
    }

    async fn cleanup_on_exit(&self) -> GridResult<()> {
        if !self.config.exit_cleanup_enabled {
            info!("Exit cleanup disabled, leaving orders and position in place");
            return Ok(());
        }

        let snap = self.state.snapshot();
        info!(
            active_orders = snap.active_orders,
            position = %snap.current_position,
            "Running exit cleanup"
        );

        if snap.current_position != Decimal::ZERO {
            let price = self
                .engine
                .refresh_price(&self.config.symbol, &self.state)
                .await?;
            self.tracker.record_fill(price, -snap.current_position);
            info!(price = %price, "Position closed on exit");
        }
        self.state.set_active_orders(0);
        Ok(())
    }

    fn statistics(&self) -> GridResult<GridStatistics> {
        if !self.is_running() {
            return Err(GridError::NotRunning);
        }
        let snap = self.state.snapshot();
        // Uptime without awaiting; try_lock only fails while start/stop is
        // mid-flight, in which case zero is close enough for a report line.
        let uptime = match self.started_at.try_lock() {
            Ok(guard) => guard.map(|t| t.elapsed().as_secs()).unwrap_or(0),
            Err(_) => {
                warn!("Uptime unavailable during state transition");
                0
            }
        };
        Ok(GridStatistics::from_snapshot(&self.config, &snap, uptime))
    }

    fn state_snapshot(&self) -> GridStateSnapshot {
        self.state.snapshot()
    }
}
