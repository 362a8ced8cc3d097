//! Spot reserve policy
//!
//! Spot grids must keep a minimum balance of the base asset available.
//! The manager verifies the reserve once during startup (fail-fast before
//! the coordinator starts); the monitor re-checks it on an interval for
//! the rest of the run and only warns on violations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::adapters::ExchangeAdapter;
use crate::config::{GridConfig, SpotReserveConfig};
use crate::grid::{GridError, GridResult};

// ============================================================================
// Manager
// ============================================================================

/// Checks the base-asset balance against the configured minimum reserve.
pub struct SpotReserveManager<A: ExchangeAdapter> {
    adapter: Arc<Mutex<A>>,
    base_asset: String,
    reserve: SpotReserveConfig,
}

impl<A: ExchangeAdapter> SpotReserveManager<A> {
    pub fn new(adapter: Arc<Mutex<A>>, config: &GridConfig, reserve: SpotReserveConfig) -> Self {
        Self {
            adapter,
            base_asset: config.base_asset().to_string(),
            reserve,
        }
    }

    /// Minimum base-asset holding. An enabled policy without an explicit
    /// minimum degrades to a zero reserve, which every balance satisfies.
    pub fn required_reserve(&self) -> Decimal {
        self.reserve.min_reserve.unwrap_or(Decimal::ZERO)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.reserve.check_interval_secs)
    }

    pub async fn current_balance(&self) -> GridResult<Decimal> {
        let adapter = self.adapter.lock().await;
        Ok(adapter.asset_balance(&self.base_asset).await?)
    }

    /// Startup gate: the run must not begin with less than the minimum
    /// reserve of the base asset.
    pub async fn verify_startup_reserve(&self) -> GridResult<()> {
        let required = self.required_reserve();
        let balance = self.current_balance().await?;
        if balance < required {
            return Err(GridError::Reserve(format!(
                "{} balance {} is below the minimum reserve {}",
                self.base_asset, balance, required
            )));
        }
        info!(
            asset = %self.base_asset,
            balance = %balance,
            min_reserve = %required,
            "Startup reserve check passed"
        );
        Ok(())
    }
}

// ============================================================================
// Monitor
// ============================================================================

/// Lifecycle surface the orchestrator depends on for reserve monitoring.
#[async_trait]
pub trait ReserveMonitor: Send + Sync {
    async fn start(&self) -> GridResult<()>;

    /// Stop the background check task. Idempotent.
    async fn stop(&self) -> GridResult<()>;
}

/// Periodic reserve re-check running as a background task.
pub struct SpotReserveMonitor<A: ExchangeAdapter> {
    manager: Arc<SpotReserveManager<A>>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<A: ExchangeAdapter + 'static> SpotReserveMonitor<A> {
    pub fn new(manager: SpotReserveManager<A>) -> Self {
        Self {
            manager: Arc::new(manager),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    async fn check_loop(manager: Arc<SpotReserveManager<A>>, cancel: CancellationToken) {
        let interval = manager.check_interval();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Reserve monitor stopping");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }

            match manager.current_balance().await {
                Ok(balance) if balance < manager.required_reserve() => {
                    warn!(
                        balance = %balance,
                        min_reserve = %manager.required_reserve(),
                        "Reserve below minimum"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    error!(error = %err, "Reserve check failed");
                }
            }
        }
    }
}

#[async_trait]
impl<A: ExchangeAdapter + 'static> ReserveMonitor for SpotReserveMonitor<A> {
    async fn start(&self) -> GridResult<()> {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return Err(GridError::AlreadyRunning);
        }
        let manager = self.manager.clone();
        let cancel = self.cancel.clone();
        *handle = Some(tokio::spawn(Self::check_loop(manager, cancel)));
        info!(
            interval_secs = self.manager.check_interval().as_secs(),
            "Reserve monitor started"
        );
        Ok(())
    }

    async fn stop(&self) -> GridResult<()> {
        self.cancel.cancel();
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
        Ok(())
    }
}
