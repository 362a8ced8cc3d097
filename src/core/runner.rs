//! Daemon startup sequencer
//!
//! Drives the run through an explicit phase machine: validate, connect,
//! build components, build coordinator, prestart checks, running. Any
//! failure latches the `Failed` phase and aborts the run; whatever was
//! already brought up is torn down through the cleanup sequencer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::adapters::{
    create_adapter, detect_market_type, AnyAdapter, ExchangeAdapter, ExchangeConfig, MarketType,
};
use crate::config::{ExchangeSettings, GridConfig};
use crate::core::cleanup::{run_cleanup, StatsHandle};
use crate::core::shutdown::ShutdownSignal;
use crate::core::stats::statistics_task;
use crate::error::{AppError, Result};
use crate::grid::{
    Coordinator, GridCoordinator, GridEngine, GridState, GridStrategy, PositionTracker,
    ReserveMonitor, SpotReserveManager, SpotReserveMonitor,
};

/// Startup phases, in strict order. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    ConfigLoaded,
    Validated,
    Connected,
    ComponentsBuilt,
    CoordinatorBuilt,
    PrestartChecked,
    Running,
    Failed,
}

struct Components {
    state: GridState,
    strategy: GridStrategy,
    engine: GridEngine<AnyAdapter>,
    tracker: PositionTracker,
}

/// The unattended grid daemon for a single exchange connection.
pub struct GridDaemon {
    config: GridConfig,
    settings: ExchangeSettings,
    phase: StartupPhase,
    market_type: Option<MarketType>,
    adapter: Option<Arc<Mutex<AnyAdapter>>>,
    components: Option<Components>,
    coordinator: Option<Arc<GridCoordinator<AnyAdapter>>>,
    reserve_manager: Option<SpotReserveManager<AnyAdapter>>,
    reserve_monitor: Option<Arc<SpotReserveMonitor<AnyAdapter>>>,
    running: Arc<AtomicBool>,
}

impl GridDaemon {
    pub fn new(config: GridConfig, settings: ExchangeSettings) -> Self {
        Self {
            config,
            settings,
            phase: StartupPhase::ConfigLoaded,
            market_type: None,
            adapter: None,
            components: None,
            coordinator: None,
            reserve_manager: None,
            reserve_monitor: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn phase(&self) -> StartupPhase {
        self.phase
    }

    fn fail<T>(&mut self, err: AppError) -> Result<T> {
        self.phase = StartupPhase::Failed;
        Err(err)
    }

    /// Step 1: semantic validation after config translation, before any
    /// network activity. Resolves the market type and rejects short grids
    /// on spot markets.
    pub fn validate(&mut self) -> Result<()> {
        if let Err(err) = self.config.validate() {
            return self.fail(err);
        }

        let market_type = detect_market_type(&self.config.symbol, &self.config.exchange);
        if market_type == MarketType::Spot && self.config.grid_type.is_short() {
            return self.fail(AppError::ConfigValidation(format!(
                "Grid type '{}' is not available on spot market {}",
                self.config.grid_type, self.config.symbol
            )));
        }

        if !self.settings.credentials.is_complete() {
            warn!(
                exchange = %self.config.exchange,
                "Credentials incomplete, private endpoints will be unavailable"
            );
        }

        self.market_type = Some(market_type);
        self.phase = StartupPhase::Validated;
        info!(
            exchange = %self.config.exchange,
            symbol = %self.config.symbol,
            market_type = %market_type,
            grid_type = self.config.grid_type.as_str(),
            "Configuration validated"
        );
        Ok(())
    }

    /// Step 2: create the adapter for the configured venue and connect.
    /// An unsupported exchange aborts before any connection attempt.
    pub async fn connect(&mut self) -> Result<()> {
        debug_assert_eq!(self.phase, StartupPhase::Validated);
        let market_type = self.market_type.unwrap_or(MarketType::Perpetual);

        let exchange_config = ExchangeConfig::new(
            &self.config.exchange,
            market_type,
            self.settings.credentials.clone(),
            self.settings.testnet,
        );

        let mut adapter = match create_adapter(exchange_config) {
            Ok(adapter) => adapter,
            Err(err) => return self.fail(err.into()),
        };

        if let Err(err) = adapter.connect().await {
            return self.fail(err.into());
        }

        info!(exchange = adapter.exchange_name(), "Exchange connected");
        self.adapter = Some(Arc::new(Mutex::new(adapter)));
        self.phase = StartupPhase::Connected;
        Ok(())
    }

    /// Step 3: build the grid collaborators in order — state, strategy,
    /// engine, tracker.
    pub fn build_components(&mut self) -> Result<()> {
        debug_assert_eq!(self.phase, StartupPhase::Connected);
        let adapter = match &self.adapter {
            Some(adapter) => adapter.clone(),
            None => {
                return self.fail(AppError::ConfigValidation(
                    "Components requested before a connection was established".to_string(),
                ))
            }
        };

        let state = GridState::new();
        let strategy = GridStrategy::new();
        let engine = GridEngine::new(adapter);
        let tracker = PositionTracker::new(self.config.clone(), state.clone());

        self.components = Some(Components {
            state,
            strategy,
            engine,
            tracker,
        });
        self.phase = StartupPhase::ComponentsBuilt;
        info!("Grid components built");
        Ok(())
    }

    /// Step 4: bind everything into the coordinator.
    pub fn build_coordinator(&mut self) -> Result<()> {
        debug_assert_eq!(self.phase, StartupPhase::ComponentsBuilt);
        let components = match self.components.take() {
            Some(c) => c,
            None => {
                return self.fail(AppError::ConfigValidation(
                    "Coordinator requested before components were built".to_string(),
                ))
            }
        };

        self.coordinator = Some(Arc::new(GridCoordinator::new(
            self.config.clone(),
            components.strategy,
            components.engine,
            components.tracker,
            components.state,
        )));
        self.phase = StartupPhase::CoordinatorBuilt;
        info!("Grid coordinator built");
        Ok(())
    }

    /// Step 5: prestart checks. Spot grids with a reserve policy must hold
    /// the minimum base-asset balance; a failed check disconnects the
    /// adapter and aborts the run.
    pub async fn prestart_checks(&mut self) -> Result<()> {
        debug_assert_eq!(self.phase, StartupPhase::CoordinatorBuilt);

        let reserve = match (&self.market_type, &self.config.spot_reserve) {
            (Some(MarketType::Spot), Some(reserve)) if reserve.enabled => Some(reserve.clone()),
            _ => None,
        };

        if let Some(reserve) = reserve {
            let adapter = self
                .adapter
                .clone()
                .expect("adapter exists past the Connected phase");
            let manager = SpotReserveManager::new(adapter.clone(), &self.config, reserve);

            if let Err(err) = manager.verify_startup_reserve().await {
                let message = err.to_string();
                let mut adapter = adapter.lock().await;
                if let Err(disc_err) = adapter.disconnect().await {
                    warn!(error = %disc_err, "Disconnect after failed reserve check also failed");
                }
                drop(adapter);
                return self.fail(AppError::ReserveCheck(message));
            }
            self.reserve_manager = Some(manager);
        }

        self.phase = StartupPhase::PrestartChecked;
        Ok(())
    }

    /// Step 6: start the coordinator and the reserve monitor.
    pub async fn start(&mut self) -> Result<()> {
        debug_assert_eq!(self.phase, StartupPhase::PrestartChecked);
        let coordinator = self
            .coordinator
            .clone()
            .expect("coordinator exists past the CoordinatorBuilt phase");

        if let Err(err) = coordinator.start().await {
            return self.fail(err.into());
        }

        if let Some(manager) = self.reserve_manager.take() {
            let monitor = Arc::new(SpotReserveMonitor::new(manager));
            if let Err(err) = monitor.start().await {
                return self.fail(err.into());
            }
            self.reserve_monitor = Some(monitor);
        }

        self.running.store(true, Ordering::SeqCst);
        self.phase = StartupPhase::Running;
        info!(
            exchange = %self.config.exchange,
            symbol = %self.config.symbol,
            "Grid daemon running"
        );
        Ok(())
    }

    async fn teardown(&mut self, stats: Option<StatsHandle>) -> usize {
        run_cleanup(
            &self.running,
            stats,
            self.coordinator.clone(),
            self.reserve_monitor.clone(),
            self.adapter.clone(),
        )
        .await
    }

    /// Run the daemon end to end: all startup steps, the statistics
    /// reporter, then wait for shutdown. Teardown runs on every exit path
    /// that got past the connection step.
    pub async fn run(
        &mut self,
        shutdown: ShutdownSignal,
        stats_interval: Duration,
    ) -> Result<()> {
        self.validate()?;
        self.connect().await?;

        if let Err(err) = self.startup_past_connect().await {
            self.phase = StartupPhase::Failed;
            self.teardown(None).await;
            return Err(err);
        }

        let stats = {
            let coordinator = self
                .coordinator
                .clone()
                .expect("coordinator exists in the Running phase");
            let cancel = shutdown.child_token();
            let handle = tokio::spawn(statistics_task(
                coordinator,
                self.running.clone(),
                stats_interval,
                cancel.clone(),
            ));
            StatsHandle { cancel, handle }
        };

        shutdown.cancelled().await;

        // Teardown failures are logged per step inside the sequencer; a
        // requested shutdown still counts as a clean exit.
        self.teardown(Some(stats)).await;
        Ok(())
    }

    async fn startup_past_connect(&mut self) -> Result<()> {
        self.build_components()?;
        self.build_coordinator()?;
        self.prestart_checks().await?;
        self.start().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Credentials, GridRange, GridType, HealthCheckConfig, SpotReserveConfig,
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn settings() -> ExchangeSettings {
        ExchangeSettings {
            credentials: Credentials::default(),
            testnet: false,
        }
    }

    fn config(exchange: &str, symbol: &str, grid_type: GridType) -> GridConfig {
        GridConfig {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            grid_type,
            range: GridRange::Fixed {
                lower_price: dec("100"),
                upper_price: dec("110"),
            },
            grid_interval: dec("1"),
            order_amount: dec("0.5"),
            max_position: None,
            fee_rate: dec("0.0001"),
            quantity_precision: 3,
            price_decimals: 2,
            enable_notifications: false,
            rest_position_query_interval_secs: 1,
            reverse_order_grid_distance: None,
            exit_cleanup_enabled: false,
            margin_mode: None,
            leverage: None,
            martingale: None,
            scalping: None,
            smart_scalping: None,
            capital_protection: None,
            take_profit: None,
            price_lock: None,
            stop_loss: None,
            spot_reserve: Some(SpotReserveConfig {
                enabled: true,
                min_reserve: Some(dec("1")),
                check_interval_secs: 60,
            }),
            health_check: HealthCheckConfig::default(),
        }
    }

    #[test]
    fn test_short_grid_on_spot_market_is_rejected_before_connect() {
        let mut daemon = GridDaemon::new(
            config("hyperliquid", "HYPE:SPOT", GridType::Short),
            settings(),
        );
        match daemon.validate() {
            Err(AppError::ConfigValidation(msg)) => {
                assert!(msg.contains("spot"), "Got: {}", msg);
            }
            other => panic!("expected ConfigValidation, got {:?}", other.err()),
        }
        assert_eq!(daemon.phase(), StartupPhase::Failed);
        assert!(daemon.adapter.is_none());
    }

    #[test]
    fn test_short_grid_on_perpetual_market_is_allowed() {
        let mut daemon = GridDaemon::new(
            config("backpack", "SOL_USDC_PERP", GridType::Short),
            settings(),
        );
        daemon.validate().unwrap();
        assert_eq!(daemon.phase(), StartupPhase::Validated);
        assert_eq!(daemon.market_type, Some(MarketType::Perpetual));
    }

    #[tokio::test]
    async fn test_unsupported_exchange_fails_before_components() {
        let mut daemon = GridDaemon::new(config("binance", "BTCUSDT", GridType::Long), settings());
        daemon.validate().unwrap();
        assert_eq!(daemon.phase(), StartupPhase::Validated);

        let err = daemon.connect().await.unwrap_err();
        match err {
            AppError::Exchange(_) => {}
            other => panic!("expected Exchange error, got {}", other),
        }
        assert_eq!(daemon.phase(), StartupPhase::Failed);
        assert!(daemon.adapter.is_none());
        assert!(daemon.coordinator.is_none());
    }

    #[test]
    fn test_invalid_config_fails_validation() {
        let mut bad = config("backpack", "", GridType::Long);
        bad.symbol = String::new();
        let mut daemon = GridDaemon::new(bad, settings());
        assert!(daemon.validate().is_err());
        assert_eq!(daemon.phase(), StartupPhase::Failed);
    }
}
