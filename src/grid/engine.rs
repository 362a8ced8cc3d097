//! Grid strategy, engine and position tracker
//!
//! These collaborators are sequenced by the startup sequencer in strict
//! order: strategy, then engine (bound to the live connection handle), then
//! tracker (bound to configuration and a fresh grid state). Their trading
//! internals are deliberately thin here; the lifecycle layer only depends
//! on their construction and on the engine's price refresh.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::adapters::ExchangeAdapter;
use crate::config::{GridConfig, GridRange};
use crate::grid::state::GridState;
use crate::grid::GridResult;

// ============================================================================
// Strategy
// ============================================================================

/// Computes the grid ladder from the configured range.
#[derive(Debug, Default)]
pub struct GridStrategy;

impl GridStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Ladder prices for a fixed range, inclusive of both bounds, rounded
    /// to the configured price precision. Follow grids anchor their window
    /// at runtime and return an empty ladder here.
    pub fn grid_levels(&self, config: &GridConfig) -> Vec<Decimal> {
        match &config.range {
            GridRange::Fixed {
                lower_price,
                upper_price,
            } => {
                let mut levels = Vec::new();
                let mut price = *lower_price;
                while price <= *upper_price {
                    levels.push(price.round_dp(config.price_decimals));
                    price += config.grid_interval;
                }
                levels
            }
            GridRange::Follow { .. } => Vec::new(),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Order plumbing bound to the exchange connection handle.
pub struct GridEngine<A: ExchangeAdapter> {
    adapter: Arc<Mutex<A>>,
    session_id: Uuid,
}

impl<A: ExchangeAdapter> GridEngine<A> {
    pub fn new(adapter: Arc<Mutex<A>>) -> Self {
        Self {
            adapter,
            session_id: Uuid::new_v4(),
        }
    }

    /// Client order ids for this run are prefixed with the session id so
    /// stale orders from a previous run are distinguishable on the venue.
    pub fn client_order_id(&self, grid_index: usize) -> String {
        format!("grid-{}-{}", self.session_id.simple(), grid_index)
    }

    /// Pull the latest traded price into the shared state.
    pub async fn refresh_price(&self, symbol: &str, state: &GridState) -> GridResult<Decimal> {
        let price = {
            let adapter = self.adapter.lock().await;
            adapter.current_price(symbol).await?
        };
        state.set_current_price(price);
        debug!(symbol = symbol, price = %price, "Price refreshed");
        Ok(price)
    }
}

// ============================================================================
// Position tracker
// ============================================================================

/// Position bookkeeping bound to the configuration and the shared state.
pub struct PositionTracker {
    config: GridConfig,
    state: GridState,
}

impl PositionTracker {
    pub fn new(config: GridConfig, state: GridState) -> Self {
        Self { config, state }
    }

    pub fn record_fill(&self, price: Decimal, quantity: Decimal) {
        let quantity = quantity.round_dp(self.config.quantity_precision);
        self.state.record_fill(price, quantity);
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }
}
