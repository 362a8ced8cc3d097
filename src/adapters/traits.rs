//! Exchange adapter trait definition
//!
//! `ExchangeAdapter` is the connection-handle seam between the lifecycle
//! orchestrator and venue connectivity. The daemon owns exactly one handle
//! per run: created by the startup sequencer, disconnected exactly once by
//! the cleanup sequencer. Order placement and streaming internals belong to
//! the engine and are not part of this interface.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::types::MarketType;

/// Common trait for all exchange adapters
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Establish the venue session. Called once by the startup sequencer;
    /// failure is fatal to startup.
    async fn connect(&mut self) -> ExchangeResult<()>;

    /// Gracefully close the venue session. Called exactly once by the
    /// cleanup sequencer for every successful `connect`, regardless of how
    /// the run terminates.
    async fn disconnect(&mut self) -> ExchangeResult<()>;

    /// Whether the adapter currently holds a live session
    fn is_connected(&self) -> bool;

    /// Static exchange identifier ("hyperliquid", "backpack", "lighter")
    fn exchange_name(&self) -> &'static str;

    /// Product type this connection was configured for
    fn market_type(&self) -> MarketType;

    /// Latest traded price for a symbol
    async fn current_price(&self, symbol: &str) -> ExchangeResult<Decimal>;

    /// Available balance of an asset, used by the spot reserve manager
    async fn asset_balance(&self, asset: &str) -> ExchangeResult<Decimal>;
}
