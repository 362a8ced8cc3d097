//! Adapter factory for dynamic exchange selection
//!
//! Creates `ExchangeAdapter` instances from the configured exchange id.
//! Uses an enum-based dispatch pattern (no `Box<dyn>`) to preserve
//! monomorphization.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapters::backpack::BackpackAdapter;
use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::hyperliquid::HyperliquidAdapter;
use crate::adapters::lighter::LighterAdapter;
use crate::adapters::traits::ExchangeAdapter;
use crate::adapters::types::{ExchangeConfig, MarketType};

// =============================================================================
// AnyAdapter — enum-based dispatch for dynamic exchange selection
// =============================================================================

/// Enum wrapping all concrete adapter types for runtime dispatch.
pub enum AnyAdapter {
    Hyperliquid(HyperliquidAdapter),
    Backpack(BackpackAdapter),
    Lighter(LighterAdapter),
}

/// Macro to reduce boilerplate for delegating trait methods
macro_rules! delegate {
    ($self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            AnyAdapter::Hyperliquid(a) => a.$method($($arg),*),
            AnyAdapter::Backpack(a) => a.$method($($arg),*),
            AnyAdapter::Lighter(a) => a.$method($($arg),*),
        }
    };
    (await $self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            AnyAdapter::Hyperliquid(a) => a.$method($($arg),*).await,
            AnyAdapter::Backpack(a) => a.$method($($arg),*).await,
            AnyAdapter::Lighter(a) => a.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl ExchangeAdapter for AnyAdapter {
    async fn connect(&mut self) -> ExchangeResult<()> {
        delegate!(await self, connect())
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        delegate!(await self, disconnect())
    }

    fn is_connected(&self) -> bool {
        delegate!(self, is_connected())
    }

    fn exchange_name(&self) -> &'static str {
        delegate!(self, exchange_name())
    }

    fn market_type(&self) -> MarketType {
        delegate!(self, market_type())
    }

    async fn current_price(&self, symbol: &str) -> ExchangeResult<Decimal> {
        delegate!(await self, current_price(symbol))
    }

    async fn asset_balance(&self, asset: &str) -> ExchangeResult<Decimal> {
        delegate!(await self, asset_balance(asset))
    }
}

// =============================================================================
// Factory Functions
// =============================================================================

/// All supported exchange adapter names.
pub const SUPPORTED_EXCHANGES: &[&str] = &["hyperliquid", "backpack", "lighter"];

/// Create an adapter from the connection configuration.
///
/// The adapter is created but NOT connected — call `connect()` after.
pub fn create_adapter(config: ExchangeConfig) -> ExchangeResult<AnyAdapter> {
    match config.exchange_id.as_str() {
        "hyperliquid" => Ok(AnyAdapter::Hyperliquid(HyperliquidAdapter::new(config))),
        "backpack" => Ok(AnyAdapter::Backpack(BackpackAdapter::new(config))),
        "lighter" => Ok(AnyAdapter::Lighter(LighterAdapter::new(config))),
        other => Err(ExchangeError::Unsupported(format!(
            "'{}'. Supported: {}",
            other,
            SUPPORTED_EXCHANGES.join(", ")
        ))),
    }
}
