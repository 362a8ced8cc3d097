//! Exchange adapters
//!
//! Connection handles for the supported venues, created through an
//! enum-dispatch factory keyed by the configured exchange id. The lifecycle
//! orchestrator owns exactly one connected adapter per run.

pub mod backpack;
pub mod errors;
pub mod factory;
pub mod hyperliquid;
pub mod lighter;
pub mod traits;
pub mod types;

pub use backpack::BackpackAdapter;
pub use errors::{ExchangeError, ExchangeResult};
pub use factory::{create_adapter, AnyAdapter, SUPPORTED_EXCHANGES};
pub use hyperliquid::HyperliquidAdapter;
pub use lighter::LighterAdapter;
pub use traits::ExchangeAdapter;
pub use types::{detect_market_type, ExchangeConfig, MarketType};
