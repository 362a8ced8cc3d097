//! Shared adapter types: market type resolution and connection configuration

use serde::{Deserialize, Serialize};

use crate::config::Credentials;

// ============================================================================
// Market type
// ============================================================================

/// Product type of the configured market
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Spot,
    Perpetual,
}

impl std::fmt::Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketType::Spot => write!(f, "spot"),
            MarketType::Perpetual => write!(f, "perpetual"),
        }
    }
}

/// Resolve the market type from (symbol, exchange).
///
/// Pure, total lookup over string patterns — downstream validation
/// (rejecting short grids on spot markets) depends on this being correct
/// for every supported venue:
/// - hyperliquid: `:SPOT` tag is spot; `:USDC`/`:PERP` tags are perpetual;
///   an untagged symbol is spot;
/// - backpack: a `PERP` marker is perpetual, a `SPOT` marker is spot,
///   no marker defaults to perpetual;
/// - lighter: perpetual only;
/// - any other venue: perpetual.
pub fn detect_market_type(symbol: &str, exchange_name: &str) -> MarketType {
    let symbol_upper = symbol.to_uppercase();
    let exchange_lower = exchange_name.to_lowercase();

    match exchange_lower.as_str() {
        "hyperliquid" => {
            if symbol_upper.contains(":SPOT") {
                MarketType::Spot
            } else if symbol_upper.contains(":USDC") || symbol_upper.contains(":PERP") {
                MarketType::Perpetual
            } else {
                MarketType::Spot
            }
        }
        "backpack" => {
            if symbol_upper.contains("PERP") {
                MarketType::Perpetual
            } else if symbol_upper.contains("SPOT") {
                MarketType::Spot
            } else {
                MarketType::Perpetual
            }
        }
        "lighter" => MarketType::Perpetual,
        _ => MarketType::Perpetual,
    }
}

// ============================================================================
// Connection configuration
// ============================================================================

/// Exchange connection configuration consumed by the adapter factory.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Lowercase exchange identifier ("hyperliquid", "backpack", "lighter")
    pub exchange_id: String,
    /// Display name
    pub name: String,
    pub market_type: MarketType,
    pub credentials: Credentials,
    pub testnet: bool,
    pub enable_websocket: bool,
    pub enable_auto_reconnect: bool,
}

impl ExchangeConfig {
    pub fn new(
        exchange_id: impl Into<String>,
        market_type: MarketType,
        credentials: Credentials,
        testnet: bool,
    ) -> Self {
        let exchange_id = exchange_id.into().to_lowercase();
        let name = capitalize(&exchange_id);
        Self {
            exchange_id,
            name,
            market_type,
            credentials,
            testnet,
            enable_websocket: true,
            enable_auto_reconnect: true,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
