//! Hyperliquid exchange adapter
//!
//! Session bootstrap over the public REST API. Supports both spot and
//! perpetual symbols; `:SPOT` / `:USDC` / `:PERP` tags in the configured
//! symbol select the product (see `detect_market_type`).

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::ExchangeAdapter;
use crate::adapters::types::{ExchangeConfig, MarketType};

const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";
const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HyperliquidAdapter {
    config: ExchangeConfig,
    client: reqwest::Client,
    connected: bool,
}

impl HyperliquidAdapter {
    pub fn new(config: ExchangeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            config,
            client,
            connected: false,
        }
    }

    fn api_url(&self) -> &'static str {
        if self.config.testnet {
            TESTNET_API_URL
        } else {
            MAINNET_API_URL
        }
    }

    async fn info_request(&self, body: serde_json::Value) -> ExchangeResult<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}/info", self.api_url()))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// `BTC:SPOT` → `BTC`; untagged symbols pass through.
    fn coin(symbol: &str) -> &str {
        symbol.split(':').next().unwrap_or(symbol)
    }
}

#[async_trait]
impl ExchangeAdapter for HyperliquidAdapter {
    async fn connect(&mut self) -> ExchangeResult<()> {
        // Exchange metadata doubles as a reachability probe.
        self.info_request(json!({"type": "meta"}))
            .await
            .map_err(|e| ExchangeError::ConnectionFailed(e.to_string()))?;

        self.connected = true;
        info!(
            market_type = %self.config.market_type,
            testnet = self.config.testnet,
            "Hyperliquid session established"
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        self.connected = false;
        debug!("Hyperliquid session closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn exchange_name(&self) -> &'static str {
        "hyperliquid"
    }

    fn market_type(&self) -> MarketType {
        self.config.market_type
    }

    async fn current_price(&self, symbol: &str) -> ExchangeResult<Decimal> {
        if !self.connected {
            return Err(ExchangeError::NotConnected);
        }

        let mids: HashMap<String, String> = serde_json::from_value(
            self.info_request(json!({"type": "allMids"})).await?,
        )
        .map_err(|e| ExchangeError::InvalidResponse(format!("allMids: {}", e)))?;

        let coin = Self::coin(symbol);
        let raw = mids
            .get(coin)
            .ok_or_else(|| ExchangeError::InvalidResponse(format!("no mid for '{}'", coin)))?;

        Decimal::from_str(raw)
            .map_err(|e| ExchangeError::InvalidResponse(format!("mid '{}': {}", raw, e)))
    }

    async fn asset_balance(&self, asset: &str) -> ExchangeResult<Decimal> {
        if !self.connected {
            return Err(ExchangeError::NotConnected);
        }

        let wallet = self
            .config
            .credentials
            .wallet_address
            .as_deref()
            .ok_or_else(|| {
                ExchangeError::InvalidResponse(
                    "wallet_address required for balance queries".to_string(),
                )
            })?;

        let state = self
            .info_request(json!({"type": "spotClearinghouseState", "user": wallet}))
            .await?;

        let balances = state
            .get("balances")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                ExchangeError::InvalidResponse("spotClearinghouseState: missing balances".into())
            })?;

        for entry in balances {
            let coin = entry.get("coin").and_then(|v| v.as_str()).unwrap_or("");
            if coin.eq_ignore_ascii_case(asset) {
                let total = entry.get("total").and_then(|v| v.as_str()).unwrap_or("0");
                return Decimal::from_str(total).map_err(|e| {
                    ExchangeError::InvalidResponse(format!("balance '{}': {}", total, e))
                });
            }
        }

        Ok(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    fn adapter(testnet: bool) -> HyperliquidAdapter {
        HyperliquidAdapter::new(ExchangeConfig::new(
            "hyperliquid",
            MarketType::Spot,
            Credentials::default(),
            testnet,
        ))
    }

    #[test]
    fn test_starts_disconnected() {
        let a = adapter(false);
        assert!(!a.is_connected());
        assert_eq!(a.exchange_name(), "hyperliquid");
        assert_eq!(a.market_type(), MarketType::Spot);
    }

    #[test]
    fn test_testnet_flag_selects_endpoint() {
        assert_eq!(adapter(false).api_url(), MAINNET_API_URL);
        assert_eq!(adapter(true).api_url(), TESTNET_API_URL);
    }

    #[test]
    fn test_coin_strips_product_tag() {
        assert_eq!(HyperliquidAdapter::coin("BTC:SPOT"), "BTC");
        assert_eq!(HyperliquidAdapter::coin("ETH:USDC"), "ETH");
        assert_eq!(HyperliquidAdapter::coin("PURR"), "PURR");
    }

    #[tokio::test]
    async fn test_price_requires_connection() {
        let a = adapter(false);
        let result = a.current_price("BTC:SPOT").await;
        assert!(matches!(result, Err(ExchangeError::NotConnected)));
    }
}
