//! Lighter exchange adapter
//!
//! Perpetual-only venue. Margin mode and leverage must be configured on the
//! venue web app before starting a grid; the config values are reference
//! only and never pushed from here.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::ExchangeAdapter;
use crate::adapters::types::{ExchangeConfig, MarketType};

const MAINNET_API_URL: &str = "https://mainnet.zklighter.elliot.ai";
const TESTNET_API_URL: &str = "https://testnet.zklighter.elliot.ai";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LighterAdapter {
    config: ExchangeConfig,
    client: reqwest::Client,
    connected: bool,
}

impl LighterAdapter {
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
}

#[async_trait]
impl ExchangeAdapter for LighterAdapter {
    async fn connect(&mut self) -> ExchangeResult<()> {
        let response = self
            .client
            .get(format!("{}/api/v1/status", self.api_url()))
            .send()
            .await
            .map_err(|e| ExchangeError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExchangeError::ConnectionFailed(format!(
                "status endpoint returned {}",
                response.status()
            )));
        }

        self.connected = true;
        info!(testnet = self.config.testnet, "Lighter session established");
        Ok(())
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        self.connected = false;
        debug!("Lighter session closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn exchange_name(&self) -> &'static str {
        "lighter"
    }

    fn market_type(&self) -> MarketType {
        // Single product type on this venue
        MarketType::Perpetual
    }

    async fn current_price(&self, symbol: &str) -> ExchangeResult<Decimal> {
        if !self.connected {
            return Err(ExchangeError::NotConnected);
        }

        let stats: serde_json::Value = self
            .client
            .get(format!("{}/api/v1/exchangeStats", self.api_url()))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let markets = stats
            .get("order_book_stats")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                ExchangeError::InvalidResponse("exchangeStats: missing order_book_stats".into())
            })?;

        for market in markets {
            let name = market.get("symbol").and_then(|v| v.as_str()).unwrap_or("");
            if name.eq_ignore_ascii_case(symbol) {
                let raw = market
                    .get("last_trade_price")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ExchangeError::InvalidResponse("missing last_trade_price".into())
                    })?;
                return Decimal::from_str(raw).map_err(|e| {
                    ExchangeError::InvalidResponse(format!("last_trade_price '{}': {}", raw, e))
                });
            }
        }

        Err(ExchangeError::InvalidResponse(format!(
            "no market stats for '{}'",
            symbol
        )))
    }

    async fn asset_balance(&self, _asset: &str) -> ExchangeResult<Decimal> {
        // Perpetual-only venue: no spot balances exist, and the reserve
        // manager is never constructed for perpetual markets.
        Err(ExchangeError::InvalidResponse(
            "spot balances are not available on a perpetual-only venue".to_string(),
        ))
    }
}
