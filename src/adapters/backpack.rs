//! Backpack exchange adapter
//!
//! Session bootstrap over the public REST API. Symbols follow Backpack's
//! underscore convention (`SOL_USDC`, `SOL_PERP`).

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::ExchangeAdapter;
use crate::adapters::types::{ExchangeConfig, MarketType};

const API_URL: &str = "https://api.backpack.exchange";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BackpackAdapter {
    config: ExchangeConfig,
    client: reqwest::Client,
    connected: bool,
}

impl BackpackAdapter {
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

    /// `SOL_USDC_SPOT` → `SOL_USDC`; plain symbols pass through. The
    /// explicit `_SPOT` marker only exists in grid configs, not on the wire.
    fn wire_symbol(symbol: &str) -> String {
        symbol
            .strip_suffix("_SPOT")
            .unwrap_or(symbol)
            .to_string()
    }
}

#[async_trait]
impl ExchangeAdapter for BackpackAdapter {
    async fn connect(&mut self) -> ExchangeResult<()> {
        let response = self
            .client
            .get(format!("{}/api/v1/status", API_URL))
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
        info!(
            market_type = %self.config.market_type,
            "Backpack session established"
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        self.connected = false;
        debug!("Backpack session closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn exchange_name(&self) -> &'static str {
        "backpack"
    }

    fn market_type(&self) -> MarketType {
        self.config.market_type
    }

    async fn current_price(&self, symbol: &str) -> ExchangeResult<Decimal> {
        if !self.connected {
            return Err(ExchangeError::NotConnected);
        }

        let ticker: serde_json::Value = self
            .client
            .get(format!("{}/api/v1/ticker", API_URL))
            .query(&[("symbol", Self::wire_symbol(symbol))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let raw = ticker
            .get("lastPrice")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ExchangeError::InvalidResponse("ticker: missing lastPrice".into()))?;

        Decimal::from_str(raw)
            .map_err(|e| ExchangeError::InvalidResponse(format!("lastPrice '{}': {}", raw, e)))
    }

    async fn asset_balance(&self, asset: &str) -> ExchangeResult<Decimal> {
        if !self.connected {
            return Err(ExchangeError::NotConnected);
        }

        if self.config.credentials.api_key.is_empty() {
            return Err(ExchangeError::InvalidResponse(
                "balance query requires an API key".to_string(),
            ));
        }

        let capital: serde_json::Value = self
            .client
            .get(format!("{}/api/v1/capital", API_URL))
            .header("X-API-Key", &self.config.credentials.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let entry = match capital.get(asset.to_uppercase()) {
            Some(v) => v,
            None => return Ok(Decimal::ZERO),
        };

        let raw = entry
            .get("available")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ExchangeError::InvalidResponse("capital: missing available".into()))?;

        Decimal::from_str(raw)
            .map_err(|e| ExchangeError::InvalidResponse(format!("available '{}': {}", raw, e)))
    }
}
