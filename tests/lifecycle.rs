//! End-to-end lifecycle tests exercising the public crate surface:
//! config translation, market resolution, and the staged startup machine's
//! fail-fast behavior. Nothing here touches the network.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use gridbot::adapters::{detect_market_type, MarketType};
use gridbot::config::{
    load_config_from_str, Credentials, ExchangeSettings, GridRange, GridType,
};
use gridbot::core::{GridDaemon, ShutdownSignal, StartupPhase};
use gridbot::AppError;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn settings() -> ExchangeSettings {
    ExchangeSettings {
        credentials: Credentials::default(),
        testnet: false,
    }
}

// ============================================================================
// Config translation
// ============================================================================

#[test]
fn test_fixed_long_grid_translates_end_to_end() {
    let yaml = r#"
grid_system:
  exchange: Backpack
  symbol: SOL_USDC
  grid_type: long
  price_range:
    lower_price: 100.0
    upper_price: 140.0
  grid_interval: 2.0
  order_amount: 0.5
  leverage: 5
"#;
    let config = load_config_from_str(yaml).unwrap();
    assert_eq!(config.exchange, "backpack");
    assert_eq!(config.grid_type, GridType::Long);
    match config.range {
        GridRange::Fixed {
            lower_price,
            upper_price,
        } => {
            assert_eq!(lower_price, dec("100"));
            assert_eq!(upper_price, dec("140"));
        }
        other => panic!("expected fixed range, got {:?}", other),
    }
    assert_eq!(config.grid_interval, dec("2"));
    assert_eq!(config.leverage, Some(5));
    // Supplemented defaults
    assert_eq!(config.fee_rate, dec("0.0001"));
    assert_eq!(config.quantity_precision, 3);
}

#[test]
fn test_follow_grid_needs_no_price_range() {
    let yaml = r#"
grid_system:
  exchange: lighter
  symbol: ETH
  grid_type: follow_long
  follow_grid_count: 20
  grid_interval: 5.0
  order_amount: 0.1
"#;
    let config = load_config_from_str(yaml).unwrap();
    match config.range {
        GridRange::Follow {
            grid_count,
            timeout_secs,
            distance,
            ..
        } => {
            assert_eq!(grid_count, 20);
            assert_eq!(timeout_secs, 300);
            assert_eq!(distance, 1);
        }
        other => panic!("expected follow range, got {:?}", other),
    }
}

#[test]
fn test_fixed_grid_without_range_is_rejected() {
    let yaml = r#"
grid_system:
  exchange: backpack
  symbol: SOL_USDC
  grid_type: long
  grid_interval: 2.0
  order_amount: 0.5
"#;
    match load_config_from_str(yaml) {
        Err(AppError::ConfigValidation(msg)) => {
            assert!(msg.contains("price_range"), "Got: {}", msg);
        }
        other => panic!("expected ConfigValidation, got {:?}", other.err()),
    }
}

#[test]
fn test_unknown_grid_type_tag_is_rejected() {
    let yaml = r#"
grid_system:
  exchange: backpack
  symbol: SOL_USDC
  grid_type: diagonal
  grid_interval: 2.0
  order_amount: 0.5
"#;
    assert!(matches!(
        load_config_from_str(yaml),
        Err(AppError::ConfigValidation(_))
    ));
}

// ============================================================================
// Market resolution
// ============================================================================

#[test]
fn test_market_resolution_table() {
    let cases = [
        ("BTC:USDC", "hyperliquid", MarketType::Perpetual),
        ("HYPE:SPOT", "hyperliquid", MarketType::Spot),
        ("PURR", "hyperliquid", MarketType::Spot),
        ("SOL_PERP", "backpack", MarketType::Perpetual),
        ("SOL_USDC_SPOT", "backpack", MarketType::Spot),
        ("SOL_USDC", "backpack", MarketType::Perpetual),
        ("BTC:SPOT", "lighter", MarketType::Perpetual),
        ("ANYTHING", "unknown-venue", MarketType::Perpetual),
    ];
    for (symbol, exchange, expected) in cases {
        assert_eq!(
            detect_market_type(symbol, exchange),
            expected,
            "{} on {}",
            symbol,
            exchange
        );
    }
}

// ============================================================================
// Fail-fast startup
// ============================================================================

#[test]
fn test_short_grid_on_spot_is_rejected_with_nothing_started() {
    let yaml = r#"
grid_system:
  exchange: hyperliquid
  symbol: HYPE:SPOT
  grid_type: short
  price_range:
    lower_price: 20.0
    upper_price: 40.0
  grid_interval: 0.5
  order_amount: 1.0
"#;
    let config = load_config_from_str(yaml).unwrap();
    let mut daemon = GridDaemon::new(config, settings());
    assert!(matches!(
        daemon.validate(),
        Err(AppError::ConfigValidation(_))
    ));
    assert_eq!(daemon.phase(), StartupPhase::Failed);
}

#[tokio::test]
async fn test_unsupported_exchange_aborts_before_components() {
    let yaml = r#"
grid_system:
  exchange: kraken
  symbol: BTC/USD
  grid_type: long
  price_range:
    lower_price: 50000.0
    upper_price: 70000.0
  grid_interval: 500.0
  order_amount: 0.01
"#;
    let config = load_config_from_str(yaml).unwrap();
    let mut daemon = GridDaemon::new(config, settings());
    daemon.validate().unwrap();

    let err = daemon.connect().await.unwrap_err();
    assert!(matches!(err, AppError::Exchange(_)), "Got: {}", err);
    assert_eq!(daemon.phase(), StartupPhase::Failed);
}

#[tokio::test]
async fn test_run_with_unsupported_exchange_returns_error() {
    let yaml = r#"
grid_system:
  exchange: kraken
  symbol: BTC/USD
  grid_type: long
  price_range:
    lower_price: 50000.0
    upper_price: 70000.0
  grid_interval: 500.0
  order_amount: 0.01
"#;
    let config = load_config_from_str(yaml).unwrap();
    let mut daemon = GridDaemon::new(config, settings());

    let shutdown = ShutdownSignal::new();
    let result = daemon.run(shutdown, Duration::from_secs(300)).await;
    assert!(result.is_err());
    assert_eq!(daemon.phase(), StartupPhase::Failed);
}
