//! Configuration loader and translator
//!
//! Loads the raw YAML document and translates it into the typed, validated
//! `GridConfig`. The translation is a pure transform: unreadable or
//! malformed documents fail with `ConfigLoad`, missing type-specific fields
//! or an unrecognized grid-type tag fail with `ConfigValidation`.
//!
//! Monetary and ratio fields are parsed into `rust_decimal::Decimal`, never
//! kept as binary floats — YAML scalars are accepted as string or number,
//! numbers converted through their shortest decimal representation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;

use super::types::{
    CapitalProtectionConfig, GridConfig, GridRange, GridType, HealthCheckConfig,
    MartingaleConfig, PriceLockConfig, ScalpingConfig, SmartScalpingConfig, SpotReserveConfig,
    StopLossConfig, TakeProfitConfig,
};

// ============================================================================
// Decimal deserialization helpers
// ============================================================================

mod de {
    use rust_decimal::Decimal;
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;
    use std::str::FromStr;

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a decimal number or numeric string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
            Decimal::from_str(v.trim()).map_err(de::Error::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
            // Shortest round-trip representation recovers the literal the
            // operator wrote ("0.001"), avoiding binary float artifacts.
            Decimal::from_str(&v.to_string()).map_err(de::Error::custom)
        }
    }

    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        d.deserialize_any(DecimalVisitor)
    }

    struct OptDecimalVisitor;

    impl<'de> Visitor<'de> for OptDecimalVisitor {
        type Value = Option<Decimal>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an optional decimal number or numeric string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            decimal(d).map(Some)
        }
    }

    pub fn opt_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
        d.deserialize_option(OptDecimalVisitor)
    }
}

// ============================================================================
// Raw document
// ============================================================================

/// The untyped configuration document as written by the operator.
/// Everything is optional at this layer; required-field enforcement happens
/// in `translate()` so missing keys surface as validation errors rather
/// than parse errors.
#[derive(Debug, Deserialize)]
pub struct RawConfigDocument {
    pub grid_system: Option<RawGridSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawGridSection {
    pub exchange: Option<String>,
    pub symbol: Option<String>,
    pub grid_type: Option<String>,

    #[serde(deserialize_with = "de::opt_decimal")]
    pub grid_interval: Option<Decimal>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub order_amount: Option<Decimal>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub max_position: Option<Decimal>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub fee_rate: Option<Decimal>,
    pub quantity_precision: Option<u32>,
    pub price_decimals: Option<u32>,

    pub price_range: Option<RawPriceRange>,

    // Follow-grid window
    pub follow_grid_count: Option<u32>,
    pub follow_timeout: Option<u64>,
    pub follow_distance: Option<u32>,
    pub price_offset_grids: Option<i64>,

    // Martingale
    #[serde(deserialize_with = "de::opt_decimal")]
    pub martingale_increment: Option<Decimal>,

    // Scalping
    pub scalping_enabled: Option<bool>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub scalping_trigger_percent: Option<Decimal>,
    pub scalping_take_profit_grids: Option<u32>,

    // Smart scalping
    pub smart_scalping_enabled: Option<bool>,
    pub allowed_deep_drops: Option<u32>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub min_drop_threshold_percent: Option<Decimal>,

    // Capital protection
    pub capital_protection_enabled: Option<bool>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub capital_protection_trigger_percent: Option<Decimal>,

    // Take profit
    pub take_profit_enabled: Option<bool>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub take_profit_percentage: Option<Decimal>,

    // Price lock
    pub price_lock_enabled: Option<bool>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub price_lock_threshold: Option<Decimal>,
    pub price_lock_start_at_threshold: Option<bool>,

    // Reverse order placement
    pub reverse_order_grid_distance: Option<u32>,

    // Stop loss protection
    pub stop_loss_protection_enabled: Option<bool>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub stop_loss_trigger_percent: Option<Decimal>,
    pub stop_loss_escape_timeout: Option<u64>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub stop_loss_apr_threshold: Option<Decimal>,

    pub exit_cleanup_enabled: Option<bool>,
    pub margin_mode: Option<String>,
    pub leverage: Option<u32>,

    pub spot_reserve: Option<RawSpotReserve>,

    // Health check tolerances
    pub order_health_check_enabled: Option<bool>,
    pub order_health_check_interval: Option<u64>,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub position_tolerance: Option<Decimal>,
    pub health_check_snapshot_count: Option<u32>,

    pub rest_position_query_interval: Option<u64>,
    pub enable_notifications: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RawPriceRange {
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub lower_price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub upper_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RawSpotReserve {
    pub enabled: bool,
    #[serde(deserialize_with = "de::opt_decimal")]
    pub min_reserve: Option<Decimal>,
    pub check_interval: u64,
}

impl Default for RawSpotReserve {
    fn default() -> Self {
        Self {
            enabled: false,
            min_reserve: None,
            check_interval: 60,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and translate the grid configuration document.
pub fn load_config(path: &Path) -> Result<GridConfig, AppError> {
    if !path.exists() {
        return Err(AppError::ConfigLoad(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let doc: RawConfigDocument = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::ConfigLoad(format!("YAML parse error in '{}': {}", path.display(), e))
    })?;

    translate(doc)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<GridConfig, AppError> {
    let doc: RawConfigDocument = serde_yaml::from_str(yaml_content)
        .map_err(|e| AppError::ConfigLoad(format!("YAML parse error: {}", e)))?;

    translate(doc)
}

// ============================================================================
// Translation
// ============================================================================

fn require<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| {
        AppError::ConfigValidation(format!("grid_system.{} is required", field))
    })
}

/// Translate the raw document into the typed parameter set.
///
/// Pure transform. Feature blocks are carried over only when the source
/// document contains them; an absent block leaves the feature disabled.
pub fn translate(doc: RawConfigDocument) -> Result<GridConfig, AppError> {
    let g = doc.grid_system.ok_or_else(|| {
        AppError::ConfigValidation("missing top-level grid_system section".to_string())
    })?;

    let exchange = require(g.exchange, "exchange")?.to_lowercase();
    let symbol = require(g.symbol, "symbol")?;
    let grid_type_tag = require(g.grid_type, "grid_type")?;

    let grid_type = GridType::from_tag(&grid_type_tag).ok_or_else(|| {
        AppError::ConfigValidation(format!("unrecognized grid_type '{}'", grid_type_tag))
    })?;

    let range = if grid_type.is_follow() {
        let grid_count = g.follow_grid_count.ok_or_else(|| {
            AppError::ConfigValidation(format!(
                "grid_type '{}' requires follow_grid_count",
                grid_type
            ))
        })?;
        GridRange::Follow {
            grid_count,
            timeout_secs: g.follow_timeout.unwrap_or(300),
            distance: g.follow_distance.unwrap_or(1),
            price_offset_grids: g.price_offset_grids.unwrap_or(0),
        }
    } else {
        let pr = g.price_range.ok_or_else(|| {
            AppError::ConfigValidation(format!(
                "grid_type '{}' requires a price_range block",
                grid_type
            ))
        })?;
        let lower_price = pr.lower_price.ok_or_else(|| {
            AppError::ConfigValidation("price_range.lower_price is required".to_string())
        })?;
        let upper_price = pr.upper_price.ok_or_else(|| {
            AppError::ConfigValidation("price_range.upper_price is required".to_string())
        })?;
        GridRange::Fixed {
            lower_price,
            upper_price,
        }
    };

    let martingale = g
        .martingale_increment
        .map(|increment| MartingaleConfig { increment });

    let scalping = g.scalping_enabled.map(|enabled| ScalpingConfig {
        enabled,
        trigger_percent: g.scalping_trigger_percent,
        take_profit_grids: g.scalping_take_profit_grids,
    });

    let smart_scalping = g
        .smart_scalping_enabled
        .map(|enabled| SmartScalpingConfig {
            enabled,
            allowed_deep_drops: g.allowed_deep_drops,
            min_drop_threshold_percent: g.min_drop_threshold_percent,
        });

    let capital_protection =
        g.capital_protection_enabled
            .map(|enabled| CapitalProtectionConfig {
                enabled,
                trigger_percent: g.capital_protection_trigger_percent,
            });

    let take_profit = g.take_profit_enabled.map(|enabled| TakeProfitConfig {
        enabled,
        percentage: g.take_profit_percentage,
    });

    let price_lock = g.price_lock_enabled.map(|enabled| PriceLockConfig {
        enabled,
        threshold: g.price_lock_threshold,
        start_at_threshold: g.price_lock_start_at_threshold.unwrap_or(false),
    });

    let stop_loss = g
        .stop_loss_protection_enabled
        .map(|enabled| StopLossConfig {
            enabled,
            trigger_percent: g.stop_loss_trigger_percent,
            escape_timeout_secs: g.stop_loss_escape_timeout,
            apr_threshold: g.stop_loss_apr_threshold,
        });

    let spot_reserve = g.spot_reserve.map(|r| SpotReserveConfig {
        enabled: r.enabled,
        min_reserve: r.min_reserve,
        check_interval_secs: r.check_interval,
    });

    let health_check = HealthCheckConfig {
        enabled: g.order_health_check_enabled.unwrap_or(true),
        interval_secs: g.order_health_check_interval.unwrap_or(600),
        position_tolerance: g.position_tolerance,
        snapshot_count: g.health_check_snapshot_count,
    };

    let config = GridConfig {
        exchange,
        symbol,
        grid_type,
        range,
        grid_interval: require(g.grid_interval, "grid_interval")?,
        order_amount: require(g.order_amount, "order_amount")?,
        max_position: g.max_position,
        fee_rate: g.fee_rate.unwrap_or_else(|| Decimal::new(1, 4)),
        quantity_precision: g.quantity_precision.unwrap_or(3),
        price_decimals: g.price_decimals.unwrap_or(2),
        enable_notifications: g.enable_notifications.unwrap_or(false),
        rest_position_query_interval_secs: g.rest_position_query_interval.unwrap_or(1),
        reverse_order_grid_distance: g.reverse_order_grid_distance,
        exit_cleanup_enabled: g.exit_cleanup_enabled.unwrap_or(false),
        margin_mode: g.margin_mode,
        leverage: g.leverage,
        martingale,
        scalping,
        smart_scalping,
        capital_protection,
        take_profit,
        price_lock,
        stop_loss,
        spot_reserve,
        health_check,
    };

    config.validate()?;

    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================
