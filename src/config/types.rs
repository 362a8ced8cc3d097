//! Typed grid configuration
//!
//! `GridConfig` is the immutable, validated parameter set every downstream
//! component consumes. It is assembled once by the translator in
//! `config::loader` from the raw YAML document and never mutated afterwards.
//!
//! Required fields live directly on `GridConfig`; everything optional is an
//! explicit feature-extension struct that only exists when the source
//! document carried the corresponding keys. The price range is a tagged
//! variant: fixed-range grid types carry `[lower, upper]`, follow types
//! carry the trailing-window parameters instead.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ============================================================================
// Grid type
// ============================================================================

/// Grid strategy variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    Long,
    Short,
    MartingaleLong,
    MartingaleShort,
    FollowLong,
    FollowShort,
}

impl GridType {
    /// Parse a raw config tag. Returns None for unrecognized tags so the
    /// translator can report a validation error with the offending value.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "long" => Some(GridType::Long),
            "short" => Some(GridType::Short),
            "martingale_long" => Some(GridType::MartingaleLong),
            "martingale_short" => Some(GridType::MartingaleShort),
            "follow_long" => Some(GridType::FollowLong),
            "follow_short" => Some(GridType::FollowShort),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GridType::Long => "long",
            GridType::Short => "short",
            GridType::MartingaleLong => "martingale_long",
            GridType::MartingaleShort => "martingale_short",
            GridType::FollowLong => "follow_long",
            GridType::FollowShort => "follow_short",
        }
    }

    /// True for grid types holding a short position. Short grids are
    /// structurally impossible on spot markets and rejected at startup.
    pub fn is_short(&self) -> bool {
        matches!(
            self,
            GridType::Short | GridType::MartingaleShort | GridType::FollowShort
        )
    }

    /// True for grid types whose price window trails the market.
    pub fn is_follow(&self) -> bool {
        matches!(self, GridType::FollowLong | GridType::FollowShort)
    }
}

impl std::fmt::Display for GridType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Price range
// ============================================================================

/// Price range parameters, tagged by grid-type family.
///
/// Fixed-range types (`long`, `short`, `martingale_*`) require an explicit
/// `[lower_price, upper_price]` window; follow types require a grid count
/// for the trailing window instead. The translator guarantees the variant
/// matches the grid type, so downstream code never sees a mismatch.
#[derive(Debug, Clone, PartialEq)]
pub enum GridRange {
    Fixed {
        lower_price: Decimal,
        upper_price: Decimal,
    },
    Follow {
        grid_count: u32,
        /// Seconds before the trailing window re-anchors
        timeout_secs: u64,
        /// Grids of drift tolerated before the window follows
        distance: u32,
        /// Initial offset of the window, in grids (may be negative)
        price_offset_grids: i64,
    },
}

// ============================================================================
// Feature-extension blocks
// ============================================================================
//
// Each block exists on GridConfig only when the source document carried its
// keys. Inner fields stay Option where the original document may omit them;
// the consuming collaborator owns the semantics of a missing tuning knob.

/// Martingale position sizing (order size grows after adverse moves)
#[derive(Debug, Clone, PartialEq)]
pub struct MartingaleConfig {
    pub increment: Decimal,
}

/// Scalping mode
#[derive(Debug, Clone, PartialEq)]
pub struct ScalpingConfig {
    pub enabled: bool,
    pub trigger_percent: Option<Decimal>,
    pub take_profit_grids: Option<u32>,
}

/// Smart scalping mode
#[derive(Debug, Clone, PartialEq)]
pub struct SmartScalpingConfig {
    pub enabled: bool,
    pub allowed_deep_drops: Option<u32>,
    pub min_drop_threshold_percent: Option<Decimal>,
}

/// Capital protection (halt when drawdown exceeds the trigger)
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalProtectionConfig {
    pub enabled: bool,
    pub trigger_percent: Option<Decimal>,
}

/// Take-profit mode
#[derive(Debug, Clone, PartialEq)]
pub struct TakeProfitConfig {
    pub enabled: bool,
    pub percentage: Option<Decimal>,
}

/// Price-lock mode
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLockConfig {
    pub enabled: bool,
    pub threshold: Option<Decimal>,
    pub start_at_threshold: bool,
}

/// Stop-loss protection
#[derive(Debug, Clone, PartialEq)]
pub struct StopLossConfig {
    pub enabled: bool,
    pub trigger_percent: Option<Decimal>,
    pub escape_timeout_secs: Option<u64>,
    pub apr_threshold: Option<Decimal>,
}

/// Spot reserve policy: keep a minimum base-asset holding so a spot ladder
/// can always be unwound.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotReserveConfig {
    pub enabled: bool,
    pub min_reserve: Option<Decimal>,
    pub check_interval_secs: u64,
}

/// Order health check tolerances
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheckConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub position_tolerance: Option<Decimal>,
    pub snapshot_count: Option<u32>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 600,
            position_tolerance: None,
            snapshot_count: None,
        }
    }
}

// ============================================================================
// GridConfig
// ============================================================================

/// The validated grid parameter set, created once per run.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub exchange: String,
    pub symbol: String,
    pub grid_type: GridType,
    pub range: GridRange,

    pub grid_interval: Decimal,
    pub order_amount: Decimal,
    pub max_position: Option<Decimal>,
    pub fee_rate: Decimal,
    pub quantity_precision: u32,
    pub price_decimals: u32,

    pub enable_notifications: bool,
    pub rest_position_query_interval_secs: u64,
    pub reverse_order_grid_distance: Option<u32>,
    pub exit_cleanup_enabled: bool,

    /// Exchange-side risk settings, referenced but not enforced here
    pub margin_mode: Option<String>,
    pub leverage: Option<u32>,

    pub martingale: Option<MartingaleConfig>,
    pub scalping: Option<ScalpingConfig>,
    pub smart_scalping: Option<SmartScalpingConfig>,
    pub capital_protection: Option<CapitalProtectionConfig>,
    pub take_profit: Option<TakeProfitConfig>,
    pub price_lock: Option<PriceLockConfig>,
    pub stop_loss: Option<StopLossConfig>,
    pub spot_reserve: Option<SpotReserveConfig>,
    pub health_check: HealthCheckConfig,
}

impl GridConfig {
    /// Validate cross-field rules. Type-specific required fields are already
    /// guaranteed by construction (`GridRange` variant matches `grid_type`).
    pub fn validate(&self) -> Result<(), AppError> {
        if self.exchange.trim().is_empty() {
            return Err(AppError::ConfigValidation(
                "exchange cannot be empty".to_string(),
            ));
        }

        if self.symbol.trim().is_empty() {
            return Err(AppError::ConfigValidation(
                "symbol cannot be empty".to_string(),
            ));
        }

        if self.grid_interval <= Decimal::ZERO {
            return Err(AppError::ConfigValidation(format!(
                "grid_interval must be > 0, got {}",
                self.grid_interval
            )));
        }

        if self.order_amount <= Decimal::ZERO {
            return Err(AppError::ConfigValidation(format!(
                "order_amount must be > 0, got {}",
                self.order_amount
            )));
        }

        match &self.range {
            GridRange::Fixed {
                lower_price,
                upper_price,
            } => {
                if lower_price >= upper_price {
                    return Err(AppError::ConfigValidation(format!(
                        "price_range: lower_price ({}) must be < upper_price ({})",
                        lower_price, upper_price
                    )));
                }
                if *lower_price <= Decimal::ZERO {
                    return Err(AppError::ConfigValidation(format!(
                        "price_range: lower_price must be > 0, got {}",
                        lower_price
                    )));
                }
            }
            GridRange::Follow { grid_count, .. } => {
                if *grid_count == 0 {
                    return Err(AppError::ConfigValidation(
                        "follow_grid_count must be > 0".to_string(),
                    ));
                }
            }
        }

        if let Some(leverage) = self.leverage {
            if !(1..=100).contains(&leverage) {
                return Err(AppError::ConfigValidation(format!(
                    "leverage must be 1-100, got {}",
                    leverage
                )));
            }
        }

        Ok(())
    }

    /// The base asset of the trading pair, used by the reserve manager.
    /// `BTC:SPOT` → `BTC`, `SOL_USDC_SPOT` → `SOL`, `ETH-PERP` → `ETH`.
    pub fn base_asset(&self) -> &str {
        self.symbol
            .split([':', '_', '-', '/'])
            .next()
            .unwrap_or(&self.symbol)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fixed_long_config() -> GridConfig {
        GridConfig {
            exchange: "hyperliquid".to_string(),
            symbol: "BTC:SPOT".to_string(),
            grid_type: GridType::Long,
            range: GridRange::Fixed {
                lower_price: dec("60000"),
                upper_price: dec("70000"),
            },
            grid_interval: dec("100"),
            order_amount: dec("0.001"),
            max_position: None,
            fee_rate: dec("0.0001"),
            quantity_precision: 3,
            price_decimals: 2,
            enable_notifications: false,
            rest_position_query_interval_secs: 1,
            reverse_order_grid_distance: None,
            exit_cleanup_enabled: false,
            margin_mode: None,
            leverage: None,
            martingale: None,
            scalping: None,
            smart_scalping: None,
            capital_protection: None,
            take_profit: None,
            price_lock: None,
            stop_loss: None,
            spot_reserve: None,
            health_check: HealthCheckConfig::default(),
        }
    }

    #[test]
    fn test_grid_type_from_tag_all_variants() {
        assert_eq!(GridType::from_tag("long"), Some(GridType::Long));
        assert_eq!(GridType::from_tag("short"), Some(GridType::Short));
        assert_eq!(
            GridType::from_tag("martingale_long"),
            Some(GridType::MartingaleLong)
        );
        assert_eq!(
            GridType::from_tag("martingale_short"),
            Some(GridType::MartingaleShort)
        );
        assert_eq!(GridType::from_tag("follow_long"), Some(GridType::FollowLong));
        assert_eq!(
            GridType::from_tag("follow_short"),
            Some(GridType::FollowShort)
        );
    }

    #[test]
    fn test_grid_type_unknown_tag() {
        assert_eq!(GridType::from_tag("diagonal"), None);
        assert_eq!(GridType::from_tag(""), None);
        assert_eq!(GridType::from_tag("LONG"), None); // tags are lowercase
    }

    #[test]
    fn test_grid_type_short_family() {
        assert!(GridType::Short.is_short());
        assert!(GridType::MartingaleShort.is_short());
        assert!(GridType::FollowShort.is_short());
        assert!(!GridType::Long.is_short());
        assert!(!GridType::MartingaleLong.is_short());
        assert!(!GridType::FollowLong.is_short());
    }

    #[test]
    fn test_grid_type_follow_family() {
        assert!(GridType::FollowLong.is_follow());
        assert!(GridType::FollowShort.is_follow());
        assert!(!GridType::Long.is_follow());
        assert!(!GridType::MartingaleShort.is_follow());
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(fixed_long_config().validate().is_ok());
    }

    #[test]
    fn test_inverted_price_range_fails() {
        let mut config = fixed_long_config();
        config.range = GridRange::Fixed {
            lower_price: dec("70000"),
            upper_price: dec("60000"),
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("lower_price"));
    }

    #[test]
    fn test_zero_grid_interval_fails() {
        let mut config = fixed_long_config();
        config.grid_interval = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_order_amount_fails() {
        let mut config = fixed_long_config();
        config.order_amount = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_follow_grid_count_fails() {
        let mut config = fixed_long_config();
        config.grid_type = GridType::FollowLong;
        config.range = GridRange::Follow {
            grid_count: 0,
            timeout_secs: 300,
            distance: 1,
            price_offset_grids: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_leverage_out_of_range_fails() {
        let mut config = fixed_long_config();
        config.leverage = Some(0);
        assert!(config.validate().is_err());
        config.leverage = Some(101);
        assert!(config.validate().is_err());
        config.leverage = Some(20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_asset_extraction() {
        let mut config = fixed_long_config();
        assert_eq!(config.base_asset(), "BTC");
        config.symbol = "SOL_USDC_SPOT".to_string();
        assert_eq!(config.base_asset(), "SOL");
        config.symbol = "ETH-PERP".to_string();
        assert_eq!(config.base_asset(), "ETH");
        config.symbol = "MEGA".to_string();
        assert_eq!(config.base_asset(), "MEGA");
    }
}
