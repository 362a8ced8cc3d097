//! Configuration module: YAML loading, grid parameter translation,
//! credential resolution, and logging setup.

mod credentials;
mod loader;
pub mod logging;
mod types;

pub use credentials::{
    resolve_exchange_settings, Credentials, ExchangeSettings, DEFAULT_EXCHANGE_CONFIG_DIR,
};
pub use loader::{load_config, load_config_from_str, translate, RawConfigDocument};
pub use logging::init_logging;
pub use types::{
    CapitalProtectionConfig, GridConfig, GridRange, GridType, HealthCheckConfig,
    MartingaleConfig, PriceLockConfig, ScalpingConfig, SmartScalpingConfig, SpotReserveConfig,
    StopLossConfig, TakeProfitConfig,
};
