//! Credential resolution for exchange authentication
//!
//! Each field resolves independently with the precedence:
//! 1. process environment (`{EXCHANGE}_API_KEY`, `{EXCHANGE}_API_SECRET`,
//!    `{EXCHANGE}_WALLET_ADDRESS`)
//! 2. the per-exchange file `config/exchanges/<exchange>_config.yaml`
//! 3. empty
//!
//! The fallback is per-field, not per-source: a partially-set environment
//! pair is completed from the file. Credentials are held in memory only and
//! never logged (the Debug impl redacts).

use std::path::Path;

use serde_yaml::Value;
use tracing::{debug, warn};

/// Default location of per-exchange fallback files
pub const DEFAULT_EXCHANGE_CONFIG_DIR: &str = "config/exchanges";

/// Resolved authentication material for one exchange.
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub wallet_address: Option<String>,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field(
                "wallet_address",
                &self.wallet_address.as_deref().map(redact),
            )
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Credentials plus venue flags read from the same exchange file.
#[derive(Debug, Clone, Default)]
pub struct ExchangeSettings {
    pub credentials: Credentials,
    pub testnet: bool,
}

/// Resolve credentials and file-level flags for an exchange.
///
/// Missing or unreadable exchange files are not fatal: resolution degrades
/// to environment-only with a warning, matching unattended deployments that
/// configure everything through the environment.
pub fn resolve_exchange_settings(exchange: &str, config_dir: &Path) -> ExchangeSettings {
    let exchange = exchange.to_lowercase();
    let env_prefix = exchange.to_uppercase();

    let env_api_key = env_field(&env_prefix, "API_KEY");
    let env_api_secret = env_field(&env_prefix, "API_SECRET");
    let env_wallet = env_field(&env_prefix, "WALLET_ADDRESS");

    let file = load_exchange_file(&exchange, config_dir);
    let file_fields = file
        .as_ref()
        .map(|doc| file_fields(&exchange, doc))
        .unwrap_or_default();

    let testnet = file
        .as_ref()
        .map(|doc| file_testnet_flag(doc))
        .unwrap_or(false);

    let api_key = env_api_key.or(file_fields.api_key).unwrap_or_default();
    let api_secret = env_api_secret.or(file_fields.api_secret).unwrap_or_default();
    let wallet_address = env_wallet.or(file_fields.wallet_address);

    let credentials = Credentials {
        api_key,
        api_secret,
        wallet_address,
    };

    if !credentials.is_complete() {
        debug!(
            exchange = %exchange,
            "Credentials incomplete after env + file resolution"
        );
    }

    ExchangeSettings {
        credentials,
        testnet,
    }
}

fn env_field(prefix: &str, field: &str) -> Option<String> {
    std::env::var(format!("{}_{}", prefix, field))
        .ok()
        .filter(|v| !v.is_empty())
}

fn load_exchange_file(exchange: &str, config_dir: &Path) -> Option<Value> {
    let path = config_dir.join(format!("{}_config.yaml", exchange));
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match serde_yaml::from_str::<Value>(&content) {
            Ok(doc) => {
                debug!(path = %path.display(), "Loaded exchange credentials file");
                Some(doc)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable exchange file, ignoring");
                None
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read exchange file, ignoring");
            None
        }
    }
}

#[derive(Default)]
struct FileFields {
    api_key: Option<String>,
    api_secret: Option<String>,
    wallet_address: Option<String>,
}

/// Extract the authentication block from the per-exchange file.
/// File shapes differ by venue:
/// - hyperliquid: `<exchange>.authentication.private_key` doubles as both
///   key and secret, plus `wallet_address`;
/// - lighter: `api_config.auth.api_key_private_key` doubles as both;
/// - everything else: `<exchange>.authentication.{api_key, private_key
///   or api_secret, wallet_address}`.
fn file_fields(exchange: &str, doc: &Value) -> FileFields {
    let auth = |root: &Value| -> Option<Value> {
        root.get(exchange)
            .and_then(|v| v.get("authentication"))
            .cloned()
    };

    match exchange {
        "hyperliquid" => {
            let auth = match auth(doc) {
                Some(a) => a,
                None => return FileFields::default(),
            };
            let private_key = str_field(&auth, "private_key");
            FileFields {
                api_key: private_key.clone(),
                api_secret: private_key,
                wallet_address: str_field(&auth, "wallet_address"),
            }
        }
        "lighter" => {
            let key = doc
                .get("api_config")
                .and_then(|v| v.get("auth"))
                .and_then(|v| v.get("api_key_private_key"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            FileFields {
                api_key: key.clone(),
                api_secret: key,
                wallet_address: None,
            }
        }
        _ => {
            let auth = match auth(doc) {
                Some(a) => a,
                None => return FileFields::default(),
            };
            FileFields {
                api_key: str_field(&auth, "api_key"),
                api_secret: str_field(&auth, "private_key")
                    .or_else(|| str_field(&auth, "api_secret")),
                wallet_address: str_field(&auth, "wallet_address"),
            }
        }
    }
}

fn file_testnet_flag(doc: &Value) -> bool {
    doc.get("api_config")
        .and_then(|v| v.get("testnet"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write_exchange_file(dir: &TempDir, exchange: &str, content: &str) {
        fs::write(
            dir.path().join(format!("{}_config.yaml", exchange)),
            content,
        )
        .unwrap();
    }

    fn clear_env(prefix: &str) {
        for field in ["API_KEY", "API_SECRET", "WALLET_ADDRESS"] {
            std::env::remove_var(format!("{}_{}", prefix, field));
        }
    }

    #[test]
    #[serial]
    fn test_env_takes_precedence_over_file() {
        clear_env("BACKPACK");
        std::env::set_var("BACKPACK_API_KEY", "env-key");
        std::env::set_var("BACKPACK_API_SECRET", "env-secret");

        let dir = TempDir::new().unwrap();
        write_exchange_file(
            &dir,
            "backpack",
            r#"
backpack:
  authentication:
    api_key: file-key
    api_secret: file-secret
"#,
        );

        let settings = resolve_exchange_settings("backpack", dir.path());
        assert_eq!(settings.credentials.api_key, "env-key");
        assert_eq!(settings.credentials.api_secret, "env-secret");
        clear_env("BACKPACK");
    }

    #[test]
    #[serial]
    fn test_partial_env_completed_per_field_from_file() {
        // Per-field fallback: only the key comes from the environment, the
        // secret and wallet complete from the file.
        clear_env("BACKPACK");
        std::env::set_var("BACKPACK_API_KEY", "env-key");

        let dir = TempDir::new().unwrap();
        write_exchange_file(
            &dir,
            "backpack",
            r#"
backpack:
  authentication:
    api_key: file-key
    api_secret: file-secret
    wallet_address: file-wallet
"#,
        );

        let settings = resolve_exchange_settings("backpack", dir.path());
        assert_eq!(settings.credentials.api_key, "env-key");
        assert_eq!(settings.credentials.api_secret, "file-secret");
        assert_eq!(
            settings.credentials.wallet_address.as_deref(),
            Some("file-wallet")
        );
        clear_env("BACKPACK");
    }

    #[test]
    #[serial]
    fn test_hyperliquid_private_key_doubles_as_key_and_secret() {
        clear_env("HYPERLIQUID");
        let dir = TempDir::new().unwrap();
        write_exchange_file(
            &dir,
            "hyperliquid",
            r#"
hyperliquid:
  authentication:
    private_key: "0xabc123"
    wallet_address: "0xwallet"
"#,
        );

        let settings = resolve_exchange_settings("hyperliquid", dir.path());
        assert_eq!(settings.credentials.api_key, "0xabc123");
        assert_eq!(settings.credentials.api_secret, "0xabc123");
        assert_eq!(
            settings.credentials.wallet_address.as_deref(),
            Some("0xwallet")
        );
    }

    #[test]
    #[serial]
    fn test_lighter_api_config_shape_and_testnet_flag() {
        clear_env("LIGHTER");
        let dir = TempDir::new().unwrap();
        write_exchange_file(
            &dir,
            "lighter",
            r#"
api_config:
  testnet: true
  auth:
    api_key_private_key: "lighter-pk"
"#,
        );

        let settings = resolve_exchange_settings("lighter", dir.path());
        assert_eq!(settings.credentials.api_key, "lighter-pk");
        assert_eq!(settings.credentials.api_secret, "lighter-pk");
        assert!(settings.testnet);
    }

    #[test]
    #[serial]
    fn test_missing_file_resolves_empty() {
        clear_env("BACKPACK");
        let dir = TempDir::new().unwrap();
        let settings = resolve_exchange_settings("backpack", dir.path());
        assert!(settings.credentials.api_key.is_empty());
        assert!(settings.credentials.api_secret.is_empty());
        assert!(settings.credentials.wallet_address.is_none());
        assert!(!settings.testnet);
        assert!(!settings.credentials.is_complete());
    }

    #[test]
    #[serial]
    fn test_malformed_file_degrades_to_env_only() {
        clear_env("BACKPACK");
        std::env::set_var("BACKPACK_API_KEY", "env-key");
        std::env::set_var("BACKPACK_API_SECRET", "env-secret");

        let dir = TempDir::new().unwrap();
        write_exchange_file(&dir, "backpack", "not: [valid: yaml");

        let settings = resolve_exchange_settings("backpack", dir.path());
        assert_eq!(settings.credentials.api_key, "env-key");
        assert!(settings.credentials.is_complete());
        clear_env("BACKPACK");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials {
            api_key: "super-secret-key".to_string(),
            api_secret: "super-secret".to_string(),
            wallet_address: Some("0xwallet".to_string()),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("0xwallet"));
        assert!(rendered.contains("<redacted>"));
    }
}
