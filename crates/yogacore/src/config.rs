//! Environment configuration
//!
//! Everything is read once at startup into [`Config`]. The binary loads a
//! `.env` file first (via `dotenvy`), so local development works without
//! exporting variables by hand.

use secrecy::SecretString;
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Card processor payform used when CARD_PAYMENT_URL is not set
pub const DEFAULT_CARD_PAYMENT_URL: &str = "https://payform.ru/iw4eY7T/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite database file, DATABASE_PATH (default: database.sqlite)
    pub path: String,
    /// Maximum pooled connections, DATABASE_POOL_SIZE (default: 4)
    pub pool_size: u32,
}

/// External payment processor links
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Card payform, CARD_PAYMENT_URL
    pub card_url: Url,
    /// PayPal checkout, PAYPAL_PAYMENT_URL (button hidden when unset)
    pub paypal_url: Option<Url>,
    /// Bank transfer instructions, BANK_TRANSFER_URL (button hidden when unset)
    pub bank_transfer_url: Option<Url>,
    /// HMAC key for payment callbacks, PAYMENT_WEBHOOK_SECRET
    pub webhook_secret: Option<SecretString>,
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token, BOT_TOKEN or TELOXIDE_TOKEN
    pub bot_token: SecretString,
    /// Public base URL for the Telegram webhook, WEBHOOK_URL
    pub webhook_url: Option<Url>,
    /// Path Telegram posts updates to, WEBHOOK_PATH (default: /telegram)
    pub webhook_path: String,
    /// HTTP port, PORT (default: 8080)
    pub port: u16,
    /// Private community chat, GROUP_ID
    pub group_id: i64,
    pub database: DatabaseConfig,
    pub payments: PaymentConfig,
    /// Log file, LOG_FILE_PATH (default: app.log)
    pub log_file_path: String,
    /// Admins notified about admissions, ADMIN_IDS
    pub admin_ids: Vec<i64>,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name).and_then(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let group_id = get("GROUP_ID").ok_or(ConfigError::Missing("GROUP_ID"))?;
        let group_id = parse_value("GROUP_ID", &group_id)?;

        let webhook_url = get("WEBHOOK_URL").map(|v| parse_url("WEBHOOK_URL", &v)).transpose()?;
        let webhook_path = normalize_path(get("WEBHOOK_PATH").as_deref().unwrap_or("/telegram"));

        let port = match get("PORT") {
            Some(v) => parse_value("PORT", &v)?,
            None => 8080,
        };

        let pool_size = match get("DATABASE_POOL_SIZE") {
            Some(v) => parse_value::<u32>("DATABASE_POOL_SIZE", &v)?,
            None => 4,
        };
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_POOL_SIZE",
                value: "0".to_string(),
            });
        }

        let card_url = parse_url(
            "CARD_PAYMENT_URL",
            get("CARD_PAYMENT_URL").as_deref().unwrap_or(DEFAULT_CARD_PAYMENT_URL),
        )?;

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            webhook_url,
            webhook_path,
            port,
            group_id,
            database: DatabaseConfig {
                path: get("DATABASE_PATH").unwrap_or_else(|| "database.sqlite".to_string()),
                pool_size,
            },
            payments: PaymentConfig {
                card_url,
                paypal_url: get("PAYPAL_PAYMENT_URL")
                    .map(|v| parse_url("PAYPAL_PAYMENT_URL", &v))
                    .transpose()?,
                bank_transfer_url: get("BANK_TRANSFER_URL")
                    .map(|v| parse_url("BANK_TRANSFER_URL", &v))
                    .transpose()?,
                webhook_secret: get("PAYMENT_WEBHOOK_SECRET").map(SecretString::from),
            },
            log_file_path: get("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()),
            admin_ids: get("ADMIN_IDS").map(|raw| parse_admin_ids(&raw)).unwrap_or_default(),
        })
    }

    /// Full URL Telegram should deliver updates to, if webhook mode is configured.
    pub fn telegram_webhook_url(&self) -> Option<Url> {
        let base = self.webhook_url.as_ref()?;
        let mut url = base.clone();
        let joined = format!("{}{}", base.path().trim_end_matches('/'), self.webhook_path);
        url.set_path(&joined);
        Some(url)
    }

    /// Webhook URL `run` will actually use: only when `--webhook` was given
    /// and WEBHOOK_URL is set. `None` means long polling.
    pub fn effective_webhook_url(&self, webhook_requested: bool) -> Option<Url> {
        if webhook_requested {
            self.telegram_webhook_url()
        } else {
            None
        }
    }
}

/// Expired subscriptions sweep configuration
pub mod expiry {
    use super::Duration;

    /// Interval between sweeps (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 3600;

    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split([',', ' ', '\n', '\t'])
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
