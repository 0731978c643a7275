//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup configuration summary

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

/// Initialize logger for both console and file output
///
/// Records emitted through the `log` macros are forwarded into `tracing`, so
/// both facades end up in the same sinks. The level comes from `RUST_LOG`
/// and defaults to `info`.
///
/// # Arguments
/// * `log_file_path` - Path to the log file (appended to, created if missing)
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("Failed to open log file {}", log_file_path))?;

    tracing_log::LogTracer::init().context("Failed to install log bridge")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)));

    tracing::subscriber::set_global_default(subscriber).context("Failed to initialize logger")?;

    Ok(())
}

/// Logs the effective configuration at application startup
///
/// `webhook_mode` is whether `run` was asked to use the webhook. Secrets are
/// never printed, only whether they are set.
pub fn log_configuration_summary(config: &Config, webhook_mode: bool) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🧘 Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("  • Group ID: {}", config.group_id);
    log::info!("  • Database: {} (pool size {})", config.database.path, config.database.pool_size);

    match config.effective_webhook_url(webhook_mode) {
        Some(url) => log::info!("  • Mode: webhook at {} (port {})", url, config.port),
        None if webhook_mode => log::warn!("⚠️  --webhook given but WEBHOOK_URL not set, long polling will be used"),
        None => log::info!("  • Mode: long polling"),
    }

    log::info!("  • Card payments: {}", config.payments.card_url);
    match &config.payments.paypal_url {
        Some(url) => log::info!("  • PayPal: {}", url),
        None => log::warn!("⚠️  PAYPAL_PAYMENT_URL not set, PayPal button hidden"),
    }
    match &config.payments.bank_transfer_url {
        Some(url) => log::info!("  • Bank transfer: {}", url),
        None => log::warn!("⚠️  BANK_TRANSFER_URL not set, bank transfer button hidden"),
    }

    if config.payments.webhook_secret.is_some() {
        log::info!("✅ PAYMENT_WEBHOOK_SECRET set, payment callbacks must be signed");
    } else {
        log::warn!("⚠️  PAYMENT_WEBHOOK_SECRET not set, payment callbacks are NOT authenticated");
    }

    if config.admin_ids.is_empty() {
        log::warn!("⚠️  ADMIN_IDS not set, admission notifications disabled");
    } else {
        log::info!("  • Admins: {}", config.admin_ids.len());
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
