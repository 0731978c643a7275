use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::{webhooks, Polling};

use yogabot::cli::{Cli, Commands};
use yogabot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramInviteIssuer};
use yogabot::web::{payment_router, PaymentState};
use yogacore::expiry::{expire_subscriptions, start_expiry_sweeper};
use yogacore::onboarding::Onboarding;
use yogacore::payments::PaymentLinks;
use yogacore::{create_pool, init_logger, log_configuration_summary, Config};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the chosen subcommand; without one
/// the bot runs in polling mode.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = Config::from_env().context("Invalid configuration")?;
    init_logger(&config.log_file_path)?;

    match cli.command.unwrap_or(Commands::Run { webhook: false }) {
        Commands::Run { webhook } => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(config, webhook).await
        }
        Commands::Migrate => {
            create_pool(&config.database.path, 1)?;
            log::info!("Database {} is up to date", config.database.path);
            Ok(())
        }
        Commands::ExpireSubscriptions => {
            let pool = create_pool(&config.database.path, 1)?;
            let expired = expire_subscriptions(&pool)?;
            log::info!("Expired {} subscription(s)", expired);
            Ok(())
        }
    }
}

async fn run_bot(config: Config, use_webhook: bool) -> Result<()> {
    log_configuration_summary(&config, use_webhook);

    let db_pool = Arc::new(create_pool(&config.database.path, config.database.pool_size)?);
    let bot = create_bot(&config);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to publish bot commands: {}", e);
    }

    let issuer = Arc::new(TelegramInviteIssuer::new(bot.clone()));
    let onboarding = Arc::new(Onboarding::new(Arc::clone(&db_pool), issuer, config.group_id));
    let deps = HandlerDeps::new(
        Arc::clone(&db_pool),
        onboarding,
        PaymentLinks::from_config(&config.payments),
        config.group_id,
        config.admin_ids.clone(),
    );

    start_expiry_sweeper(Arc::clone(&db_pool));

    let payment_app = payment_router(PaymentState {
        db_pool: Arc::clone(&db_pool),
        webhook_secret: config.payments.webhook_secret.clone(),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema(deps))
        .error_handler(LoggingErrorHandler::with_custom_text("An error has occurred in the dispatcher"))
        .enable_ctrlc_handler()
        .build();

    if let Some(url) = config.effective_webhook_url(use_webhook) {
        log::info!("Starting bot in webhook mode at {}", url);
        let options = webhooks::Options::new(addr, url);
        let (listener, stop_flag, telegram_app) = webhooks::axum_to_router(bot.clone(), options)
            .await
            .context("Failed to set up Telegram webhook")?;

        let app = telegram_app.merge(payment_app);
        let tcp = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        log::info!("HTTP server listening on http://{}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
                log::error!("HTTP server error: {}", e);
            }
        });

        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        log::info!("Starting bot in long polling mode");
        let tcp = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        log::info!("Payment callbacks listening on http://{}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(tcp, payment_app).await {
                log::error!("HTTP server error: {}", e);
            }
        });

        // getUpdates is refused while a webhook is registered
        if let Err(e) = bot.delete_webhook().await {
            log::warn!("Failed to delete webhook before polling: {}", e);
        }

        let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    }

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
