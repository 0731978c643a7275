//! Command enum and bot construction

use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::utils::command::{BotCommands, ParseError};

use crate::telegram::Bot;
use yogacore::Config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команды:")]
pub enum Command {
    // Optional argument is the order token from the payment deep link
    #[command(description = "начать и проверить оплату", parse_with = parse_start_token)]
    Start(Option<String>),
    #[command(description = "тарифы и оплата")]
    Plans,
    #[command(description = "статус подписки")]
    Status,
    #[command(description = "отменить ввод email")]
    Cancel,
    #[command(description = "справка")]
    Help,
}

fn parse_start_token(input: String) -> Result<(Option<String>,), ParseError> {
    let token = input.trim();
    Ok((if token.is_empty() { None } else { Some(token.to_string()) },))
}

/// Creates a Bot instance from the configured token.
pub fn create_bot(config: &Config) -> Bot {
    Bot::new(config.bot_token.expose_secret())
}

/// Publishes the command list shown in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
