use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "yogabot")]
#[command(author, version, about = "Telegram bot that admits paying members into the yoga club group", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling unless --webhook is given)
    Run {
        /// Receive updates through the webhook at WEBHOOK_URL
        #[arg(long)]
        webhook: bool,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Expire overdue subscriptions once and exit
    ExpireSubscriptions,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["yogabot", "run", "--webhook"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run { webhook: true }));

        let cli = Cli::try_parse_from(["yogabot", "expire-subscriptions"]).unwrap();
        assert_eq!(cli.command, Some(Commands::ExpireSubscriptions));

        let cli = Cli::try_parse_from(["yogabot"]).unwrap();
        assert_eq!(cli.command, None);
    }
}
