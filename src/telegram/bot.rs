//! Bot initialization and command definitions

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config::{self, Config};
use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "view detailed statistics (admins)")]
    Stats,
    #[command(description = "send a message to all users (admins)")]
    Broadcast,
    #[command(rename = "fetch_users", description = "export all users as CSV (admins)")]
    FetchUsers,
    #[command(description = "set the welcome message for new users (admins)")]
    SetWelcome,
    #[command(description = "cancel the pending broadcast or welcome input (admins)")]
    Cancel,
}

impl Command {
    /// Commands gated by the admin allow-list.
    pub fn is_admin_only(&self) -> bool {
        !matches!(self, Command::Start)
    }
}

/// Creates the throttled Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to build the HTTP client
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let mut bot = teloxide::Bot::with_client(config.bot_token.expose_secret(), client);

    if let Some(url) = &config.bot_api_url {
        log::info!("Using custom Bot API URL: {}", url);
        bot = bot.set_api_url(url.clone());
    }

    Ok(bot.throttle(Limits::default()))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "start the bot"),
        BotCommand::new("stats", "view detailed statistics"),
        BotCommand::new("broadcast", "send a message to all users"),
        BotCommand::new("fetch_users", "export all users as CSV"),
        BotCommand::new("setwelcome", "set the welcome message for new users"),
        BotCommand::new("cancel", "cancel the pending input"),
    ])
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions() {
        let command_list = Command::descriptions().to_string();
        assert!(command_list.contains("Available commands"));
        assert!(command_list.contains("/fetch_users"));
        assert!(command_list.contains("/setwelcome"));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "doorman_bot").ok(), Some(Command::Start));
        assert_eq!(Command::parse("/fetch_users", "doorman_bot").ok(), Some(Command::FetchUsers));
        assert_eq!(Command::parse("/setwelcome@doorman_bot", "doorman_bot").ok(), Some(Command::SetWelcome));
        assert!(Command::parse("/unknown", "doorman_bot").is_err());
    }

    #[test]
    fn test_only_start_is_public() {
        assert!(!Command::Start.is_admin_only());
        assert!(Command::Broadcast.is_admin_only());
        assert!(Command::Cancel.is_admin_only());
    }
}
