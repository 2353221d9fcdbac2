use anyhow::{Context, Result};
use chrono::Utc;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::Me;
use teloxide::update_listeners::webhooks;
use tokio::time::sleep;

use doorman::cli::{Cli, Commands};
use doorman::core::export::write_users_csv;
use doorman::core::session::PendingInputs;
use doorman::core::stats::Stats;
use doorman::core::{config, init_logger, log_configuration, Config};
use doorman::storage::{SqliteStore, Store};
use doorman::telegram::{create_bot, schema, setup_bot_commands, Bot, HandlerDeps};

/// Webhook listener address when WEBHOOK_ADDR is unset
const DEFAULT_WEBHOOK_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8443);

/// Main entry point
///
/// Parses CLI arguments and dispatches to the selected subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, database, bot connection).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Environment first: LOG_FILE_PATH may come from the file
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    init_logger(&config::log_file_path_from_env())?;

    match cli.command.unwrap_or(Commands::Run { webhook: false }) {
        Commands::Run { webhook } => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(webhook).await
        }
        Commands::Stats => print_stats(),
        Commands::ExportUsers { output } => export_users(&output),
    }
}

fn print_stats() -> Result<()> {
    let store = SqliteStore::open(config::database_path_from_env())?;
    let stats = Stats::gather(&store, Utc::now())?;
    println!("{}", stats.render());
    Ok(())
}

fn export_users(output: &Path) -> Result<()> {
    let store = SqliteStore::open(config::database_path_from_env())?;
    let users = store.list_users()?;
    write_users_csv(output, &users)?;
    log::info!("Exported {} users to {}", users.len(), output.display());
    Ok(())
}

/// Calls `getMe` until the Bot API answers or the attempts run out.
async fn get_me_with_retry(bot: &Bot) -> Result<Me> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match bot.get_me().await {
            Ok(me) => return Ok(me),
            Err(e) if attempt < config::startup::GET_ME_ATTEMPTS => {
                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in {} seconds...",
                    attempt,
                    config::startup::GET_ME_ATTEMPTS,
                    e,
                    config::startup::GET_ME_RETRY_DELAY_SECS
                );
                sleep(config::startup::get_me_retry_delay()).await;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to connect to Bot API after {} attempts: {}",
                    attempt,
                    e
                ))
            }
        }
    }
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");

    let config = Config::from_env()?;
    log_configuration(&config);

    let bot = create_bot(&config)?;
    let me = get_me_with_retry(&bot).await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username.as_deref(), me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let store = Arc::new(SqliteStore::open(&config.database_path)?);
    let sessions = PendingInputs::new(config.pending_input_ttl);
    sessions.spawn_cleanup_task(config::session::cleanup_interval());

    let handler_deps = HandlerDeps::new(store, sessions, config.admin_ids.iter().copied())
        .with_channel(config.channel_link.clone(), config.channel_id)
        .with_bot_username(me.username.clone());

    // Create the dispatcher handler tree using the modular schema
    let handler = schema(handler_deps);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .error_handler(LoggingErrorHandler::with_custom_text("An error from a handler"))
        .enable_ctrlc_handler()
        .build();

    let webhook_url = if use_webhook { config.webhook_url.clone() } else { None };
    if use_webhook && webhook_url.is_none() {
        anyhow::bail!("--webhook requires WEBHOOK_URL to be set");
    }

    log::info!("================================================");
    log::info!(
        "🎉 Bot initialization complete in {:.2}s",
        bot_init_start.elapsed().as_secs_f64()
    );
    log::info!("================================================");

    if let Some(url) = webhook_url {
        let addr = config
            .webhook_addr
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_WEBHOOK_ADDR));
        log::info!("Starting bot in webhook mode at {} (listening on {})", url, addr);

        let listener = webhooks::axum(bot.clone(), webhooks::Options::new(addr, url)).await?;
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        log::info!("Starting bot in long polling mode");
        dispatcher.dispatch().await;
    }

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
