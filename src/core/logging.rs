//! Logging initialization and startup diagnostics

use anyhow::Result;
use fs_err::File;
use simplelog::*;

use crate::core::config::Config as AppConfig;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file.into_parts().0),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at startup. The token is never printed.
pub fn log_configuration(config: &AppConfig) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Admins: {}", config.admin_ids.len());
    log::info!("Database: {}", config.database_path.display());
    match &config.bot_api_url {
        Some(url) => log::info!("Bot API: {}", url),
        None => log::info!("Bot API: api.telegram.org"),
    }
    match &config.channel_link {
        Some(link) => log::info!("Channel link: {}", link),
        None => log::warn!("⚠️  CHANNEL_LINK not set, /start will show no join button"),
    }
    match config.pending_input_ttl {
        Some(ttl) => log::info!("Pending input expires after {}s", ttl.as_secs()),
        None => log::info!("Pending input never expires"),
    }
}
