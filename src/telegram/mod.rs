//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod broadcast;
pub mod commands;
pub mod gateway;
pub mod handlers;
pub mod join;
pub mod welcome;

/// Bot type used across the crate: requests are paced by teloxide's throttle adaptor.
pub type Bot = teloxide::adaptors::Throttle<teloxide::Bot>;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use gateway::{ChatGateway, DeliveryError, LinkButton, TelegramGateway};
pub use handlers::{schema, HandlerDeps, HandlerError};
