//! Doorman - Telegram bot that auto-approves join requests
//!
//! Approves channel/group join requests, greets every new member with a
//! configurable welcome message, and gives admins statistics, user export,
//! and broadcast commands.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, domain types, statistics
//! - `storage`: the `Store` interface with SQLite and in-memory backends
//! - `telegram`: bot setup, the dispatcher schema, and the handlers

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{MemoryStore, SqliteStore, Store};
pub use telegram::{schema, ChatGateway, HandlerDeps};
