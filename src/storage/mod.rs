//! Persistence: the `Store` interface and its SQLite and in-memory backends

pub mod db;
pub mod memory;
pub mod migrations;

use chrono::{DateTime, Utc};

use crate::core::error::AppResult;
use crate::core::types::{ApprovalEvent, ChatRef, ChatRecord, UserProfile, UserRecord, WelcomeMessage};

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool, SqliteStore};
pub use memory::MemoryStore;

/// Narrow persistence interface used by the handlers.
///
/// Every write is an upsert keyed by the platform id or an append to the
/// approval event log; there are no multi-statement transactions. Methods are synchronous, like the rusqlite
/// calls behind them.
pub trait Store: Send + Sync {
    fn get_user(&self, user_id: i64) -> AppResult<Option<UserRecord>>;

    /// Creates the user or refreshes its name and `last_seen_at`.
    fn touch_user(&self, user: &UserProfile, now: DateTime<Utc>) -> AppResult<()>;

    /// Upserts the user with `approval_count + 1`, bumps the chat's approved
    /// counter, and logs an approval event.
    fn record_approval(&self, user: &UserProfile, chat: &ChatRef, now: DateTime<Utc>) -> AppResult<()>;

    /// Bumps the chat's failed counter (creating the chat if needed) and logs
    /// a failed event with `error`. The user record is left alone.
    fn record_failed_approval(
        &self,
        chat: &ChatRef,
        user: &UserProfile,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Approval events at or after `since`, oldest first.
    fn list_approval_events(&self, since: DateTime<Utc>) -> AppResult<Vec<ApprovalEvent>>;

    /// Failed events over the whole log.
    fn count_approval_errors(&self) -> AppResult<u64>;

    /// All users, oldest first.
    fn list_users(&self) -> AppResult<Vec<UserRecord>>;

    fn list_chats(&self) -> AppResult<Vec<ChatRecord>>;

    fn get_welcome(&self) -> AppResult<Option<WelcomeMessage>>;

    fn set_welcome(&self, welcome: &WelcomeMessage) -> AppResult<()>;
}
