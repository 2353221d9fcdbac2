use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

use crate::core::error::AppResult;
use crate::core::types::{ApprovalEvent, ChatRecord, ChatRef, UserProfile, UserRecord, WelcomeMessage};
use crate::storage::migrations::run_migrations;
use crate::storage::Store;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Settings row holding the serialized welcome document
const WELCOME_SETTING: &str = "welcome_message";

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and runs schema migrations
/// on the first connection.
///
/// # Example
///
/// ```no_run
/// use doorman::storage::db;
///
/// let pool = db::create_pool("doorman.sqlite")?;
/// # Ok::<(), doorman::core::error::AppError>(())
/// ```
pub fn create_pool(database_path: impl AsRef<Path>) -> AppResult<DbPool> {
    let manager =
        SqliteConnectionManager::file(database_path).with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    Ok(pool.get()?)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get("user_id")?,
        first_name: row.get("first_name")?,
        username: row.get("username")?,
        joined_at: row.get("joined_at")?,
        last_seen_at: row.get("last_seen_at")?,
        approval_count: row.get("approval_count")?,
    })
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<ChatRecord> {
    Ok(ChatRecord {
        chat_id: row.get("chat_id")?,
        title: row.get("title")?,
        added_at: row.get("added_at")?,
        approved_count: row.get("approved_count")?,
        failed_count: row.get("failed_count")?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<ApprovalEvent> {
    Ok(ApprovalEvent {
        at: row.get("created_at")?,
        chat_id: row.get("chat_id")?,
        user_id: row.get("user_id")?,
        approved: row.get("approved")?,
        error: row.get("error")?,
    })
}

fn insert_event(
    conn: &DbConnection,
    chat_id: i64,
    user_id: i64,
    error: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO approval_events (created_at, chat_id, user_id, approved, error)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![now, chat_id, user_id, error.is_none(), error],
    )?;
    Ok(())
}

/// SQLite-backed [`Store`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Opens (or creates) the database file and migrates it.
    pub fn open(database_path: impl AsRef<Path>) -> AppResult<Self> {
        Ok(Self::new(create_pool(database_path)?))
    }

    fn conn(&self) -> AppResult<DbConnection> {
        get_connection(&self.pool)
    }
}

impl Store for SqliteStore {
    fn get_user(&self, user_id: i64) -> AppResult<Option<UserRecord>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, first_name, username, joined_at, last_seen_at, approval_count
                 FROM users WHERE user_id = ?1",
                params![user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn touch_user(&self, user: &UserProfile, now: DateTime<Utc>) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (user_id, first_name, username, joined_at, last_seen_at, approval_count)
             VALUES (?1, ?2, ?3, ?4, ?4, 0)
             ON CONFLICT(user_id) DO UPDATE SET
             first_name = excluded.first_name,
             username = excluded.username,
             last_seen_at = excluded.last_seen_at",
            params![user.id, user.first_name, user.username, now],
        )?;
        Ok(())
    }

    fn record_approval(&self, user: &UserProfile, chat: &ChatRef, now: DateTime<Utc>) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (user_id, first_name, username, joined_at, last_seen_at, approval_count)
             VALUES (?1, ?2, ?3, ?4, ?4, 1)
             ON CONFLICT(user_id) DO UPDATE SET
             first_name = excluded.first_name,
             username = excluded.username,
             last_seen_at = excluded.last_seen_at,
             approval_count = approval_count + 1",
            params![user.id, user.first_name, user.username, now],
        )?;
        conn.execute(
            "INSERT INTO chats (chat_id, title, added_at, approved_count, failed_count)
             VALUES (?1, ?2, ?3, 1, 0)
             ON CONFLICT(chat_id) DO UPDATE SET
             title = COALESCE(excluded.title, title),
             approved_count = approved_count + 1",
            params![chat.id, chat.title, now],
        )?;
        insert_event(&conn, chat.id, user.id, None, now)
    }

    fn record_failed_approval(
        &self,
        chat: &ChatRef,
        user: &UserProfile,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chats (chat_id, title, added_at, approved_count, failed_count)
             VALUES (?1, ?2, ?3, 0, 1)
             ON CONFLICT(chat_id) DO UPDATE SET
             title = COALESCE(excluded.title, title),
             failed_count = failed_count + 1",
            params![chat.id, chat.title, now],
        )?;
        insert_event(&conn, chat.id, user.id, Some(error), now)
    }

    fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, first_name, username, joined_at, last_seen_at, approval_count
             FROM users ORDER BY joined_at, user_id",
        )?;
        let users = stmt.query_map([], user_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn list_chats(&self) -> AppResult<Vec<ChatRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT chat_id, title, added_at, approved_count, failed_count
             FROM chats ORDER BY added_at, chat_id",
        )?;
        let chats = stmt.query_map([], chat_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(chats)
    }

    fn list_approval_events(&self, since: DateTime<Utc>) -> AppResult<Vec<ApprovalEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT created_at, chat_id, user_id, approved, error
             FROM approval_events WHERE created_at >= ?1 ORDER BY created_at, id",
        )?;
        let events = stmt
            .query_map(params![since], event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn count_approval_errors(&self) -> AppResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM approval_events WHERE error IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn get_welcome(&self) -> AppResult<Option<WelcomeMessage>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE name = ?1",
                params![WELCOME_SETTING],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_welcome(&self, welcome: &WelcomeMessage) -> AppResult<()> {
        let value = serde_json::to_string(welcome)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (name, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![WELCOME_SETTING, value, welcome.updated_at],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MessageRef, WelcomeContent};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.sqlite")).unwrap();
        (dir, store)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, hour, 0, 0).unwrap()
    }

    fn chat() -> ChatRef {
        ChatRef {
            id: -100123,
            title: Some("Rust Club".to_string()),
        }
    }

    #[test]
    fn test_touch_creates_then_updates() {
        let (_dir, store) = open_store();
        let ann = UserProfile::new(1, "Ann");
        store.touch_user(&ann, at(8)).unwrap();
        store.touch_user(&ann.clone().with_username("ann"), at(9)).unwrap();

        let user = store.get_user(1).unwrap().unwrap();
        assert_eq!(user.joined_at, at(8));
        assert_eq!(user.last_seen_at, at(9));
        assert_eq!(user.username.as_deref(), Some("ann"));
        assert_eq!(user.approval_count, 0);
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_approvals_do_not_duplicate() {
        let (_dir, store) = open_store();
        let ann = UserProfile::new(1, "Ann");
        store.record_approval(&ann, &chat(), at(8)).unwrap();
        store.record_approval(&ann, &chat(), at(9)).unwrap();

        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].approval_count, 2);

        let chats = store.list_chats().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].approved_count, 2);
        assert_eq!(chats[0].failed_count, 0);
    }

    #[test]
    fn test_failed_approval_keeps_known_title() {
        let (_dir, store) = open_store();
        store.record_approval(&UserProfile::new(1, "Ann"), &chat(), at(8)).unwrap();
        store
            .record_failed_approval(
                &ChatRef { id: chat().id, title: None },
                &UserProfile::new(2, "Bob"),
                "CHAT_ADMIN_REQUIRED",
                at(9),
            )
            .unwrap();

        let chats = store.list_chats().unwrap();
        assert_eq!(chats[0].title.as_deref(), Some("Rust Club"));
        assert_eq!(chats[0].failed_count, 1);
    }

    #[test]
    fn test_approval_events_logged_for_both_outcomes() {
        let (_dir, store) = open_store();
        let ann = UserProfile::new(1, "Ann");
        store.record_approval(&ann, &chat(), at(8)).unwrap();
        store.record_approval(&ann, &chat(), at(10)).unwrap();
        store
            .record_failed_approval(&chat(), &UserProfile::new(2, "Bob"), "USER_CHANNELS_TOO_MUCH", at(11))
            .unwrap();

        let all = store.list_approval_events(at(0)).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(
            all[2],
            ApprovalEvent {
                at: at(11),
                chat_id: chat().id,
                user_id: 2,
                approved: false,
                error: Some("USER_CHANNELS_TOO_MUCH".to_string()),
            }
        );
        assert!(all[0].approved && all[0].error.is_none());

        // Repeat approvals of one user are separate events
        let since_nine = store.list_approval_events(at(9)).unwrap();
        assert_eq!(since_nine.iter().filter(|e| e.approved).count(), 1);
        assert_eq!(store.count_approval_errors().unwrap(), 1);
    }

    #[test]
    fn test_users_listed_oldest_first() {
        let (_dir, store) = open_store();
        store.touch_user(&UserProfile::new(2, "Bob"), at(10)).unwrap();
        store.touch_user(&UserProfile::new(1, "Ann"), at(10) - Duration::hours(1)).unwrap();

        let ids: Vec<i64> = store.list_users().unwrap().iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_welcome_roundtrip_and_overwrite() {
        let (_dir, store) = open_store();
        assert!(store.get_welcome().unwrap().is_none());

        let first = WelcomeMessage {
            content: WelcomeContent::Text {
                text: "Hi {name}".to_string(),
            },
            updated_by: 42,
            updated_at: at(8),
        };
        store.set_welcome(&first).unwrap();

        let second = WelcomeMessage {
            content: WelcomeContent::Copy {
                source: MessageRef::new(42, 7),
            },
            updated_by: 42,
            updated_at: at(9),
        };
        store.set_welcome(&second).unwrap();

        assert_eq!(store.get_welcome().unwrap(), Some(second));
    }

    #[test]
    fn test_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reopen.sqlite");
        SqliteStore::open(&path)
            .unwrap()
            .touch_user(&UserProfile::new(5, "Eve"), at(8))
            .unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.get_user(5).unwrap().is_some());
    }
}
