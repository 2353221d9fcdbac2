use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::core::error::AppResult;
use crate::core::types::{ApprovalEvent, ChatRecord, ChatRef, UserProfile, UserRecord, WelcomeMessage};
use crate::storage::Store;

#[derive(Default)]
struct Inner {
    users: HashMap<i64, UserRecord>,
    chats: HashMap<i64, ChatRecord>,
    events: Vec<ApprovalEvent>,
    welcome: Option<WelcomeMessage>,
}

/// In-process [`Store`] with the same upsert semantics as [`SqliteStore`](crate::storage::SqliteStore).
///
/// Used by tests and dry runs; nothing is persisted.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn upsert_user(inner: &mut Inner, user: &UserProfile, now: DateTime<Utc>, approvals: u32) {
        let record = inner.users.entry(user.id).or_insert_with(|| UserRecord {
            user_id: user.id,
            first_name: user.first_name.clone(),
            username: user.username.clone(),
            joined_at: now,
            last_seen_at: now,
            approval_count: 0,
        });
        record.first_name = user.first_name.clone();
        record.username = user.username.clone();
        record.last_seen_at = now;
        record.approval_count += approvals;
    }

    fn chat_entry<'a>(inner: &'a mut Inner, chat: &ChatRef, now: DateTime<Utc>) -> &'a mut ChatRecord {
        let record = inner.chats.entry(chat.id).or_insert_with(|| ChatRecord {
            chat_id: chat.id,
            title: None,
            added_at: now,
            approved_count: 0,
            failed_count: 0,
        });
        if chat.title.is_some() {
            record.title = chat.title.clone();
        }
        record
    }
}

impl Store for MemoryStore {
    fn get_user(&self, user_id: i64) -> AppResult<Option<UserRecord>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    fn touch_user(&self, user: &UserProfile, now: DateTime<Utc>) -> AppResult<()> {
        Self::upsert_user(&mut self.lock(), user, now, 0);
        Ok(())
    }

    fn record_approval(&self, user: &UserProfile, chat: &ChatRef, now: DateTime<Utc>) -> AppResult<()> {
        let mut inner = self.lock();
        Self::upsert_user(&mut inner, user, now, 1);
        Self::chat_entry(&mut inner, chat, now).approved_count += 1;
        inner.events.push(ApprovalEvent {
            at: now,
            chat_id: chat.id,
            user_id: user.id,
            approved: true,
            error: None,
        });
        Ok(())
    }

    fn record_failed_approval(
        &self,
        chat: &ChatRef,
        user: &UserProfile,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut inner = self.lock();
        Self::chat_entry(&mut inner, chat, now).failed_count += 1;
        inner.events.push(ApprovalEvent {
            at: now,
            chat_id: chat.id,
            user_id: user.id,
            approved: false,
            error: Some(error.to_string()),
        });
        Ok(())
    }

    fn list_approval_events(&self, since: DateTime<Utc>) -> AppResult<Vec<ApprovalEvent>> {
        let mut events: Vec<ApprovalEvent> = self.lock().events.iter().filter(|e| e.at >= since).cloned().collect();
        events.sort_by_key(|e| e.at);
        Ok(events)
    }

    fn count_approval_errors(&self) -> AppResult<u64> {
        Ok(self.lock().events.iter().filter(|e| e.error.is_some()).count() as u64)
    }

    fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.lock().users.values().cloned().collect();
        users.sort_by_key(|u| (u.joined_at, u.user_id));
        Ok(users)
    }

    fn list_chats(&self) -> AppResult<Vec<ChatRecord>> {
        let mut chats: Vec<ChatRecord> = self.lock().chats.values().cloned().collect();
        chats.sort_by_key(|c| (c.added_at, c.chat_id));
        Ok(chats)
    }

    fn get_welcome(&self) -> AppResult<Option<WelcomeMessage>> {
        Ok(self.lock().welcome.clone())
    }

    fn set_welcome(&self, welcome: &WelcomeMessage) -> AppResult<()> {
        self.lock().welcome = Some(welcome.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_memory_store_matches_upsert_semantics() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let chat = ChatRef {
            id: -1,
            title: Some("Club".to_string()),
        };
        let ann = UserProfile::new(1, "Ann");

        store.touch_user(&ann, t0).unwrap();
        store.record_approval(&ann, &chat, t1).unwrap();
        store
            .record_failed_approval(&ChatRef { id: -1, title: None }, &UserProfile::new(2, "Bob"), "boom", t1)
            .unwrap();

        let user = store.get_user(1).unwrap().unwrap();
        assert_eq!(user.joined_at, t0);
        assert_eq!(user.last_seen_at, t1);
        assert_eq!(user.approval_count, 1);

        let chats = store.list_chats().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title.as_deref(), Some("Club"));
        assert_eq!((chats[0].approved_count, chats[0].failed_count), (1, 1));

        assert_eq!(store.list_approval_events(t0).unwrap().len(), 2);
        assert_eq!(store.count_approval_errors().unwrap(), 1);
        assert!(store.get_user(2).unwrap().is_none());
    }
}
