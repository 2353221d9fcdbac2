//! Test fixtures: handler dependencies over an in-memory store, and domain events

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

use doorman::core::session::PendingInputs;
use doorman::core::types::{ChatRef, IncomingMessage, JoinRequest, MessageContent, MessageRef, UserProfile};
use doorman::storage::MemoryStore;
use doorman::telegram::HandlerDeps;

/// The only admin in the fixtures
pub const ADMIN_ID: i64 = 1000;

/// Chat that receives join requests
pub const CHAT_ID: i64 = -100_555;

/// Fixed clock: 2026-06-01 at `hour`
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap()
}

/// Handler deps with [`ADMIN_ID`] as admin, plus the store for assertions
pub fn deps(ttl: Option<Duration>) -> (Arc<MemoryStore>, HandlerDeps) {
    let store = Arc::new(MemoryStore::new());
    let deps = HandlerDeps::new(store.clone(), PendingInputs::new(ttl), [ADMIN_ID]);
    (store, deps)
}

pub fn join_request(user_id: i64, first_name: &str) -> JoinRequest {
    JoinRequest {
        chat: ChatRef {
            id: CHAT_ID,
            title: Some("Rust Club".to_string()),
        },
        user: UserProfile::new(user_id, first_name),
        user_chat_id: user_id,
    }
}

/// Text message in the sender's private chat
pub fn private_message(from: i64, message_id: i32, text: &str) -> IncomingMessage {
    IncomingMessage {
        from: UserProfile::new(from, format!("user{}", from)),
        content: MessageContent {
            source: MessageRef::new(from, message_id),
            text: Some(text.to_string()),
            formatted: false,
        },
        reply_to: None,
    }
}

/// Text message with entities (bold, links)
pub fn formatted_message(from: i64, message_id: i32, text: &str) -> IncomingMessage {
    let mut msg = private_message(from, message_id, text);
    msg.content.formatted = true;
    msg
}

/// Photo or other non-text message in the sender's private chat
pub fn media_message(from: i64, message_id: i32) -> IncomingMessage {
    IncomingMessage {
        from: UserProfile::new(from, format!("user{}", from)),
        content: MessageContent {
            source: MessageRef::new(from, message_id),
            text: None,
            formatted: false,
        },
        reply_to: None,
    }
}

/// `msg` sent as a reply to `replied`
pub fn reply_to(mut msg: IncomingMessage, replied: &IncomingMessage) -> IncomingMessage {
    msg.reply_to = Some(replied.content.clone());
    msg
}
