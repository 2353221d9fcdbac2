//! Handler types, dependencies, and conversions from teloxide updates

use std::collections::HashSet;
use std::sync::Arc;

use teloxide::types::{ChatJoinRequest, Message, User};
use url::Url;

use crate::core::session::PendingInputs;
use crate::core::types::{ChatRef, IncomingMessage, JoinRequest, MessageContent, MessageRef, UserProfile};
use crate::storage::Store;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub store: Arc<dyn Store>,
    pub sessions: PendingInputs,
    pub admin_ids: Arc<HashSet<i64>>,
    pub channel_link: Option<Url>,
    pub channel_id: Option<i64>,
    /// Needed for the "add me to channel/group" deep links.
    pub bot_username: Option<String>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(store: Arc<dyn Store>, sessions: PendingInputs, admin_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            store,
            sessions,
            admin_ids: Arc::new(admin_ids.into_iter().collect()),
            channel_link: None,
            channel_id: None,
            bot_username: None,
        }
    }

    pub fn with_channel(mut self, link: Option<Url>, id: Option<i64>) -> Self {
        self.channel_link = link;
        self.channel_id = id;
        self
    }

    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn profile(user: &User) -> Option<UserProfile> {
    Some(UserProfile {
        id: i64::try_from(user.id.0).ok()?,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    })
}

fn content(msg: &Message) -> MessageContent {
    MessageContent {
        source: MessageRef::new(msg.chat.id.0, msg.id.0),
        text: msg.text().map(str::to_string),
        formatted: msg.entities().is_some_and(|entities| !entities.is_empty()),
    }
}

/// Converts a private message; `None` for messages without a sender (channel posts).
pub fn incoming_from_message(msg: &Message) -> Option<IncomingMessage> {
    Some(IncomingMessage {
        from: profile(msg.from.as_ref()?)?,
        content: content(msg),
        reply_to: msg.reply_to_message().map(content),
    })
}

pub fn join_request_from(request: &ChatJoinRequest) -> Option<JoinRequest> {
    Some(JoinRequest {
        chat: ChatRef {
            id: request.chat.id.0,
            title: request.chat.title().map(str::to_string),
        },
        user: profile(&request.from)?,
        user_chat_id: request.user_chat_id.0,
    })
}
