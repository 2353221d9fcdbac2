//! Platform-neutral event and record types.
//!
//! Handlers work on these instead of teloxide types so the same logic runs
//! against the real Bot API and against the recording gateway in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a Telegram user as seen in an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl UserProfile {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// A group or channel that receives join requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRef {
    pub id: i64,
    pub title: Option<String>,
}

/// Address of one message in one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

impl MessageRef {
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self { chat_id, message_id }
    }
}

/// A pending request to join a chat.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub chat: ChatRef,
    pub user: UserProfile,
    /// Private chat with the requester; valid for a few minutes after the request.
    pub user_chat_id: i64,
}

/// Body of a message, reduced to what the bot needs to decide how to reuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    pub source: MessageRef,
    /// Text of a text message. Media messages (even with a caption) carry `None`.
    pub text: Option<String>,
    /// The text carries entities (bold, links, ...) that plain sending would drop.
    pub formatted: bool,
}

/// A private message addressed to the bot.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub from: UserProfile,
    pub content: MessageContent,
    pub reply_to: Option<MessageContent>,
}

impl IncomingMessage {
    pub fn chat_id(&self) -> i64 {
        self.content.source.chat_id
    }
}

/// Stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub approval_count: u32,
}

/// Stored per-chat approval counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub chat_id: i64,
    pub title: Option<String>,
    pub added_at: DateTime<Utc>,
    pub approved_count: u32,
    pub failed_count: u32,
}

/// One handled join request, kept for time-windowed statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalEvent {
    pub at: DateTime<Utc>,
    pub chat_id: i64,
    pub user_id: i64,
    pub approved: bool,
    /// Why the approve call failed; `None` for approvals.
    pub error: Option<String>,
}

/// What gets sent as the welcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WelcomeContent {
    /// Plain text, rendered with placeholders before sending.
    Text { text: String },
    /// Any other message, copied as is so media and formatting survive.
    Copy { source: MessageRef },
}

impl From<&MessageContent> for WelcomeContent {
    fn from(content: &MessageContent) -> Self {
        match &content.text {
            Some(text) if !content.formatted && !text.trim().is_empty() => WelcomeContent::Text { text: text.clone() },
            _ => WelcomeContent::Copy { source: content.source },
        }
    }
}

/// The process-wide welcome document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeMessage {
    pub content: WelcomeContent,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_becomes_text_welcome() {
        let content = MessageContent {
            source: MessageRef::new(10, 5),
            text: Some("Hello there".to_string()),
            formatted: false,
        };
        assert_eq!(
            WelcomeContent::from(&content),
            WelcomeContent::Text {
                text: "Hello there".to_string()
            }
        );
    }

    #[test]
    fn test_media_message_becomes_copy_welcome() {
        let content = MessageContent {
            source: MessageRef::new(10, 6),
            text: None,
            formatted: false,
        };
        assert_eq!(
            WelcomeContent::from(&content),
            WelcomeContent::Copy {
                source: MessageRef::new(10, 6)
            }
        );
    }

    #[test]
    fn test_formatted_text_becomes_copy_welcome() {
        let content = MessageContent {
            source: MessageRef::new(10, 7),
            text: Some("Join now".to_string()),
            formatted: true,
        };
        assert_eq!(
            WelcomeContent::from(&content),
            WelcomeContent::Copy {
                source: MessageRef::new(10, 7)
            }
        );
    }

    #[test]
    fn test_welcome_document_json_shape() {
        let welcome = WelcomeContent::Copy {
            source: MessageRef::new(-100, 42),
        };
        let json = serde_json::to_value(&welcome).unwrap();
        assert_eq!(json["kind"], "copy");
        assert_eq!(json["source"]["message_id"], 42);
    }
}
