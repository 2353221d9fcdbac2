//! Sending and replacing the welcome message

use chrono::{DateTime, Utc};

use crate::core::error::AppResult;
use crate::core::types::{MessageContent, UserProfile, WelcomeContent, WelcomeMessage};
use crate::core::welcome;
use crate::storage::Store;
use crate::telegram::gateway::{ChatGateway, DeliveryError, LinkButton};

pub const WELCOME_UPDATED_REPLY: &str =
    "✅ Welcome message updated successfully. Users will now see this message when they join or start the bot.";

pub const WELCOME_PROMPT: &str = "Please send or forward the message you want to set as the welcome message for new users.\n\n\
You can send text, images, videos, or any other content. Text may use {name}, {username}, {id} and {chat}.\n\
To cancel, send /cancel\n\n\
TIP: You can also reply to any message with /setwelcome to set it as the welcome message.";

/// Sends the stored welcome, or `default_template` when none is set.
///
/// A stored copy-welcome whose source message can no longer be copied falls
/// back to the default text, unless the recipient is unreachable anyway
/// (blocked, deactivated, or chat not found).
pub async fn send_welcome(
    gateway: &dyn ChatGateway,
    chat_id: i64,
    stored: Option<&WelcomeMessage>,
    user: &UserProfile,
    chat_title: Option<&str>,
    default_template: &str,
    buttons: &[LinkButton],
) -> Result<(), DeliveryError> {
    match stored.map(|w| &w.content) {
        Some(WelcomeContent::Text { text }) => {
            let rendered = welcome::render(text, user, chat_title);
            gateway.send_text(chat_id, &rendered, buttons).await.map(|_| ())
        }
        Some(WelcomeContent::Copy { source }) => match gateway.copy_message(chat_id, *source, buttons).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unreachable() => Err(e),
            Err(e) => {
                log::warn!("Failed to copy custom welcome {:?}: {}. Sending default", source, e);
                let rendered = welcome::render(default_template, user, chat_title);
                gateway.send_text(chat_id, &rendered, buttons).await.map(|_| ())
            }
        },
        None => {
            let rendered = welcome::render(default_template, user, chat_title);
            gateway.send_text(chat_id, &rendered, buttons).await.map(|_| ())
        }
    }
}

/// Replaces the process-wide welcome with `content`.
pub fn store_welcome(
    store: &dyn Store,
    admin_id: i64,
    content: &MessageContent,
    now: DateTime<Utc>,
) -> AppResult<WelcomeMessage> {
    let welcome = WelcomeMessage {
        content: WelcomeContent::from(content),
        updated_by: admin_id,
        updated_at: now,
    };
    store.set_welcome(&welcome)?;
    log::info!("Welcome message updated by admin {}", admin_id);
    Ok(welcome)
}
