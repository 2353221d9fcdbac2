//! Outbound Bot API calls behind a narrow trait.
//!
//! Handlers only talk to [`ChatGateway`], so integration tests can drive them
//! with a recording fake instead of a live bot.

use async_trait::async_trait;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};
use teloxide::{ApiError, RequestError};
use url::Url;

use crate::core::types::MessageRef;
use crate::telegram::Bot;

/// An inline button that opens a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub text: String,
    pub url: Url,
}

impl LinkButton {
    pub fn new(text: impl Into<String>, url: Url) -> Self {
        Self { text: text.into(), url }
    }
}

/// Why a message could not be delivered (or a request could not be applied).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("bot was blocked by the user")]
    Blocked,
    #[error("user is deactivated")]
    UserDeactivated,
    #[error("chat not found")]
    ChatNotFound,
    /// The join request was already approved, declined, or withdrawn.
    #[error("join request already handled")]
    AlreadyHandled,
    #[error("rate limited, retry after {}s", .0.as_secs())]
    RateLimited(Duration),
    #[error("{0}")]
    Other(String),
}

impl DeliveryError {
    /// The recipient can no longer be reached by the bot.
    pub fn is_blocked(&self) -> bool {
        matches!(self, DeliveryError::Blocked | DeliveryError::UserDeactivated)
    }

    /// No message of any kind will reach this chat, so a second attempt is pointless.
    pub fn is_unreachable(&self) -> bool {
        self.is_blocked() || matches!(self, DeliveryError::ChatNotFound)
    }
}

impl From<RequestError> for DeliveryError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(ApiError::BotBlocked) => DeliveryError::Blocked,
            RequestError::Api(ApiError::UserDeactivated) => DeliveryError::UserDeactivated,
            RequestError::Api(ApiError::ChatNotFound) => DeliveryError::ChatNotFound,
            RequestError::Api(ApiError::Unknown(ref text))
                if text.contains("USER_ALREADY_PARTICIPANT") || text.contains("HIDE_REQUESTER_MISSING") =>
            {
                DeliveryError::AlreadyHandled
            }
            RequestError::RetryAfter(secs) => DeliveryError::RateLimited(secs.duration()),
            other => DeliveryError::Other(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn approve_join_request(&self, chat_id: i64, user_id: i64) -> Result<(), DeliveryError>;

    /// Sends plain text, with one button per row.
    async fn send_text(&self, chat_id: i64, text: &str, buttons: &[LinkButton]) -> Result<MessageRef, DeliveryError>;

    /// Copies a stored message, keeping its media and formatting.
    async fn copy_message(&self, chat_id: i64, source: MessageRef, buttons: &[LinkButton])
        -> Result<(), DeliveryError>;

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError>;

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        data: Vec<u8>,
        caption: &str,
    ) -> Result<(), DeliveryError>;

    /// Whether the user is currently in the chat (owner, admin, member, or restricted member).
    async fn is_chat_member(&self, chat_id: i64, user_id: i64) -> Result<bool, DeliveryError>;
}

/// [`ChatGateway`] backed by the throttled teloxide bot.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn user_id(id: i64) -> Result<UserId, DeliveryError> {
    u64::try_from(id)
        .map(UserId)
        .map_err(|_| DeliveryError::Other(format!("invalid user id {}", id)))
}

fn keyboard(buttons: &[LinkButton]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|b| vec![InlineKeyboardButton::url(b.text.clone(), b.url.clone())]),
    ))
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn approve_join_request(&self, chat_id: i64, user_id_raw: i64) -> Result<(), DeliveryError> {
        self.bot
            .approve_chat_join_request(ChatId(chat_id), user_id(user_id_raw)?)
            .await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str, buttons: &[LinkButton]) -> Result<MessageRef, DeliveryError> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        let sent = match keyboard(buttons) {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(MessageRef::new(sent.chat.id.0, sent.id.0))
    }

    async fn copy_message(
        &self,
        chat_id: i64,
        source: MessageRef,
        buttons: &[LinkButton],
    ) -> Result<(), DeliveryError> {
        let request = self
            .bot
            .copy_message(ChatId(chat_id), ChatId(source.chat_id), MessageId(source.message_id));
        match keyboard(buttons) {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), text)
            .await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        data: Vec<u8>,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let file = InputFile::memory(data).file_name(file_name.to_string());
        self.bot
            .send_document(ChatId(chat_id), file)
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn is_chat_member(&self, chat_id: i64, user_id_raw: i64) -> Result<bool, DeliveryError> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), user_id(user_id_raw)?)
            .await?;
        Ok(member.is_present())
    }
}
