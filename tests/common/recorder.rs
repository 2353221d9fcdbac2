//! Chat gateway that records every call instead of talking to Telegram

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use doorman::core::types::MessageRef;
use doorman::telegram::{ChatGateway, DeliveryError, LinkButton};

/// One recorded Bot API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Approve {
        chat_id: i64,
        user_id: i64,
    },
    SendText {
        chat_id: i64,
        text: String,
        buttons: Vec<String>,
    },
    Copy {
        chat_id: i64,
        source: MessageRef,
        buttons: Vec<String>,
    },
    Edit {
        message: MessageRef,
        text: String,
    },
    Document {
        chat_id: i64,
        file_name: String,
        caption: String,
        content: String,
    },
    IsMember {
        chat_id: i64,
        user_id: i64,
    },
}

/// Records calls; failures and memberships are configured per test.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    /// Deliveries to these chats fail with the given error
    failing_chats: Mutex<HashMap<i64, DeliveryError>>,
    /// Only copies to these chats fail
    failing_copies: Mutex<HashMap<i64, DeliveryError>>,
    approve_error: Mutex<Option<DeliveryError>>,
    members: Mutex<HashSet<i64>>,
    next_message_id: AtomicI32,
}

fn labels(buttons: &[LinkButton]) -> Vec<String> {
    buttons.iter().map(|b| b.text.clone()).collect()
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_chat(&self, chat_id: i64, err: DeliveryError) {
        self.failing_chats.lock().unwrap().insert(chat_id, err);
    }

    pub fn fail_copies(&self, chat_id: i64, err: DeliveryError) {
        self.failing_copies.lock().unwrap().insert(chat_id, err);
    }

    pub fn fail_approvals(&self, err: DeliveryError) {
        *self.approve_error.lock().unwrap() = Some(err);
    }

    pub fn add_member(&self, user_id: i64) {
        self.members.lock().unwrap().insert(user_id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn approvals(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Approve { .. }))
            .count()
    }

    /// Texts sent to `chat_id`, in order
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendText { chat_id: to, text, .. } if to == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text_to(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    /// Button labels of the last text sent to `chat_id`
    pub fn last_buttons_to(&self, chat_id: i64) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendText {
                    chat_id: to, buttons, ..
                } if to == chat_id => Some(buttons),
                _ => None,
            })
            .last()
            .unwrap_or_default()
    }

    /// Copies as (recipient, source)
    pub fn copies(&self) -> Vec<(i64, MessageRef)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Copy { chat_id, source, .. } => Some((chat_id, source)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, chat_id: i64) -> Result<(), DeliveryError> {
        match self.failing_chats.lock().unwrap().get(&chat_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn approve_join_request(&self, chat_id: i64, user_id: i64) -> Result<(), DeliveryError> {
        self.record(Call::Approve { chat_id, user_id });
        let err = self.approve_error.lock().unwrap().clone();
        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn send_text(&self, chat_id: i64, text: &str, buttons: &[LinkButton]) -> Result<MessageRef, DeliveryError> {
        self.record(Call::SendText {
            chat_id,
            text: text.to_string(),
            buttons: labels(buttons),
        });
        self.check(chat_id)?;
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1000;
        Ok(MessageRef::new(chat_id, id))
    }

    async fn copy_message(
        &self,
        chat_id: i64,
        source: MessageRef,
        buttons: &[LinkButton],
    ) -> Result<(), DeliveryError> {
        self.record(Call::Copy {
            chat_id,
            source,
            buttons: labels(buttons),
        });
        if let Some(err) = self.failing_copies.lock().unwrap().get(&chat_id) {
            return Err(err.clone());
        }
        self.check(chat_id)
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        self.record(Call::Edit {
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        data: Vec<u8>,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        self.record(Call::Document {
            chat_id,
            file_name: file_name.to_string(),
            caption: caption.to_string(),
            content: String::from_utf8_lossy(&data).into_owned(),
        });
        self.check(chat_id)
    }

    async fn is_chat_member(&self, chat_id: i64, user_id: i64) -> Result<bool, DeliveryError> {
        self.record(Call::IsMember { chat_id, user_id });
        Ok(self.members.lock().unwrap().contains(&user_id))
    }
}
