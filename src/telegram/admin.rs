//! Admin-only commands: /stats, /broadcast, /fetch_users, /setwelcome, /cancel

use chrono::{DateTime, Utc};

use crate::core::error::AppResult;
use crate::core::export::{users_to_csv, USERS_CSV_FILE_NAME};
use crate::core::session::PendingInput;
use crate::core::stats::Stats;
use crate::core::types::IncomingMessage;
use crate::telegram::bot::Command;
use crate::telegram::broadcast::{run_broadcast, BROADCAST_CANCELLED_REPLY, BROADCAST_PROMPT, NO_USERS_REPLY};
use crate::telegram::gateway::ChatGateway;
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::welcome::{store_welcome, WELCOME_PROMPT, WELCOME_UPDATED_REPLY};

pub const NOT_ADMIN_REPLY: &str = "Sorry, this command is only available to admins.";

pub const NOTHING_TO_CANCEL_REPLY: &str = "Nothing to cancel.";

pub const WELCOME_CANCELLED_REPLY: &str = "Welcome message update cancelled.";

/// Sends a plain reply; delivery failures are logged and swallowed.
pub async fn reply(gateway: &dyn ChatGateway, chat_id: i64, text: &str) {
    if let Err(e) = gateway.send_text(chat_id, text, &[]).await {
        log::warn!("Failed to reply to {}: {}", chat_id, e);
    }
}

/// Runs an admin command. Non-admins get [`NOT_ADMIN_REPLY`] and nothing else happens.
pub async fn handle_admin_command(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    msg: &IncomingMessage,
    cmd: &Command,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let user_id = msg.from.id;
    let chat_id = msg.chat_id();

    if !deps.is_admin(user_id) {
        log::warn!("User {} tried to use {:?} without permission", user_id, cmd);
        reply(gateway, chat_id, NOT_ADMIN_REPLY).await;
        return Ok(());
    }

    match cmd {
        Command::Stats => handle_stats(gateway, deps, chat_id, now).await,
        Command::FetchUsers => handle_fetch_users(gateway, deps, chat_id).await,
        Command::SetWelcome => handle_set_welcome(gateway, deps, msg, now).await,
        Command::Broadcast => handle_broadcast(gateway, deps, msg).await,
        Command::Cancel => {
            handle_cancel(gateway, deps, user_id, chat_id).await;
            Ok(())
        }
        Command::Start => Ok(()),
    }
}

async fn handle_stats(gateway: &dyn ChatGateway, deps: &HandlerDeps, chat_id: i64, now: DateTime<Utc>) -> AppResult<()> {
    let stats = Stats::gather(deps.store.as_ref(), now)?;
    reply(gateway, chat_id, &stats.render()).await;
    Ok(())
}

async fn handle_fetch_users(gateway: &dyn ChatGateway, deps: &HandlerDeps, chat_id: i64) -> AppResult<()> {
    let users = deps.store.list_users()?;
    if users.is_empty() {
        reply(gateway, chat_id, NO_USERS_REPLY).await;
        return Ok(());
    }

    let csv = users_to_csv(&users);
    let caption = format!("Total users: {}", users.len());
    if let Err(e) = gateway
        .send_document(chat_id, USERS_CSV_FILE_NAME, csv.into_bytes(), &caption)
        .await
    {
        log::error!("Failed to send users export to {}: {}", chat_id, e);
        reply(gateway, chat_id, "Error sending the users file. Check logs for details.").await;
    }
    Ok(())
}

async fn handle_set_welcome(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    msg: &IncomingMessage,
    now: DateTime<Utc>,
) -> AppResult<()> {
    match &msg.reply_to {
        Some(replied) => {
            store_welcome(deps.store.as_ref(), msg.from.id, replied, now)?;
            reply(gateway, msg.chat_id(), WELCOME_UPDATED_REPLY).await;
        }
        None => {
            deps.sessions.begin(msg.from.id, PendingInput::Welcome).await;
            reply(gateway, msg.chat_id(), WELCOME_PROMPT).await;
        }
    }
    Ok(())
}

async fn handle_broadcast(gateway: &dyn ChatGateway, deps: &HandlerDeps, msg: &IncomingMessage) -> AppResult<()> {
    match &msg.reply_to {
        Some(replied) => {
            run_broadcast(gateway, deps, msg.chat_id(), replied.source).await?;
        }
        None => {
            deps.sessions.begin(msg.from.id, PendingInput::Broadcast).await;
            reply(gateway, msg.chat_id(), BROADCAST_PROMPT).await;
        }
    }
    Ok(())
}

async fn handle_cancel(gateway: &dyn ChatGateway, deps: &HandlerDeps, user_id: i64, chat_id: i64) {
    let text = match deps.sessions.take(user_id).await {
        Some(PendingInput::Broadcast) => BROADCAST_CANCELLED_REPLY,
        Some(PendingInput::Welcome) => WELCOME_CANCELLED_REPLY,
        None => NOTHING_TO_CANCEL_REPLY,
    };
    reply(gateway, chat_id, text).await;
}

/// Consumes an admin's pending input with `msg` as payload.
///
/// Returns `false` when the admin had nothing pending (or it expired).
pub async fn consume_pending_input(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    msg: &IncomingMessage,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    match deps.sessions.take(msg.from.id).await {
        Some(PendingInput::Broadcast) => {
            run_broadcast(gateway, deps, msg.chat_id(), msg.content.source).await?;
            Ok(true)
        }
        Some(PendingInput::Welcome) => {
            store_welcome(deps.store.as_ref(), msg.from.id, &msg.content, now)?;
            reply(gateway, msg.chat_id(), WELCOME_UPDATED_REPLY).await;
            Ok(true)
        }
        None => Ok(false),
    }
}
