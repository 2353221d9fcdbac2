//! Broadcast dispatcher: copies one message to every known user

use std::time::{Duration, Instant};

use crate::core::config;
use crate::core::error::AppResult;
use crate::core::types::MessageRef;
use crate::telegram::gateway::ChatGateway;
use crate::telegram::handlers::HandlerDeps;

pub const BROADCAST_PROMPT: &str = "Please send the message you want to broadcast to all users.\n\n\
You can send text, images, videos, or any other content.\n\
To cancel, send /cancel\n\n\
TIP: You can also reply to any message with /broadcast to send it to all users.";

pub const BROADCAST_CANCELLED_REPLY: &str = "Broadcast cancelled.";

pub const NO_USERS_REPLY: &str = "No users found in database.";

/// Running outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastTally {
    pub total: usize,
    pub delivered: usize,
    /// Recipients who blocked the bot or deleted their account.
    pub blocked: usize,
    pub other_errors: usize,
}

impl BroadcastTally {
    pub fn failed(&self) -> usize {
        self.blocked + self.other_errors
    }

    pub fn processed(&self) -> usize {
        self.delivered + self.failed()
    }

    fn progress_text(&self) -> String {
        format!(
            "Broadcasting... {}/{}\nDelivered: {}\nFailed: {}",
            self.processed(),
            self.total,
            self.delivered,
            self.failed()
        )
    }

    fn report_text(&self, elapsed: Duration) -> String {
        let secs = elapsed.as_secs_f64();
        let speed = if secs > 0.0 { self.processed() as f64 / secs } else { self.processed() as f64 };
        format!(
            "✅ Broadcast completed\n\n\
             Total users: {}\n\
             Delivered: {}\n\
             Failed: {} (blocked: {}, other: {})\n\
             Time taken: {:.1}s\n\
             Average speed: {:.1} users/sec",
            self.total,
            self.delivered,
            self.failed(),
            self.blocked,
            self.other_errors,
            secs,
            speed
        )
    }
}

/// Shows `text` in the status message, or sends it fresh if there is none.
async fn update_status(gateway: &dyn ChatGateway, admin_chat_id: i64, status: Option<MessageRef>, text: &str) {
    let result = match status {
        Some(message) => gateway.edit_text(message, text).await,
        None => gateway.send_text(admin_chat_id, text, &[]).await.map(|_| ()),
    };
    if let Err(e) = result {
        log::warn!("Failed to update broadcast status for {}: {}", admin_chat_id, e);
    }
}

/// Copies `source` to every stored user, one at a time.
///
/// A failed delivery is counted and skipped; nothing is retried. Pacing is
/// left to the bot's throttling adaptor.
pub async fn run_broadcast(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    admin_chat_id: i64,
    source: MessageRef,
) -> AppResult<BroadcastTally> {
    let status = match gateway
        .send_text(admin_chat_id, "Preparing to broadcast... Fetching users...", &[])
        .await
    {
        Ok(message) => Some(message),
        Err(e) => {
            log::warn!("Failed to send broadcast status to {}: {}", admin_chat_id, e);
            None
        }
    };

    let users = deps.store.list_users()?;
    let mut tally = BroadcastTally {
        total: users.len(),
        ..Default::default()
    };

    if users.is_empty() {
        update_status(gateway, admin_chat_id, status, NO_USERS_REPLY).await;
        return Ok(tally);
    }

    log::info!(
        "Broadcasting message {:?} to {} users for {}",
        source,
        tally.total,
        admin_chat_id
    );
    update_status(
        gateway,
        admin_chat_id,
        status,
        &format!("Starting broadcast to {} users...", tally.total),
    )
    .await;

    let started = Instant::now();
    for user in &users {
        match gateway.copy_message(user.user_id, source, &[]).await {
            Ok(()) => tally.delivered += 1,
            Err(e) if e.is_blocked() => {
                log::debug!("Broadcast skipped {}: {}", user.user_id, e);
                tally.blocked += 1;
            }
            Err(e) => {
                log::warn!("Broadcast to {} failed: {}", user.user_id, e);
                tally.other_errors += 1;
            }
        }

        if tally.processed() % config::broadcast::PROGRESS_EVERY == 0 && tally.processed() < tally.total {
            update_status(gateway, admin_chat_id, status, &tally.progress_text()).await;
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "Broadcast finished: {} delivered, {} blocked, {} other errors in {:.1}s",
        tally.delivered,
        tally.blocked,
        tally.other_errors,
        elapsed.as_secs_f64()
    );
    update_status(gateway, admin_chat_id, status, &tally.report_text(elapsed)).await;

    Ok(tally)
}
