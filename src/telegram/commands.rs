//! Command routing, /start, and plain private messages

use chrono::{DateTime, Utc};
use indoc::indoc;
use url::Url;

use crate::core::error::AppResult;
use crate::core::types::IncomingMessage;
use crate::core::welcome::DEFAULT_START_WELCOME;
use crate::telegram::admin::{consume_pending_input, handle_admin_command, reply};
use crate::telegram::bot::Command;
use crate::telegram::gateway::{ChatGateway, LinkButton};
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::welcome::send_welcome;

const ADMIN_START_TEXT: &str = indoc! {"
    Welcome, Admin! 👨‍💼

    You can manage the bot with the commands below:
    /stats - View detailed stats
    /broadcast - Send message to all users
    /fetch_users - Get all users info
    /setwelcome - Set custom welcome message for users
    /cancel - Cancel a pending broadcast or welcome input"};

/// Entry point for every recognised command in a private chat.
pub async fn handle_command(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    msg: &IncomingMessage,
    cmd: Command,
    now: DateTime<Utc>,
) -> AppResult<()> {
    log::info!("🎯 Received command: {:?} from user {}", cmd, msg.from.id);

    if cmd.is_admin_only() {
        handle_admin_command(gateway, deps, msg, &cmd, now).await
    } else {
        handle_start(gateway, deps, msg, now).await
    }
}

fn deep_link(bot_username: &str, param: &str) -> Option<Url> {
    Url::parse(&format!("https://t.me/{}?{}=true", bot_username, param)).ok()
}

/// Buttons offered to admins: add the bot to a channel or a group.
fn admin_buttons(deps: &HandlerDeps) -> Vec<LinkButton> {
    let Some(username) = deps.bot_username.as_deref() else {
        return Vec::new();
    };
    [("Add me to channel", "startchannel"), ("Add me to group", "startgroup")]
        .into_iter()
        .filter_map(|(text, param)| deep_link(username, param).map(|url| LinkButton::new(text, url)))
        .collect()
}

/// "Join Our Channel", or "Open channel" for users already in it.
async fn channel_buttons(gateway: &dyn ChatGateway, deps: &HandlerDeps, user_id: i64) -> Vec<LinkButton> {
    let Some(link) = deps.channel_link.clone() else {
        return Vec::new();
    };

    let is_member = match deps.channel_id {
        Some(channel_id) => match gateway.is_chat_member(channel_id, user_id).await {
            Ok(member) => member,
            Err(e) => {
                log::warn!("Membership check for {} in {} failed: {}", user_id, channel_id, e);
                false
            }
        },
        None => false,
    };

    let text = if is_member { "Open channel" } else { "Join Our Channel" };
    vec![LinkButton::new(text, link)]
}

/// `/start`: records the user, then shows the admin overview or the welcome.
pub async fn handle_start(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    msg: &IncomingMessage,
    now: DateTime<Utc>,
) -> AppResult<()> {
    deps.store.touch_user(&msg.from, now)?;

    if deps.is_admin(msg.from.id) {
        if let Err(e) = gateway
            .send_text(msg.chat_id(), ADMIN_START_TEXT, &admin_buttons(deps))
            .await
        {
            log::warn!("Failed to send admin overview to {}: {}", msg.from.id, e);
        }
        return Ok(());
    }

    let buttons = channel_buttons(gateway, deps, msg.from.id).await;
    let stored = deps.store.get_welcome()?;
    if let Err(e) = send_welcome(
        gateway,
        msg.chat_id(),
        stored.as_ref(),
        &msg.from,
        None,
        DEFAULT_START_WELCOME,
        &buttons,
    )
    .await
    {
        log::warn!("Failed to send welcome to {}: {}", msg.from.id, e);
    }
    Ok(())
}

/// Any other private message. Admins with a pending input have it consumed;
/// everyone else is just recorded as active.
pub async fn handle_private_message(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    msg: &IncomingMessage,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let is_command = msg.content.text.as_deref().is_some_and(|t| t.starts_with('/'));

    if !is_command && deps.is_admin(msg.from.id) && consume_pending_input(gateway, deps, msg, now).await? {
        return Ok(());
    }

    deps.store.touch_user(&msg.from, now)?;
    if is_command {
        reply(gateway, msg.chat_id(), "Unknown command. Send /start to see what I can do.").await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::PendingInputs;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_admin_buttons_need_username() {
        let deps = HandlerDeps::new(Arc::new(MemoryStore::new()), PendingInputs::new(None), [1]);
        assert!(admin_buttons(&deps).is_empty());

        let deps = deps.with_bot_username(Some("doorman_bot".to_string()));
        let buttons = admin_buttons(&deps);
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].url.as_str(), "https://t.me/doorman_bot?startchannel=true");
        assert_eq!(buttons[1].url.as_str(), "https://t.me/doorman_bot?startgroup=true");
    }

    #[test]
    fn test_admin_start_text_lists_commands() {
        for cmd in ["/stats", "/broadcast", "/fetch_users", "/setwelcome", "/cancel"] {
            assert!(ADMIN_START_TEXT.contains(cmd), "missing {}", cmd);
        }
    }
}
