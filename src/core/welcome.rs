//! Welcome text rendering.
//!
//! Supported placeholders in text welcomes:
//! - `{name}` requester's first name
//! - `{username}` `@username`, or the first name when the user has none
//! - `{id}` numeric user id
//! - `{chat}` title of the chat that was joined (`our channel` outside a join)

use crate::core::types::UserProfile;

/// Sent after an approval when no custom welcome has been set.
pub const DEFAULT_JOIN_WELCOME: &str = "👋 Hello {name}!\nYour request to join {chat} has been approved ✅\n\nSend /start to stay in touch.";

/// Shown by `/start` to regular users when no custom welcome has been set.
pub const DEFAULT_START_WELCOME: &str = "👋 Welcome, {name}!\n\nClick the button below to join our channel.";

const FALLBACK_CHAT_NAME: &str = "our channel";

/// Substitutes placeholders in one pass over `template`, so braces inside
/// names or titles are never expanded again.
pub fn render(template: &str, user: &UserProfile, chat_title: Option<&str>) -> String {
    let username = match &user.username {
        Some(username) => format!("@{}", username),
        None => user.first_name.clone(),
    };
    let id = user.id.to_string();
    let placeholders = [
        ("{name}", user.first_name.as_str()),
        ("{username}", username.as_str()),
        ("{id}", id.as_str()),
        ("{chat}", chat_title.unwrap_or(FALLBACK_CHAT_NAME)),
    ];

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
