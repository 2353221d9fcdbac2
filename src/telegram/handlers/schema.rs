//! Dispatcher schema and handler chain builders

use chrono::Utc;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{ChatJoinRequest, Message};

use super::types::{incoming_from_message, join_request_from, HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::commands::{handle_command, handle_private_message};
use crate::telegram::gateway::TelegramGateway;
use crate::telegram::join::handle_join_request;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Join requests from any chat, commands and other messages from private
/// chats only. Group and channel messages are ignored.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_join = deps.clone();
    let deps_commands = deps.clone();
    let deps_messages = deps;

    dptree::entry()
        .branch(join_request_handler(deps_join))
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
}

/// Handler for chat join requests
fn join_request_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_chat_join_request().endpoint(move |bot: Bot, request: ChatJoinRequest| {
        let deps = deps.clone();
        async move {
            let Some(join_request) = join_request_from(&request) else {
                log::warn!("Ignoring join request with unusable user id {}", request.from.id);
                return Ok(());
            };

            let gateway = TelegramGateway::new(bot);
            let outcome = handle_join_request(&gateway, &deps, &join_request, Utc::now()).await?;
            log::debug!(
                "Join request of {} in {}: {:?}",
                join_request.user.id,
                join_request.chat.id,
                outcome
            );
            Ok(())
        }
    })
}

/// Handler for commands in private chats
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .branch(dptree::entry().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let deps = deps.clone();
                async move {
                    let Some(incoming) = incoming_from_message(&msg) else {
                        return Ok(());
                    };
                    let gateway = TelegramGateway::new(bot);
                    handle_command(&gateway, &deps, &incoming, cmd, Utc::now()).await?;
                    Ok(())
                }
            },
        ))
}

/// Handler for every other private message (pending admin input, activity tracking)
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let Some(incoming) = incoming_from_message(&msg) else {
                    return Ok(());
                };
                let gateway = TelegramGateway::new(bot);
                handle_private_message(&gateway, &deps, &incoming, Utc::now()).await?;
                Ok(())
            }
        })
}
