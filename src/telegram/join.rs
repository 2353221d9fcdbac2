//! Join request approval

use chrono::{DateTime, Utc};

use crate::core::error::AppResult;
use crate::core::types::JoinRequest;
use crate::core::welcome::DEFAULT_JOIN_WELCOME;
use crate::telegram::gateway::{ChatGateway, DeliveryError};
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::welcome::send_welcome;

/// What happened to one join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Approved; `welcomed` is false when the direct message could not be delivered.
    Approved { welcomed: bool },
    /// Someone (or something) already handled this request.
    AlreadyHandled,
    ApproveFailed(DeliveryError),
}

/// Approves the request, records it, and greets the requester.
///
/// Exactly one approve call per request. Delivery problems are logged and
/// reported in the outcome; only store failures are returned as errors.
pub async fn handle_join_request(
    gateway: &dyn ChatGateway,
    deps: &HandlerDeps,
    request: &JoinRequest,
    now: DateTime<Utc>,
) -> AppResult<JoinOutcome> {
    let chat_name = request.chat.title.as_deref().unwrap_or("<untitled>");

    match gateway.approve_join_request(request.chat.id, request.user.id).await {
        Ok(()) => {}
        Err(DeliveryError::AlreadyHandled) => {
            log::info!(
                "Join request of {} in {} was already handled",
                request.user.id,
                request.chat.id
            );
            return Ok(JoinOutcome::AlreadyHandled);
        }
        Err(e) => {
            log::warn!(
                "Failed to approve {} (ID: {}) in {}: {}",
                request.user.first_name,
                request.user.id,
                chat_name,
                e
            );
            deps.store
                .record_failed_approval(&request.chat, &request.user, &e.to_string(), now)?;
            return Ok(JoinOutcome::ApproveFailed(e));
        }
    }

    log::info!(
        "Approved join request for {} (ID: {}) in {}",
        request.user.first_name,
        request.user.id,
        chat_name
    );
    deps.store.record_approval(&request.user, &request.chat, now)?;

    let stored = deps.store.get_welcome()?;
    let sent = send_welcome(
        gateway,
        request.user_chat_id,
        stored.as_ref(),
        &request.user,
        request.chat.title.as_deref(),
        DEFAULT_JOIN_WELCOME,
        &[],
    )
    .await;

    match sent {
        Ok(()) => Ok(JoinOutcome::Approved { welcomed: true }),
        Err(e) => {
            log::warn!("Could not send welcome to {}: {}", request.user.id, e);
            Ok(JoinOutcome::Approved { welcomed: false })
        }
    }
}
