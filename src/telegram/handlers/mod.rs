//! Telegram bot handler tree configuration
//!
//! The dptree schema only converts teloxide updates into domain events and
//! hands them to the handlers in the parent module, which talk to Telegram
//! through [`ChatGateway`](crate::telegram::ChatGateway).

mod schema;
mod types;

pub use schema::schema;
pub use types::{incoming_from_message, join_request_from, HandlerDeps, HandlerError};
