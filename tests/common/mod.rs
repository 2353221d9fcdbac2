//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod recorder;

#[allow(unused_imports)]
pub use fixtures::{at, deps, formatted_message, join_request, media_message, private_message, reply_to, ADMIN_ID, CHAT_ID};
#[allow(unused_imports)]
pub use recorder::{Call, RecordingGateway};
