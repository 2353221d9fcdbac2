//! Statistics derived from the user and chat tables at query time.

use chrono::{DateTime, Duration, Utc};

use crate::core::error::AppResult;
use crate::core::types::{ApprovalEvent, ChatRecord, UserRecord};
use crate::storage::Store;

/// Days covered by the weekly approval count, today included.
const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatStats {
    pub chat_id: i64,
    pub title: Option<String>,
    pub approved: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stats {
    pub total_users: usize,
    pub total_approvals: u64,
    pub joined_today: usize,
    pub active_today: usize,
    /// Approval events today; a returning user counts again.
    pub approved_today: usize,
    /// Approval events since the start of the day seven days ago.
    pub approved_last_7_days: usize,
    /// Failed approve calls over the whole event log.
    pub total_errors: u64,
    /// Most approvals first.
    pub chats: Vec<ChatStats>,
}

/// Start of the UTC day containing `now`.
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}

/// Oldest event the weekly count looks at.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now) - Duration::days(WEEK_DAYS)
}

impl Stats {
    /// Reads everything `compute` needs from the store.
    pub fn gather(store: &dyn Store, now: DateTime<Utc>) -> AppResult<Self> {
        let users = store.list_users()?;
        let chats = store.list_chats()?;
        let events = store.list_approval_events(week_start(now))?;
        let total_errors = store.count_approval_errors()?;
        Ok(Self::compute(&users, &chats, &events, total_errors, now))
    }

    pub fn compute(
        users: &[UserRecord],
        chats: &[ChatRecord],
        events: &[ApprovalEvent],
        total_errors: u64,
        now: DateTime<Utc>,
    ) -> Self {
        let today = start_of_day(now);
        let week = week_start(now);
        let approved_since = |from: DateTime<Utc>| events.iter().filter(|e| e.approved && e.at >= from).count();

        let mut chat_stats: Vec<ChatStats> = chats
            .iter()
            .map(|chat| ChatStats {
                chat_id: chat.chat_id,
                title: chat.title.clone(),
                approved: chat.approved_count,
                failed: chat.failed_count,
            })
            .collect();
        chat_stats.sort_by(|a, b| b.approved.cmp(&a.approved).then(a.chat_id.cmp(&b.chat_id)));

        Self {
            total_users: users.len(),
            total_approvals: users.iter().map(|u| u64::from(u.approval_count)).sum(),
            joined_today: users.iter().filter(|u| u.joined_at >= today).count(),
            active_today: users.iter().filter(|u| u.last_seen_at >= today).count(),
            approved_today: approved_since(today),
            approved_last_7_days: approved_since(week),
            total_errors,
            chats: chat_stats,
        }
    }

    /// Plain-text report used by `/stats` and the `stats` subcommand.
    pub fn render(&self) -> String {
        let mut out = String::from("📊 Statistics\n\n");
        out.push_str(&format!("Total users: {}\n", self.total_users));
        out.push_str(&format!("Total approvals: {}\n", self.total_approvals));
        out.push_str(&format!("Joined today: {}\n", self.joined_today));
        out.push_str(&format!("Active today: {}\n", self.active_today));
        out.push_str(&format!("Approved today: {}\n", self.approved_today));
        out.push_str(&format!("Approved last 7 days: {}\n", self.approved_last_7_days));
        out.push_str(&format!("Total errors: {}\n", self.total_errors));

        if !self.chats.is_empty() {
            out.push_str("\nChats:\n");
            for chat in &self.chats {
                let name = chat.title.clone().unwrap_or_else(|| chat.chat_id.to_string());
                out.push_str(&format!("• {}: {} approved", name, chat.approved));
                if chat.failed > 0 {
                    out.push_str(&format!(", {} failed", chat.failed));
                }
                out.push('\n');
            }
        }

        out
    }
}
