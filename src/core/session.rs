use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// What an admin's next message will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    Broadcast,
    Welcome,
}

impl PendingInput {
    pub fn describe(self) -> &'static str {
        match self {
            PendingInput::Broadcast => "broadcast",
            PendingInput::Welcome => "welcome message",
        }
    }
}

/// Per-admin awaiting-input state.
///
/// An admin has at most one pending input; starting a new one replaces the
/// old. Entries older than the TTL are treated as absent and swept by
/// [`spawn_cleanup_task`](Self::spawn_cleanup_task).
#[derive(Clone)]
pub struct PendingInputs {
    entries: Arc<Mutex<HashMap<i64, (PendingInput, Instant)>>>,
    ttl: Option<Duration>,
}

impl PendingInputs {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn is_expired(&self, started: Instant, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| now.duration_since(started) >= ttl)
    }

    /// Puts the admin into awaiting-input, replacing any earlier state.
    pub async fn begin(&self, admin_id: i64, input: PendingInput) {
        let mut entries = self.entries.lock().await;
        entries.insert(admin_id, (input, Instant::now()));
    }

    /// Current state without consuming it.
    pub async fn peek(&self, admin_id: i64) -> Option<PendingInput> {
        let entries = self.entries.lock().await;
        entries
            .get(&admin_id)
            .filter(|(_, started)| !self.is_expired(*started, Instant::now()))
            .map(|(input, _)| *input)
    }

    /// Removes and returns the admin's state. Used both to consume the next
    /// message and for `/cancel`.
    pub async fn take(&self, admin_id: i64) -> Option<PendingInput> {
        let mut entries = self.entries.lock().await;
        let (input, started) = entries.remove(&admin_id)?;
        if self.is_expired(started, Instant::now()) {
            log::debug!("Pending {} for admin {} expired", input.describe(), admin_id);
            return None;
        }
        Some(input)
    }

    /// Drops expired entries, returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, (_, started)| !self.is_expired(*started, now));
        before - entries.len()
    }

    /// Periodically sweeps expired entries. No-op when entries never expire.
    pub fn spawn_cleanup_task(&self, interval: Duration) -> Option<tokio::task::JoinHandle<()>> {
        self.ttl?;
        let sessions = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = sessions.cleanup_expired().await;
                if removed > 0 {
                    log::info!("Expired {} pending admin input(s)", removed);
                }
            }
        }))
    }
}
