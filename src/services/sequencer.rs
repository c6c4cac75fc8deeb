use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Keys idle longer than this are forgotten
const KEY_IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_TRACKED_KEYS: u64 = 10_000;

/// Proof that a request started; compared later to detect newer requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    key: String,
    sequence: u64,
}

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Last-request-wins bookkeeping
///
/// Every ticket draws from one monotonically increasing counter and each key
/// (e.g. a client and dashboard section) remembers the latest ticket issued
/// for it. A result is only consumed if its ticket is still that latest one.
///
/// Keys are bounded in number and expire when idle. A key that was evicted
/// while its request was in flight reports that request as current.
pub struct RequestSequencer {
    next: AtomicU64,
    latest: Cache<String, u64>,
}

impl Default for RequestSequencer {
    fn default() -> Self {
        Self::with_limits(MAX_TRACKED_KEYS, KEY_IDLE_TIMEOUT)
    }
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_keys: u64, idle_timeout: Duration) -> Self {
        Self {
            next: AtomicU64::new(0),
            latest: Cache::builder()
                .max_capacity(max_keys)
                .time_to_idle(idle_timeout)
                .build(),
        }
    }

    /// Registers a new request for `key`, superseding any in flight
    pub fn begin(&self, key: &str) -> RequestTicket {
        let sequence = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.insert(key.to_string(), sequence);

        RequestTicket {
            key: key.to_string(),
            sequence,
        }
    }

    /// True while no newer request has begun for the ticket's key
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest
            .get(&ticket.key)
            .map_or(true, |latest| latest == ticket.sequence)
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> u64 {
        self.latest.run_pending_tasks();
        self.latest.entry_count()
    }
}
