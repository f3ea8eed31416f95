//! In-process expiring conversation store.
//!
//! Entries are kept as serialized history bytes in a `DashMap`. Each entry
//! carries an idle deadline (refreshed by `put`, not by `get`) and a
//! recency stamp (refreshed by both) used for least-recently-used eviction
//! once the store exceeds its entry or byte budget.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parley_types::config::ConversationConfig;
use parley_types::dialogue::DialogueHistory;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ConversationStore;

/// Upper bound used when `now + ttl` overflows the clock.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// TTL and capacity bounds for an [`ExpiringConversationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub ttl: Duration,
    pub max_entries: usize,
    pub max_bytes: usize,
}

impl StoreLimits {
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_entries: config.max_entries,
            max_bytes: config.max_bytes,
        }
    }
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self::from_config(&ConversationConfig::default())
    }
}

struct StoredHistory {
    bytes: Vec<u8>,
    expires_at: Instant,
    last_used: u64,
}

impl StoredHistory {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Concurrent TTL + LRU conversation cache.
pub struct ExpiringConversationStore {
    entries: DashMap<String, StoredHistory>,
    limits: StoreLimits,
    /// Sum of `bytes.len()` over all stored entries, live or not yet purged.
    total_bytes: AtomicUsize,
    /// Monotonic recency counter.
    clock: AtomicU64,
}

impl ExpiringConversationStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            entries: DashMap::new(),
            limits,
            total_bytes: AtomicUsize::new(0),
            clock: AtomicU64::new(0),
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Serialized bytes currently held, including expired entries that have
    /// not been purged yet.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes.load(Ordering::SeqCst)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        self.entries.retain(|_, entry| {
            if entry.is_live(now) {
                true
            } else {
                self.total_bytes.fetch_sub(entry.bytes.len(), Ordering::SeqCst);
                purged += 1;
                false
            }
        });
        purged
    }

    /// Run `purge_expired` every `interval` until `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("conversation sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let purged = store.purge_expired();
                        if purged > 0 {
                            debug!(purged, remaining = store.entries.len(), "purged expired conversations");
                        }
                    }
                }
            }
        })
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn deadline(&self, now: Instant) -> Instant {
        now.checked_add(self.limits.ttl)
            .unwrap_or_else(|| now + MAX_TTL)
    }

    fn remove_entry(&self, user: &str) -> Option<StoredHistory> {
        let (_, removed) = self.entries.remove(user)?;
        self.total_bytes
            .fetch_sub(removed.bytes.len(), Ordering::SeqCst);
        Some(removed)
    }

    fn remove_if_expired(&self, user: &str, now: Instant) {
        if let Some((_, removed)) = self.entries.remove_if(user, |_, entry| !entry.is_live(now)) {
            self.total_bytes
                .fetch_sub(removed.bytes.len(), Ordering::SeqCst);
        }
    }

    fn over_capacity(&self) -> bool {
        self.entries.len() > self.limits.max_entries
            || self.total_bytes() > self.limits.max_bytes
    }

    /// Evict until both bounds hold, never touching `keep`.
    fn evict_to_fit(&self, keep: &str) {
        if !self.over_capacity() {
            return;
        }
        self.purge_expired();

        while self.over_capacity() {
            let victim = self
                .entries
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| entry.key().clone());

            let Some(victim) = victim else {
                break;
            };
            if self.remove_entry(&victim).is_some() {
                debug!(user = %victim, "evicted least recently used conversation");
            }
        }
    }
}

impl Default for ExpiringConversationStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}

impl ConversationStore for ExpiringConversationStore {
    fn get(&self, user: &str) -> DialogueHistory {
        let now = Instant::now();
        let lookup = self.entries.get_mut(user).map(|mut entry| {
            if entry.is_live(now) {
                entry.last_used = self.tick();
                Some(entry.bytes.clone())
            } else {
                None
            }
        });

        let bytes = match lookup {
            None => return DialogueHistory::new(),
            Some(None) => {
                self.remove_if_expired(user, now);
                return DialogueHistory::new();
            }
            Some(Some(bytes)) => bytes,
        };

        match DialogueHistory::from_bytes(&bytes) {
            Ok(history) => history,
            Err(e) => {
                warn!(user, error = %e, "undecodable conversation entry, treating as empty");
                DialogueHistory::new()
            }
        }
    }

    fn put(&self, user: &str, history: &DialogueHistory) {
        let bytes = match history.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(user, error = %e, "failed to serialize conversation, not stored");
                return;
            }
        };

        let size = bytes.len();
        if size > self.limits.max_bytes {
            warn!(
                user,
                size,
                max_bytes = self.limits.max_bytes,
                "conversation larger than store capacity, not stored"
            );
            // Drop the stale entry so later reads do not see an older history.
            self.remove_entry(user);
            return;
        }

        let entry = StoredHistory {
            bytes,
            expires_at: self.deadline(Instant::now()),
            last_used: self.tick(),
        };
        self.total_bytes.fetch_add(size, Ordering::SeqCst);
        if let Some(old) = self.entries.insert(user.to_string(), entry) {
            self.total_bytes.fetch_sub(old.bytes.len(), Ordering::SeqCst);
        }

        self.evict_to_fit(user);
    }

    fn clear(&self, user: &str) -> bool {
        let now = Instant::now();
        self.remove_entry(user)
            .is_some_and(|removed| removed.is_live(now))
    }

    fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .count()
    }
}
