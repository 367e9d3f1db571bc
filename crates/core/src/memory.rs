//! Per-sender conversation memory.
//!
//! Only the last few messages a sender supplied as title-generation content are kept, so a
//! later "regenerate" request can be answered without the user pasting the transcript again.
//! The store is process-local and bounded three ways:
//!
//! - each sender keeps at most `history_capacity` messages (FIFO eviction, newest last);
//! - a sender not written to within `ttl` reads as absent and is purged lazily;
//! - at most `max_senders` senders are tracked; admitting a new sender at the bound first
//!   purges expired senders, then the least recently written one. The bound is re-checked
//!   after the insert, so concurrent admissions cannot leave the store over it.
//!
//! Appends for one sender run under that key's shard lock, so concurrent appends from the
//! same sender are linearizable. There is no ordering across senders.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::config::MemoryConfig;

pub const DEFAULT_HISTORY_CAPACITY: usize = 3;
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_MAX_SENDERS: usize = 10_000;

pub trait ConversationMemory: Send + Sync {
    /// Appends `text` to the sender's history, evicting the oldest entry past capacity.
    fn remember(&self, sender: &str, text: &str);

    /// Most recently remembered text for the sender, or `None` for an unseen sender.
    fn last_input(&self, sender: &str) -> Option<String>;

    fn tracked_senders(&self) -> usize;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryPolicy {
    pub history_capacity: usize,
    /// `None` disables expiry.
    pub ttl: Option<Duration>,
    pub max_senders: usize,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            ttl: Some(DEFAULT_TTL),
            max_senders: DEFAULT_MAX_SENDERS,
        }
    }
}

impl From<&MemoryConfig> for MemoryPolicy {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            history_capacity: config.history_capacity,
            ttl: (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs)),
            max_senders: config.max_senders,
        }
    }
}

#[derive(Debug)]
struct SenderHistory {
    messages: VecDeque<String>,
    written_at: Instant,
}

impl SenderHistory {
    fn new(now: Instant) -> Self {
        Self { messages: VecDeque::new(), written_at: now }
    }

    fn is_expired(&self, now: Instant, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => now.saturating_duration_since(self.written_at) >= ttl,
            None => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct BoundedMemoryStore {
    entries: DashMap<String, SenderHistory>,
    policy: MemoryPolicy,
}

impl BoundedMemoryStore {
    pub fn new(policy: MemoryPolicy) -> Self {
        Self { entries: DashMap::new(), policy }
    }

    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    pub fn remember_at(&self, sender: &str, text: &str, now: Instant) {
        let admitting = !self.entries.contains_key(sender);
        if admitting && self.entries.len() >= self.policy.max_senders {
            self.evict_down_to(self.policy.max_senders.saturating_sub(1), sender, now);
        }

        {
            let mut history = self
                .entries
                .entry(sender.to_owned())
                .or_insert_with(|| SenderHistory::new(now));

            if history.is_expired(now, self.policy.ttl) {
                history.messages.clear();
            }
            history.written_at = now;
            history.messages.push_back(text.to_owned());
            while history.messages.len() > self.policy.history_capacity {
                history.messages.pop_front();
            }
        }

        // Concurrent admissions can each pass the check above before any of them inserts;
        // trim the overshoot once the entry guard is released.
        if self.entries.len() > self.policy.max_senders {
            self.evict_down_to(self.policy.max_senders, sender, now);
        }
    }

    pub fn last_input_at(&self, sender: &str, now: Instant) -> Option<String> {
        let expired = match self.entries.get(sender) {
            None => return None,
            Some(history) if history.is_expired(now, self.policy.ttl) => true,
            Some(history) => return history.messages.back().cloned(),
        };

        if expired {
            self.entries.remove_if(sender, |_, history| history.is_expired(now, self.policy.ttl));
        }
        None
    }

    /// Oldest-first snapshot of a sender's history as of `now`; expired history is empty.
    pub fn history_at(&self, sender: &str, now: Instant) -> Vec<String> {
        self.entries
            .get(sender)
            .filter(|history| !history.is_expired(now, self.policy.ttl))
            .map(|history| history.messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn history(&self, sender: &str) -> Vec<String> {
        self.history_at(sender, Instant::now())
    }

    /// Purges expired senders, then evicts least recently written ones until at most
    /// `limit` remain. `keep` is never chosen for eviction.
    fn evict_down_to(&self, limit: usize, keep: &str, now: Instant) {
        let ttl = self.policy.ttl;
        self.entries.retain(|_, history| !history.is_expired(now, ttl));

        while self.entries.len() > limit {
            // The iterator holds shard read locks; collect the key before removing.
            let oldest = self
                .entries
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().written_at)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(
                event_name = "memory.sender_evicted",
                sender = %oldest,
                max_senders = self.policy.max_senders,
                "evicted least recently written sender"
            );
        }
    }
}

impl ConversationMemory for BoundedMemoryStore {
    fn remember(&self, sender: &str, text: &str) {
        self.remember_at(sender, text, Instant::now());
    }

    fn last_input(&self, sender: &str) -> Option<String> {
        self.last_input_at(sender, Instant::now())
    }

    fn tracked_senders(&self) -> usize {
        self.entries.len()
    }
}
