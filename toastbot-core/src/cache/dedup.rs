// File: toastbot-core/src/cache/dedup.rs

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};

pub const DEFAULT_MAX_KEYS: usize = 8192;

/// Remembers which event deliveries have already been handled. Bounded:
/// insertion order doubles as the eviction order once the set is full.
#[derive(Debug)]
pub struct DedupSet {
    seen: HashSet<String>,
    order: VecDeque<String>,
    max_keys: usize,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_KEYS)
    }

    pub fn with_capacity(max_keys: usize) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            max_keys: max_keys.max(1),
        }
    }

    /// Key for one delivery: the platform's event id when present, otherwise
    /// kind plus arrival time at millisecond precision. Two id-less events of
    /// the same kind in the same millisecond collapse into one delivery.
    pub fn event_key(kind: &str, event_id: Option<&str>, arrived: DateTime<Utc>) -> String {
        match event_id {
            Some(id) => id.to_string(),
            None => format!("{}-{}", kind, arrived.timestamp_millis()),
        }
    }

    /// True when the key is new. A false return means this delivery was
    /// already handled and should be dropped.
    pub fn insert(&mut self, key: String) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        if self.seen.len() >= self.max_keys {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key.clone());
        self.order.push_back(key);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for DedupSet {
    fn default() -> Self {
        Self::new()
    }
}
