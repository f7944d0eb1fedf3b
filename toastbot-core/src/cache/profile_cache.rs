// File: toastbot-core/src/cache/profile_cache.rs

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::models::UserProfile;

#[derive(Debug, Clone)]
struct CachedProfile {
    profile: UserProfile,
    last_access: DateTime<Utc>,
}

pub const DEFAULT_MAX_PROFILES: usize = 4096;

/// Size-bounded profile cache keyed by user id. When full, the entry with
/// the stalest `last_access` makes room for the newcomer.
pub struct ProfileCache {
    entries: DashMap<String, CachedProfile>,
    max_entries: usize,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_PROFILES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the cached profile and refreshes its access time.
    pub fn get(&self, user_id: &str) -> Option<UserProfile> {
        if let Some(mut entry) = self.entries.get_mut(user_id) {
            entry.last_access = Utc::now();
            Some(entry.profile.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, profile: UserProfile) {
        let key = profile.id.clone();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_stalest();
        }
        self.entries.insert(
            key,
            CachedProfile {
                profile,
                last_access: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_stalest(&self) {
        let mut stalest: Option<(String, DateTime<Utc>)> = None;
        for entry in self.entries.iter() {
            let touched = entry.value().last_access;
            match &stalest {
                Some((_, best)) if *best <= touched => {}
                _ => stalest = Some((entry.key().clone(), touched)),
            }
        }
        if let Some((key, _)) = stalest {
            self.entries.remove(&key);
        }
    }

    /// Test helper
    pub fn test_force_last_access(&self, user_id: &str, hours_ago: i64) -> bool {
        if let Some(mut entry) = self.entries.get_mut(user_id) {
            entry.last_access = Utc::now() - chrono::Duration::hours(hours_ago);
            true
        } else {
            false
        }
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}
