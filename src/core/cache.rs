//! Optional TTL memoization of rollup responses.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::core::response::RollupResponse;

/// Upper bound for configured TTLs (about a century).
const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

struct CacheEntry {
    response: RollupResponse,
    stored_at: DateTime<Utc>,
}

/// Responses keyed by dataset id and canonical request encoding. Entries
/// expire after `ttl` and are pruned on every insert; registering a
/// dataset again invalidates its entries.
pub struct RollupCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, String), CacheEntry>>,
}

impl RollupCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(MAX_TTL_SECS).min(MAX_TTL_SECS);
        Self::new(Duration::seconds(secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, dataset_id: &str, request_key: &str) -> Option<RollupResponse> {
        self.get_at(dataset_id, request_key, Utc::now())
    }

    pub fn get_at(
        &self,
        dataset_id: &str,
        request_key: &str,
        now: DateTime<Utc>,
    ) -> Option<RollupResponse> {
        let mut entries = self.entries.lock().ok()?;
        let key = (dataset_id.to_string(), request_key.to_string());
        let fresh = entries
            .get(&key)
            .map(|entry| now - entry.stored_at < self.ttl)?;
        if fresh {
            entries.get(&key).map(|entry| entry.response.clone())
        } else {
            entries.remove(&key);
            None
        }
    }

    pub fn insert(&self, dataset_id: &str, request_key: &str, response: RollupResponse) {
        self.insert_at(dataset_id, request_key, response, Utc::now());
    }

    pub fn insert_at(
        &self,
        dataset_id: &str,
        request_key: &str,
        response: RollupResponse,
        now: DateTime<Utc>,
    ) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, entry| now - entry.stored_at < ttl);
            entries.insert(
                (dataset_id.to_string(), request_key.to_string()),
                CacheEntry {
                    response,
                    stored_at: now,
                },
            );
        }
    }

    /// Drops every entry of `dataset_id`, returning how many were removed.
    pub fn invalidate(&self, dataset_id: &str) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|(dataset, _), _| dataset != dataset_id);
        before - entries.len()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
