use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::models::domain::{CacheEntry, QuizResult};

/// Process-local store of generated quizzes, keyed by the request's cache key.
#[async_trait]
pub trait QuizCacheRepository: Send + Sync {
    /// The cached result for `key` if it was stored less than the TTL before `now`.
    async fn find_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<QuizResult>;

    /// Store `entry`, replacing whatever was cached under its key.
    async fn store(&self, entry: CacheEntry);

    /// Single-flight guard for `key`; generation for one key runs under this guard.
    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()>;
}

pub struct InMemoryQuizCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    ttl: chrono::Duration,
}

impl InMemoryQuizCache {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub async fn flight_count(&self) -> usize {
        self.flights.lock().await.len()
    }
}

#[async_trait]
impl QuizCacheRepository for InMemoryQuizCache {
    async fn find_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<QuizResult> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.result.clone())
    }

    async fn store(&self, entry: CacheEntry) {
        let mut entries = self.entries.write().await;
        entries.insert(entry.key.clone(), entry);
    }

    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        let flight = {
            let mut flights = self.flights.lock().await;
            // Locks held only by the table have no holder or waiter left.
            flights.retain(|_, lock| Arc::strong_count(lock) > 1);
            flights
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        flight.lock_owned().await
    }
}
