//! Bounded in-memory cache of parsed upstream responses.
//!
//! Keys are the exact outbound URL after relay wrapping, so the same quote
//! fetched through two relays occupies two entries. Eviction is
//! least-recently-used. Only idempotent GET fetches go through here.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::data_source::SourceError;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 256;

/// Hit/miss counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
struct CacheEntry {
    value: Arc<Value>,
    stored_at: Instant,
    tick: u64,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    // tick -> key; the smallest tick is the least recently used entry.
    recency: BTreeMap<u64, String>,
    next_tick: u64,
    capacity: usize,
    ttl: Option<Duration>,
    stats: CacheStats,
}

impl CacheInner {
    fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            map: HashMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            recency: BTreeMap::new(),
            next_tick: 0,
            capacity,
            ttl,
            stats: CacheStats::default(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn get(&mut self, key: &str) -> Option<Arc<Value>> {
        let expired = match (self.map.get(key), self.ttl) {
            (None, _) => {
                self.stats.misses += 1;
                return None;
            }
            (Some(entry), Some(ttl)) => entry.stored_at.elapsed() > ttl,
            (Some(_), None) => false,
        };

        if expired {
            self.remove(key);
            self.stats.misses += 1;
            return None;
        }

        let tick = self.tick();
        let entry = self.map.get_mut(key)?;
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        self.recency.insert(tick, key.to_owned());
        self.stats.hits += 1;
        Some(Arc::clone(&entry.value))
    }

    fn put(&mut self, key: String, value: Arc<Value>) {
        if self.capacity == 0 {
            return;
        }

        self.remove(&key);
        while self.map.len() >= self.capacity {
            if !self.evict_lru() {
                break;
            }
        }

        let tick = self.tick();
        self.recency.insert(tick, key.clone());
        self.map.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                tick,
            },
        );
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.map.remove(key) {
            self.recency.remove(&entry.tick);
        }
    }

    fn evict_lru(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        self.map.remove(&key);
        self.stats.evictions += 1;
        true
    }
}

/// Thread-safe LRU cache shared by every outbound GET of the engine.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, None)
    }
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// With `ttl` set, entries older than it count as misses. A capacity of
    /// zero disables caching.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::new(capacity, ttl))),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, None)
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached body for `url`, or run `fetch` and remember its result.
    ///
    /// Failed fetches are not cached. The lock is not held while `fetch`
    /// runs, so two concurrent misses on one URL may both fetch; the later
    /// write wins.
    pub async fn get_or_fetch<F, Fut>(&self, url: &str, fetch: F) -> Result<Arc<Value>, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, SourceError>>,
    {
        if let Some(value) = self.get(url) {
            return Ok(value);
        }

        let value = Arc::new(fetch().await?);
        self.put(url.to_owned(), Arc::clone(&value));
        Ok(value)
    }

    pub fn get(&self, url: &str) -> Option<Arc<Value>> {
        self.lock().get(url)
    }

    pub fn put(&self, url: String, value: Arc<Value>) {
        self.lock().put(url, value);
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    fn value(n: i64) -> Arc<Value> {
        Arc::new(json!({ "n": n }))
    }

    #[tokio::test]
    async fn second_fetch_of_same_url_is_a_hit() {
        let cache = ResponseCache::default();
        let fetches = AtomicUsize::new(0);
        let counter = &fetches;

        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "price": 190.12 }))
        };

        let first = cache.get_or_fetch("https://a.test/q", fetch).await.expect("fetch");
        let second = cache.get_or_fetch("https://a.test/q", fetch).await.expect("hit");

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, evictions: 0 });
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache = ResponseCache::default();

        let error = cache
            .get_or_fetch("https://a.test/q", || async { Err(SourceError::no_data("empty")) })
            .await
            .expect_err("fetch fails");
        assert_eq!(error.message(), "empty");
        assert!(cache.is_empty());

        let value = cache
            .get_or_fetch("https://a.test/q", || async { Ok(json!(1)) })
            .await
            .expect("retry fetches again");
        assert_eq!(*value, json!(1));
    }

    #[test]
    fn evicts_least_recently_used_entry() {
        let cache = ResponseCache::new(2, None);
        cache.put("a".into(), value(1));
        cache.put("b".into(), value(2));

        // Touch "a" so "b" becomes the eviction candidate.
        assert!(cache.get("a").is_some());
        cache.put("c".into(), value(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a"), Some(value(1)));
        assert_eq!(cache.get("c"), Some(value(3)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn overwriting_a_key_does_not_evict() {
        let cache = ResponseCache::new(2, None);
        cache.put("a".into(), value(1));
        cache.put("b".into(), value(2));
        cache.put("a".into(), value(10));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(value(10)));
        assert_eq!(cache.get("b"), Some(value(2)));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test]
    async fn ttl_expires_entries() {
        let cache = ResponseCache::new(8, Some(Duration::from_millis(50)));
        cache.put("a".into(), value(1));
        assert!(cache.get("a").is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = ResponseCache::disabled();
        cache.put("a".into(), value(1));

        assert!(cache.get("a").is_none());
        assert_eq!(cache.capacity(), 0);
    }

    #[tokio::test]
    async fn concurrent_writers_keep_bookkeeping_consistent() {
        let cache = ResponseCache::new(16, None);
        let mut handles = Vec::new();

        for task in 0..8_i64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..200_i64 {
                    let key = format!("k{}", (task * 7 + i) % 40);
                    if cache.get(&key).is_none() {
                        cache.put(key, value(i));
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.expect("task completes");
        }

        let inner = cache.lock();
        assert!(inner.map.len() <= 16);
        assert_eq!(inner.map.len(), inner.recency.len());
        for (tick, key) in &inner.recency {
            assert_eq!(inner.map.get(key).map(|entry| entry.tick), Some(*tick));
        }
    }
}
