//! Result Cache
//!
//! Keeps the module chunks of finished streaming runs, keyed by normalized
//! topic, so repeat requests can be replayed without touching the
//! generator or the video search. Storage is pluggable through
//! [`CacheStore`]; eviction is governed by an [`EvictionPolicy`].
//!
//! The cache also tracks runs that are still in flight. With single-flight
//! enabled, a request for a topic that is already being computed waits for
//! that run instead of starting its own.

use crate::course::Module;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use tokio::sync::watch;
use tracing::{debug, info};

/// The stored result of one completed run, shared read-only between replays.
pub type CachedModules = Arc<Vec<Module>>;

/// Storage backend for finished runs.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedModules>;
    /// Stores `modules` under `key`, replacing any previous value.
    fn put(&self, key: &str, modules: CachedModules);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Limits applied by [`InMemoryStore`]. `None` means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Once exceeded, the oldest inserted entries are dropped.
    pub max_entries: Option<usize>,
    /// Entries older than this are treated as missing.
    pub ttl: Option<Duration>,
}

struct StoredEntry {
    modules: CachedModules,
    inserted_at: Instant,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, StoredEntry>,
    order: VecDeque<String>,
}

/// Process-local storage. Contents are lost on restart.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    policy: EvictionPolicy,
}

impl InMemoryStore {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &StoredEntry) -> bool {
        self.policy
            .ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(EvictionPolicy::default())
    }
}

impl CacheStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<CachedModules> {
        let mut state = self.lock();
        let expired = self.is_expired(state.entries.get(key)?);
        if expired {
            debug!(key, "Cache entry expired");
            state.entries.remove(key);
            state.order.retain(|k| k != key);
            return None;
        }
        state.entries.get(key).map(|entry| entry.modules.clone())
    }

    fn put(&self, key: &str, modules: CachedModules) {
        let mut state = self.lock();
        let entry = StoredEntry {
            modules,
            inserted_at: Instant::now(),
        };
        if state.entries.insert(key.to_string(), entry).is_some() {
            state.order.retain(|k| k != key);
        }
        state.order.push_back(key.to_string());

        if let Some(max) = self.policy.max_entries {
            while state.entries.len() > max.max(1) {
                let Some(oldest) = state.order.pop_front() else {
                    break;
                };
                debug!(key = %oldest, "Evicting cache entry");
                state.entries.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

type FlightSignal = Option<CachedModules>;

/// Result of [`ResultCache::begin`].
pub enum Lookup {
    /// The topic is cached; replay these modules.
    Hit(CachedModules),
    /// Nobody is computing this topic; the caller must, and reports through the guard.
    Leader(FlightGuard),
    /// Another request is computing this topic; wait for it.
    Follower(FlightWaiter),
}

/// The shared result cache service.
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    in_flight: Mutex<HashMap<String, watch::Receiver<FlightSignal>>>,
    single_flight: bool,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, single_flight: bool) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashMap::new()),
            single_flight,
        }
    }

    /// An unbounded in-memory cache with single-flight enabled.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::default()), true)
    }

    pub fn get(&self, key: &str) -> Option<CachedModules> {
        self.store.get(key)
    }

    pub fn put(&self, key: &str, modules: CachedModules) {
        self.store.put(key, modules);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, watch::Receiver<FlightSignal>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Looks `key` up and, on a miss, decides whether the caller computes it.
    pub fn begin(self: &Arc<Self>, key: &str) -> Lookup {
        if !self.single_flight {
            return match self.get(key) {
                Some(modules) => Lookup::Hit(modules),
                None => Lookup::Leader(FlightGuard::untracked(self.clone(), key)),
            };
        }

        let mut in_flight = self.lock_in_flight();
        if let Some(modules) = self.get(key) {
            return Lookup::Hit(modules);
        }
        if let Some(rx) = in_flight.get(key) {
            info!(key, "Topic already in flight, waiting for it");
            return Lookup::Follower(FlightWaiter { rx: rx.clone() });
        }
        let (tx, rx) = watch::channel(None);
        in_flight.insert(key.to_string(), rx);
        Lookup::Leader(FlightGuard {
            cache: self.clone(),
            key: key.to_string(),
            tx: Some(tx),
        })
    }
}

/// Held by the request that computes a topic.
///
/// Dropping the guard without calling [`FlightGuard::complete`] releases any
/// waiting followers empty-handed.
pub struct FlightGuard {
    cache: Arc<ResultCache>,
    key: String,
    tx: Option<watch::Sender<FlightSignal>>,
}

impl FlightGuard {
    fn untracked(cache: Arc<ResultCache>, key: &str) -> Self {
        Self {
            cache,
            key: key.to_string(),
            tx: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stores the finished run and hands it to any followers.
    pub fn complete(mut self, modules: Vec<Module>) -> CachedModules {
        let modules = Arc::new(modules);
        self.cache.put(&self.key, modules.clone());
        info!(key = %self.key, modules = modules.len(), "Saved results to cache");
        self.release(Some(modules.clone()));
        modules
    }

    fn release(&mut self, outcome: FlightSignal) {
        if let Some(tx) = self.tx.take() {
            self.cache.lock_in_flight().remove(&self.key);
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.release(None);
    }
}

/// Held by a request waiting on another request's run.
pub struct FlightWaiter {
    rx: watch::Receiver<FlightSignal>,
}

impl FlightWaiter {
    /// Waits for the leader. `None` means it finished without a result.
    pub async fn wait(mut self) -> Option<CachedModules> {
        if self.rx.borrow().is_some() {
            return self.rx.borrow().clone();
        }
        match self.rx.changed().await {
            Ok(()) => self.rx.borrow().clone(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(title: &str) -> Module {
        Module {
            module_title: title.to_string(),
            lessons: Vec::new(),
        }
    }

    fn modules(titles: &[&str]) -> CachedModules {
        Arc::new(titles.iter().map(|t| module(t)).collect())
    }

    #[test]
    fn test_store_get_put_and_overwrite() {
        let store = InMemoryStore::default();
        assert!(store.get("black holes").is_none());

        store.put("black holes", modules(&["A"]));
        store.put("black holes", modules(&["B"]));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("black holes").unwrap()[0].module_title, "B");
    }

    #[test]
    fn test_store_evicts_oldest_beyond_capacity() {
        let store = InMemoryStore::new(EvictionPolicy {
            max_entries: Some(2),
            ttl: None,
        });
        store.put("one", modules(&["1"]));
        store.put("two", modules(&["2"]));
        store.put("three", modules(&["3"]));

        assert_eq!(store.len(), 2);
        assert!(store.get("one").is_none());
        assert!(store.get("two").is_some());
        assert!(store.get("three").is_some());
    }

    #[test]
    fn test_store_rewrite_refreshes_insertion_order() {
        let store = InMemoryStore::new(EvictionPolicy {
            max_entries: Some(2),
            ttl: None,
        });
        store.put("one", modules(&["1"]));
        store.put("two", modules(&["2"]));
        store.put("one", modules(&["1b"]));
        store.put("three", modules(&["3"]));

        assert!(store.get("two").is_none());
        assert_eq!(store.get("one").unwrap()[0].module_title, "1b");
    }

    #[test]
    fn test_store_expires_entries_after_ttl() {
        let store = InMemoryStore::new(EvictionPolicy {
            max_entries: None,
            ttl: Some(Duration::from_millis(20)),
        });
        store.put("short lived", modules(&["A"]));
        assert!(store.get("short lived").is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert!(store.get("short lived").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_first_begin_leads_and_second_follows() {
        let cache = Arc::new(ResultCache::in_memory());

        let leader = cache.begin("rust");
        assert!(matches!(leader, Lookup::Leader(_)));
        assert!(matches!(cache.begin("rust"), Lookup::Follower(_)));
        assert!(matches!(cache.begin("go"), Lookup::Leader(_)));
    }

    #[tokio::test]
    async fn test_follower_receives_leader_result() {
        let cache = Arc::new(ResultCache::in_memory());
        let Lookup::Leader(guard) = cache.begin("rust") else {
            panic!("Expected to lead");
        };
        let Lookup::Follower(waiter) = cache.begin("rust") else {
            panic!("Expected to follow");
        };

        let waiting = tokio::spawn(waiter.wait());
        guard.complete(vec![module("Ownership")]);

        let replayed = waiting.await.unwrap().unwrap();
        assert_eq!(replayed[0].module_title, "Ownership");
        assert!(matches!(cache.begin("rust"), Lookup::Hit(_)));
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_followers_without_result() {
        let cache = Arc::new(ResultCache::in_memory());
        let Lookup::Leader(guard) = cache.begin("rust") else {
            panic!("Expected to lead");
        };
        let Lookup::Follower(waiter) = cache.begin("rust") else {
            panic!("Expected to follow");
        };

        drop(guard);

        assert!(waiter.wait().await.is_none());
        assert!(cache.is_empty());
        // The in-flight marker is gone, so the next request leads again.
        assert!(matches!(cache.begin("rust"), Lookup::Leader(_)));
    }

    #[test]
    fn test_without_single_flight_every_miss_leads() {
        let cache = Arc::new(ResultCache::new(Arc::new(InMemoryStore::default()), false));

        let first = cache.begin("rust");
        let second = cache.begin("rust");
        assert!(matches!(first, Lookup::Leader(_)));
        assert!(matches!(second, Lookup::Leader(_)));

        if let Lookup::Leader(guard) = second {
            guard.complete(vec![module("Traits")]);
        }
        assert!(matches!(cache.begin("rust"), Lookup::Hit(_)));
    }
}
