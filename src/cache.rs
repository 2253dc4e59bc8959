//! In-memory TTL + LRU caches for single-entity lookups.
//!
//! Each resource kind (users, organizations, tickets, articles) gets its own
//! [`Cache`] with its own ttl and size bound. Expiry is lazy: a stale entry is
//! dropped when it is read. When an insert pushes the cache over its bound the
//! least recently used entry is evicted in the same critical section.
//!
//! Concurrent misses for the same key share one fetch: the first caller
//! registers a [`Shared`] future, later callers await a clone of it. Batch
//! lookups register one such future per key, all backed by the same request.

use crate::{Error, Result};
use futures::future::{join_all, BoxFuture, FutureExt, Shared, TryFutureExt};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Ttl and size bound of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// How long an entry stays fresh.
    pub ttl: Duration,
    /// Maximum number of entries; zero stores nothing.
    pub max_size: usize,
}

impl CacheSettings {
    /// Creates settings from a ttl and a size bound.
    pub const fn new(ttl: Duration, max_size: usize) -> Self {
        Self { ttl, max_size }
    }
}

/// Cache configuration for every resource kind.
///
/// # Examples
///
/// ```
/// use deskwire::cache::{CacheConfig, CacheSettings};
/// use std::time::Duration;
///
/// let config = CacheConfig {
///     tickets: CacheSettings::new(Duration::from_secs(10), 100),
///     ..CacheConfig::default()
/// };
/// assert_eq!(config.users.ttl, Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When `false` every lookup fetches and nothing is stored.
    pub enabled: bool,
    /// Users: 5 minutes, 1000 entries.
    pub users: CacheSettings,
    /// Organizations: 10 minutes, 500 entries.
    pub organizations: CacheSettings,
    /// Tickets: 1 minute, 1000 entries.
    pub tickets: CacheSettings,
    /// Help center articles: 15 minutes, 500 entries.
    pub articles: CacheSettings,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            users: CacheSettings::new(Duration::from_secs(300), 1000),
            organizations: CacheSettings::new(Duration::from_secs(600), 500),
            tickets: CacheSettings::new(Duration::from_secs(60), 1000),
            articles: CacheSettings::new(Duration::from_secs(900), 500),
        }
    }
}

impl CacheConfig {
    /// A configuration with caching turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Counters and occupancy of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered without a new fetch (including joins of an in-flight fetch).
    pub hits: u64,
    /// Lookups that started a fetch.
    pub misses: u64,
    /// Entries dropped to respect `max_size`.
    pub evictions: u64,
    /// Entries currently stored, possibly including not yet swept stale ones.
    pub size: usize,
    /// Configured size bound.
    pub max_size: usize,
    /// Configured ttl.
    pub ttl: Duration,
    /// Whether the cache stores anything.
    pub enabled: bool,
}

impl CacheStats {
    /// Fraction of lookups that were hits, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    stamp: u64,
}

struct InFlight<V> {
    id: u64,
    future: SharedFetch<V>,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Recency stamp -> key; the first entry is the least recently used.
    recency: BTreeMap<u64, K>,
    tick: u64,
    in_flight: HashMap<K, InFlight<V>>,
    next_flight: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
            in_flight: HashMap::new(),
            next_flight: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Returns a fresh value and marks it most recently used. Stale entries are
    /// removed.
    fn lookup(&mut self, key: &K, ttl: Duration, now: Instant) -> Option<V> {
        let (fresh, old_stamp) = {
            let entry = self.entries.get(key)?;
            (
                now.saturating_duration_since(entry.inserted_at) < ttl,
                entry.stamp,
            )
        };

        if !fresh {
            self.remove(key);
            return None;
        }

        let stamp = self.next_stamp();
        self.recency.remove(&old_stamp);
        self.recency.insert(stamp, key.clone());
        let entry = self.entries.get_mut(key)?;
        entry.stamp = stamp;
        Some(entry.value.clone())
    }

    /// Stores a value and evicts least recently used entries beyond `max_size`.
    /// Returns the number of evictions.
    fn store(&mut self, key: K, value: V, max_size: usize) -> u64 {
        if max_size == 0 {
            return 0;
        }

        self.remove(&key);
        let stamp = self.next_stamp();
        self.recency.insert(stamp, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                stamp,
            },
        );

        let mut evicted = 0;
        while self.entries.len() > max_size {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted += 1;
        }
        self.evictions += evicted;
        evicted
    }

    fn remove(&mut self, key: &K) {
        if let Some(entry) = self.entries.remove(key) {
            self.recency.remove(&entry.stamp);
        }
    }
}

/// A TTL + LRU cache with single-flight fetching.
///
/// Cloning a `Cache` yields another handle to the same storage.
///
/// # Examples
///
/// ```
/// use deskwire::cache::{Cache, CacheSettings};
/// use std::time::Duration;
///
/// # async fn example() -> deskwire::Result<()> {
/// let cache: Cache<u64, String> =
///     Cache::new("users", CacheSettings::new(Duration::from_secs(60), 100), true);
///
/// let name = cache
///     .get_or_fetch(7, || async { Ok::<_, deskwire::Error>("Ada".to_string()) })
///     .await?;
/// assert_eq!(name, "Ada");
///
/// // Served from memory this time.
/// let again = cache
///     .get_or_fetch(7, || async { Ok::<_, deskwire::Error>("Grace".to_string()) })
///     .await?;
/// assert_eq!(again, "Ada");
/// assert_eq!(cache.stats().hits, 1);
/// # Ok(())
/// # }
/// ```
pub struct Cache<K, V> {
    name: &'static str,
    settings: CacheSettings,
    enabled: bool,
    state: Arc<Mutex<CacheState<K, V>>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            settings: self.settings,
            enabled: self.enabled,
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache. `name` only appears in logs.
    pub fn new(name: &'static str, settings: CacheSettings, enabled: bool) -> Self {
        Self {
            name,
            settings,
            enabled,
            state: Arc::new(Mutex::new(CacheState::new())),
        }
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// - A fresh entry is returned without calling `fetch` and counts as a hit.
    /// - If another caller is already fetching `key`, this call waits for that
    ///   fetch instead of starting its own; this also counts as a hit.
    /// - Otherwise `fetch` runs once, the miss counter goes up, and a successful
    ///   result is stored (evicting the least recently used entry if needed).
    ///
    /// Errors are returned to every waiter and never cached. The fetch keeps
    /// running to completion even if the caller that started it is dropped, as
    /// long as some waiter still polls it.
    ///
    /// # Errors
    ///
    /// Whatever `fetch` returns.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if !self.enabled {
            self.state.lock().misses += 1;
            return fetch().await;
        }

        let joined = {
            let mut state = self.state.lock();
            if let Some(value) = state.lookup(&key, self.settings.ttl, Instant::now()) {
                state.hits += 1;
                tracing::debug!(cache = self.name, key = ?key, "Cache hit");
                return Ok(value);
            }
            match state.in_flight.get(&key).map(|f| f.future.clone()) {
                Some(flight) => {
                    state.hits += 1;
                    Some(flight)
                }
                None => {
                    state.misses += 1;
                    None
                }
            }
        };

        if let Some(flight) = joined {
            drop(fetch);
            tracing::debug!(cache = self.name, key = ?key, "Joining in-flight fetch");
            return flight.await;
        }

        tracing::debug!(cache = self.name, key = ?key, "Cache miss");
        let pending = fetch();

        let flight = {
            let mut state = self.state.lock();
            match state.in_flight.get(&key).map(|f| f.future.clone()) {
                // Another caller registered a fetch while ours was being built.
                Some(existing) => existing,
                None => {
                    let id = state.next_flight;
                    state.next_flight += 1;
                    let future = self.complete_flight(key.clone(), id, pending).boxed().shared();
                    state.in_flight.insert(
                        key,
                        InFlight {
                            id,
                            future: future.clone(),
                        },
                    );
                    future
                }
            }
        };

        flight.await
    }

    /// Resolves several keys, fetching the missing ones with one call to
    /// `fetch`.
    ///
    /// Fresh entries are hits. Keys another caller is already fetching (alone
    /// or as part of a batch) are joined and also count as hits. The remaining
    /// keys are misses: they are handed to `fetch` together, and each one is
    /// registered as an in-flight fetch backed by that single batch, so
    /// concurrent lookups of any of them wait for it instead of fetching
    /// again. A key the batch does not return resolves to `absent(key)`.
    ///
    /// Each key gets its own result; one failed key does not hide the others.
    pub async fn get_or_fetch_many<F, Fut>(
        &self,
        keys: impl IntoIterator<Item = K>,
        fetch: F,
        absent: fn(&K) -> Error,
    ) -> HashMap<K, Result<V>>
    where
        F: FnOnce(Vec<K>) -> Fut,
        Fut: Future<Output = Result<HashMap<K, V>>> + Send + 'static,
    {
        let mut seen = HashSet::new();
        let keys: Vec<K> = keys.into_iter().filter(|key| seen.insert(key.clone())).collect();
        let mut results = HashMap::with_capacity(keys.len());
        if keys.is_empty() {
            return results;
        }

        if !self.enabled {
            self.state.lock().misses += keys.len() as u64;
            return match fetch(keys.clone()).await {
                Ok(mut found) => keys
                    .into_iter()
                    .map(|key| {
                        let value = found.remove(&key).ok_or_else(|| absent(&key));
                        (key, value)
                    })
                    .collect(),
                Err(error) => keys.into_iter().map(|key| (key, Err(error.clone()))).collect(),
            };
        }

        let mut flights = Vec::new();
        let mut missing = Vec::new();
        {
            let mut state = self.state.lock();
            let now = Instant::now();
            for key in keys {
                if let Some(value) = state.lookup(&key, self.settings.ttl, now) {
                    state.hits += 1;
                    results.insert(key, Ok(value));
                    continue;
                }
                match state.in_flight.get(&key).map(|f| f.future.clone()) {
                    Some(flight) => {
                        state.hits += 1;
                        flights.push((key, flight));
                    }
                    None => {
                        state.misses += 1;
                        missing.push(key);
                    }
                }
            }
        }

        if !missing.is_empty() {
            tracing::debug!(cache = self.name, keys = missing.len(), "Cache miss, fetching batch");
            let batch = fetch(missing.clone()).map_ok(Arc::new).boxed().shared();

            let mut state = self.state.lock();
            for key in missing {
                if let Some(existing) = state.in_flight.get(&key).map(|f| f.future.clone()) {
                    flights.push((key, existing));
                    continue;
                }

                let id = state.next_flight;
                state.next_flight += 1;
                let batch = batch.clone();
                let wanted = key.clone();
                let single = async move {
                    let found = batch.await?;
                    found.get(&wanted).cloned().ok_or_else(|| absent(&wanted))
                };
                let future = self.complete_flight(key.clone(), id, single).boxed().shared();
                state.in_flight.insert(
                    key.clone(),
                    InFlight {
                        id,
                        future: future.clone(),
                    },
                );
                flights.push((key, future));
            }
        }

        let resolved = join_all(
            flights
                .into_iter()
                .map(|(key, flight)| async move { (key, flight.await) }),
        )
        .await;
        results.extend(resolved);
        results
    }

    /// Wraps a fetch so that whoever drives it to completion also stores the
    /// result and clears the in-flight registration.
    fn complete_flight<Fut>(
        &self,
        key: K,
        id: u64,
        fetch: Fut,
    ) -> impl Future<Output = Result<V>> + Send + 'static
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let name = self.name;
        let max_size = self.settings.max_size;

        async move {
            let result = fetch.await;
            {
                let mut state = state.lock();
                // An invalidate() during the fetch drops the registration; the
                // result is then handed to the waiters but not stored.
                let current = state.in_flight.get(&key).map(|flight| flight.id) == Some(id);
                if current {
                    state.in_flight.remove(&key);
                    if let Ok(value) = &result {
                        let evicted = state.store(key, value.clone(), max_size);
                        if evicted > 0 {
                            tracing::debug!(cache = name, evicted, "Evicted least recently used entries");
                        }
                    }
                }
            }
            result
        }
    }

    /// Returns a fresh cached value without fetching.
    ///
    /// A found value counts as a hit. Absent keys are not counted: the caller
    /// decides how to fetch them, and that fetch is counted where it happens.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.enabled {
            return None;
        }
        let mut state = self.state.lock();
        let value = state.lookup(key, self.settings.ttl, Instant::now())?;
        state.hits += 1;
        Some(value)
    }

    /// Stores a value fetched elsewhere, e.g. from a batch endpoint.
    pub fn insert(&self, key: K, value: V) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.lock();
        let evicted = state.store(key, value, self.settings.max_size);
        if evicted > 0 {
            tracing::debug!(cache = self.name, evicted, "Evicted least recently used entries");
        }
    }

    /// Drops the entry for `key` and detaches any in-flight fetch for it, so
    /// that fetch's result is not stored.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.lock();
        state.remove(key);
        state.in_flight.remove(key);
        tracing::debug!(cache = self.name, key = ?key, "Invalidated cache entry");
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.recency.clear();
        state.in_flight.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            size: state.entries.len(),
            max_size: self.settings.max_size,
            ttl: self.settings.ttl,
            enabled: self.enabled,
        }
    }
}

/// The per-resource caches owned by a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub(crate) struct Caches {
    pub(crate) users: Cache<u64, crate::models::User>,
    pub(crate) organizations: Cache<u64, crate::models::Organization>,
    pub(crate) tickets: Cache<u64, crate::models::Ticket>,
    pub(crate) articles: Cache<u64, crate::models::Article>,
}

impl Caches {
    pub(crate) fn new(config: &CacheConfig) -> Self {
        Self {
            users: Cache::new("users", config.users, config.enabled),
            organizations: Cache::new("organizations", config.organizations, config.enabled),
            tickets: Cache::new("tickets", config.tickets, config.enabled),
            articles: Cache::new("articles", config.articles, config.enabled),
        }
    }

    pub(crate) fn clear(&self) {
        self.users.clear();
        self.organizations.clear();
        self.tickets.clear();
        self.articles.clear();
    }
}

/// Occupancy and counters of every cache owned by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCacheStats {
    /// User cache.
    pub users: CacheStats,
    /// Organization cache.
    pub organizations: CacheStats,
    /// Ticket cache.
    pub tickets: CacheStats,
    /// Article cache.
    pub articles: CacheStats,
}

impl From<&Caches> for ClientCacheStats {
    fn from(caches: &Caches) -> Self {
        Self {
            users: caches.users.stats(),
            organizations: caches.organizations.stats(),
            tickets: caches.tickets.stats(),
            articles: caches.articles.stats(),
        }
    }
}
