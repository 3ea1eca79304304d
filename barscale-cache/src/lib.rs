//! barscale-cache
//!
//! In-memory cache for resampled bar series: LRU ordering, per-interval
//! TTLs, a total byte bound, and symbol/exchange-wide invalidation.
//!
//! The cache is an explicit, constructible instance with no process-wide
//! state; tests build as many isolated instances as they need. All
//! operations are linearizable behind a single async mutex, and `get` never
//! blocks on an in-flight computation — a miss just tells the caller to go
//! compute (or join a running task).
#![warn(missing_docs)]

use std::mem;
use std::sync::Arc;
use std::time::Instant;

use lru::LruCache;
use tokio::sync::Mutex;

use barscale_types::{Bar, BarscaleError, CacheConfig, Exchange, ResampleKey};

/// One cached resample result. Never mutated after insertion; invalidation
/// replaces the whole entry.
#[derive(Debug)]
pub struct CacheEntry {
    /// The aggregated bars.
    pub bars: Vec<Bar>,
    /// Insertion time.
    pub created_at: Instant,
    /// Lazy-expiry deadline derived from the target interval's TTL class.
    pub expires_at: Instant,
    /// Estimated in-memory size in bytes, used for the byte bound.
    pub size_estimate: usize,
}

impl CacheEntry {
    fn expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Store {
    map: LruCache<ResampleKey, Arc<CacheEntry>>,
    total_bytes: usize,
}

impl Store {
    fn remove(&mut self, key: &ResampleKey) -> Option<Arc<CacheEntry>> {
        let entry = self.map.pop(key)?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.size_estimate);
        Some(entry)
    }

    fn remove_lru(&mut self) -> Option<ResampleKey> {
        let (key, entry) = self.map.pop_lru()?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.size_estimate);
        Some(key)
    }
}

/// Bounded key/value store mapping [`ResampleKey`]s to immutable entries.
pub struct CacheManager {
    inner: Mutex<Store>,
    cfg: CacheConfig,
}

impl CacheManager {
    /// Build a cache with the given bounds and TTLs.
    #[must_use]
    pub fn new(cfg: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Store {
                map: LruCache::unbounded(),
                total_bytes: 0,
            }),
            cfg,
        }
    }

    /// Estimated size of an entry holding `bars`.
    #[must_use]
    pub fn size_estimate(bars: &[Bar]) -> usize {
        mem::size_of::<CacheEntry>() + bars.len() * mem::size_of::<Bar>()
    }

    /// Look up an entry, promoting it to most-recently-used.
    ///
    /// TTL is evaluated lazily here: an expired entry is removed and treated
    /// as a miss. Never blocks on any in-flight computation.
    pub async fn get(&self, key: &ResampleKey) -> Option<Arc<CacheEntry>> {
        let now = Instant::now();
        let mut store = self.inner.lock().await;
        let expired = match store.map.get(key) {
            None => return None,
            Some(entry) if entry.expired(now) => true,
            Some(entry) => return Some(Arc::clone(entry)),
        };
        debug_assert!(expired);
        store.remove(key);
        tracing::debug!(symbol = key.symbol(), interval = %key.target(), "cache entry expired");
        None
    }

    /// Insert a resample result, evicting least-recently-used entries until
    /// the count and byte bounds hold.
    ///
    /// An existing entry under the same key is replaced, never edited.
    ///
    /// # Errors
    /// Returns `BarscaleError::CacheOverflow` when the entry alone exceeds
    /// the whole byte budget; the entry is not cached and nothing is
    /// evicted to make room for it. Callers degrade to serving uncached.
    pub async fn put(&self, key: ResampleKey, bars: Vec<Bar>) -> Result<(), BarscaleError> {
        let size = Self::size_estimate(&bars);
        if size > self.cfg.max_bytes {
            tracing::warn!(
                symbol = key.symbol(),
                interval = %key.target(),
                size,
                budget = self.cfg.max_bytes,
                "entry larger than entire cache budget; serving uncached"
            );
            return Err(BarscaleError::CacheOverflow {
                size,
                budget: self.cfg.max_bytes,
            });
        }

        let now = Instant::now();
        let entry = Arc::new(CacheEntry {
            bars,
            created_at: now,
            expires_at: now + self.cfg.ttl_for(key.target()),
            size_estimate: size,
        });

        let mut store = self.inner.lock().await;
        store.remove(&key);
        while store.map.len() >= self.cfg.max_entries.max(1)
            || store.total_bytes + size > self.cfg.max_bytes
        {
            match store.remove_lru() {
                Some(evicted) => {
                    tracing::debug!(symbol = evicted.symbol(), interval = %evicted.target(), "evicted LRU cache entry");
                }
                None => break,
            }
        }
        store.total_bytes += size;
        store.map.put(key, entry);
        Ok(())
    }

    /// Drop every entry for a symbol/exchange pair, regardless of TTL.
    ///
    /// Called when new 1-minute data lands for the pair: staleness from new
    /// data takes priority over TTL. Returns the number of entries removed.
    pub async fn invalidate(&self, symbol: &str, exchange: &Exchange) -> usize {
        let mut store = self.inner.lock().await;
        let doomed: Vec<ResampleKey> = store
            .map
            .iter()
            .filter(|(k, _)| k.symbol() == symbol && k.exchange() == exchange)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            store.remove(key);
        }
        if !doomed.is_empty() {
            tracing::info!(symbol, exchange = %exchange, removed = doomed.len(), "invalidated cache entries");
        }
        doomed.len()
    }

    /// Eagerly sweep expired entries. Returns the number removed.
    pub async fn evict(&self) -> usize {
        let now = Instant::now();
        let mut store = self.inner.lock().await;
        let doomed: Vec<ResampleKey> = store
            .map
            .iter()
            .filter(|(_, e)| e.expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            store.remove(key);
        }
        doomed.len()
    }

    /// Number of live entries (including any not yet lazily expired).
    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current total of entry size estimates.
    pub async fn total_bytes(&self) -> usize {
        self.inner.lock().await.total_bytes
    }
}
