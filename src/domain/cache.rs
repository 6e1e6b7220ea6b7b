//! Bounded time-to-live cache shared by memoized operations.
//!
//! Values are type-erased so one store can back operations with different
//! result types. At capacity, expired entries are purged first and then the
//! least-recently-used entry is evicted. A successful `get` or a `put` over an
//! existing key refreshes recency.
//!
//! [`CacheStore::claim`] serializes writers per key: concurrent misses on one
//! key wait for the first caller instead of computing the value again.

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

type Payload = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    value: Payload,
    /// `None` when the ttl runs past the clock's range.
    expires_at: Option<Instant>,
    /// Recency tick; key into `Inner::recency`.
    tick: u64,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
}

impl Inner {
    fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            self.recency.insert(tick, key.to_string());
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| !e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Process-wide keyed store. Internally synchronized; share it behind an `Arc`.
pub struct CacheStore {
    inner: Mutex<Inner>,
    claims: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

/// Exclusive right to fill one key. Released on drop.
pub struct KeyClaim<'a> {
    store: &'a CacheStore,
    key: String,
    slot: Arc<Mutex<()>>,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for KeyClaim<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut claims = self.store.claims.lock();
        // the table and this claim hold the only references: nobody is waiting
        if Arc::strong_count(&self.slot) == 2 {
            claims.remove(&self.key);
        }
    }
}

impl CacheStore {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            claims: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            clock,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live and expired-but-not-yet-purged entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed lookup. Absent, expired, and type-mismatched entries all read as `None`.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let live = match inner.entries.get(key) {
            None => return None,
            Some(entry) => entry.is_live(now),
        };
        if !live {
            inner.remove(key);
            return None;
        }
        let value = inner
            .entries
            .get(key)
            .and_then(|e| e.value.downcast_ref::<T>())
            .cloned()?;
        inner.touch(key);
        Some(value)
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|e| e.is_live(now))
    }

    /// Store `value` for `ttl`. A zero ttl stores nothing.
    pub fn put<T>(&self, key: &str, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        if ttl.is_zero() {
            return;
        }
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.remove(key);

        if inner.entries.len() >= self.capacity && inner.purge_expired(now) == 0 {
            if let Some(evicted) = inner.evict_lru() {
                tracing::debug!(key = %evicted, "cache evicted least-recently-used entry");
            }
        }

        let tick = inner.next_tick;
        inner.next_tick += 1;
        inner.recency.insert(tick, key.to_string());
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value: Arc::new(value),
                expires_at: now.checked_add(ttl),
                tick,
            },
        );
    }

    /// Block until no other caller holds a claim on `key`, then hold it.
    pub fn claim(&self, key: &str) -> KeyClaim<'_> {
        let slot = self
            .claims
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone();
        let guard = slot.lock_arc();
        KeyClaim {
            store: self,
            key: key.to_string(),
            slot,
            guard: Some(guard),
        }
    }

    /// Keys currently claimed or waited on.
    pub fn pending_claims(&self) -> usize {
        self.claims.lock().len()
    }

    pub fn remove(&self, key: &str) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    /// Explicit reset.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
