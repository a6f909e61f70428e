//! Time-bounded cache of resolution outcomes.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Time-to-live policy for one class of entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long a successful resolution stays live
    pub positive: Duration,
    /// How long a failed resolution stays live
    pub negative: Duration,
}

impl CachePolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(positive: Duration, negative: Duration) -> Self {
        Self { positive, negative }
    }
}

/// One cached resolution outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The resolved identifier
    pub id: String,
    /// Schema namespace or lookup kind the payload belongs to
    pub namespace: Option<String>,
    /// When the outcome was obtained
    pub retrieved_at: DateTime<Utc>,
    /// The endpoint that produced the outcome
    pub endpoint: Option<String>,
    /// The payload; `None` records a failed resolution
    pub payload: Option<V>,
}

impl<V> CacheEntry<V> {
    /// A new entry retrieved now
    pub fn new(
        id: impl Into<String>,
        namespace: Option<&str>,
        endpoint: Option<&str>,
        payload: Option<V>,
    ) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.map(String::from),
            retrieved_at: Utc::now(),
            endpoint: endpoint.map(String::from),
            payload,
        }
    }

    /// Returns true if this entry records a failure
    pub const fn is_negative(&self) -> bool {
        self.payload.is_none()
    }

    /// Age of the entry at `now`; zero if `now` precedes retrieval
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.retrieved_at).to_std().unwrap_or_default()
    }

    /// Returns true if the entry is still within the TTL `policy` gives its
    /// class
    pub fn is_live_at(&self, policy: CachePolicy, now: DateTime<Utc>) -> bool {
        let ttl = if self.is_negative() {
            policy.negative
        } else {
            policy.positive
        };
        self.age_at(now) < ttl
    }

    /// [`CacheEntry::is_live_at`] evaluated now
    pub fn is_live(&self, policy: CachePolicy) -> bool {
        self.is_live_at(policy, Utc::now())
    }

    fn matches(&self, id: &str, namespace: Option<&str>) -> bool {
        self.id == id && namespace.map_or(true, |ns| self.namespace.as_deref() == Some(ns))
    }
}

struct CacheState<V> {
    entries: Vec<Arc<CacheEntry<V>>>,
    max_lifetime: Duration,
}

impl<V> CacheState<V> {
    fn sweep(&mut self, now: DateTime<Utc>) {
        let max_lifetime = self.max_lifetime;
        self.entries.retain(|entry| {
            let keep = entry.age_at(now) <= max_lifetime;
            if !keep {
                debug!(id = %entry.id, "evicting expired cache entry");
            }
            keep
        });
    }
}

/// Resolution outcomes keyed by `(id, namespace)`.
///
/// Every lookup first evicts entries older than the maximum lifetime.
/// Entries are replaced whole on every write, never mutated. While caching
/// is disabled lookups miss and writes are dropped, but existing entries are
/// kept.
pub struct ResolutionCache<V> {
    state: Mutex<CacheState<V>>,
    disabled: AtomicBool,
}

impl<V> std::fmt::Debug for ResolutionCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResolutionCache")
            .field("entries", &state.entries.len())
            .field("max_lifetime", &state.max_lifetime)
            .field("disabled", &self.is_disabled())
            .finish()
    }
}

impl<V> ResolutionCache<V> {
    /// Create an empty cache whose entries live at most `max_lifetime`
    pub fn new(max_lifetime: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: Vec::new(),
                max_lifetime,
            }),
            disabled: AtomicBool::new(false),
        }
    }

    /// Change the maximum entry lifetime
    pub fn set_max_lifetime(&self, max_lifetime: Duration) {
        self.state.lock().max_lifetime = max_lifetime;
    }

    /// Enable or disable caching
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    /// Returns true while caching is disabled
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// The first entry for `id` (and `namespace`, when given)
    pub fn get(&self, id: &str, namespace: Option<&str>) -> Option<Arc<CacheEntry<V>>> {
        self.get_at(id, namespace, Utc::now())
    }

    /// [`ResolutionCache::get`] with an explicit clock
    pub fn get_at(
        &self,
        id: &str,
        namespace: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<Arc<CacheEntry<V>>> {
        if self.is_disabled() {
            debug!(id = %id, "caching is disabled");
            return None;
        }

        let mut state = self.state.lock();
        state.sweep(now);
        state
            .entries
            .iter()
            .find(|entry| entry.matches(id, namespace))
            .cloned()
    }

    /// An entry for `id` that is still live under `policy`
    pub fn get_live(
        &self,
        id: &str,
        namespace: Option<&str>,
        policy: CachePolicy,
    ) -> Option<Arc<CacheEntry<V>>> {
        let now = Utc::now();
        self.get_at(id, namespace, now)
            .filter(|entry| entry.is_live_at(policy, now))
    }

    /// Store `entry`, replacing any entry with the same id and namespace
    pub fn put(&self, entry: CacheEntry<V>) {
        if self.is_disabled() {
            debug!(id = %entry.id, "caching is disabled");
            return;
        }

        debug!(id = %entry.id, negative = entry.is_negative(), "caching resolution");
        let mut state = self.state.lock();
        state
            .entries
            .retain(|old| !(old.id == entry.id && old.namespace == entry.namespace));
        state.entries.push(Arc::new(entry));
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }
}
