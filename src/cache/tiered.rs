use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::store::TtlCache;

/// Two-tier cache: a short tier answering normal lookups and a long tier
/// that is only read when the upstream call failed.
///
/// [`store`](Self::store) always writes both tiers, so the long tier holds
/// the last good response for as long as `long_ttl` allows.
pub struct TieredCache<V> {
    short: TtlCache<V>,
    long: TtlCache<V>,
    short_ttl: Duration,
    long_ttl: Duration,
}

impl<V: Clone> TieredCache<V> {
    pub fn new(short_ttl: Duration, long_ttl: Duration) -> Self {
        Self::with_clock(short_ttl, long_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(short_ttl: Duration, long_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            short: TtlCache::with_clock(Arc::clone(&clock)),
            long: TtlCache::with_clock(clock),
            short_ttl,
            long_ttl,
        }
    }

    /// Normal lookup against the short tier.
    pub fn fresh(&self, key: &str) -> Option<V> {
        self.short.get(key)
    }

    /// Last-resort lookup against the long tier.
    pub fn fallback(&self, key: &str) -> Option<V> {
        let value = self.long.get(key);
        if value.is_some() {
            tracing::info!(key = %key, "Serving stale response from long-term cache");
        }
        value
    }

    pub fn store(&self, key: &str, value: V) {
        self.short.set(key, value.clone(), self.short_ttl);
        self.long.set(key, value, self.long_ttl);
    }

    /// Sweep expired entries from both tiers.
    pub fn cleanup(&self) -> usize {
        self.short.cleanup() + self.long.cleanup()
    }

    pub fn clear(&self) {
        self.short.clear();
        self.long.clear();
    }
}
