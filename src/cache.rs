use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

use crate::model::Brand;

struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(t) if now >= t)
    }
}

/// A thread-safe key-value cache with optional per-entry TTL.
///
/// Expired entries are treated as absent on read and are only dropped when overwritten,
/// invalidated or cleared; there is no background sweep.
pub struct CacheService<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for CacheService<V> {
    fn default() -> Self {
        CacheService {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> CacheService<V> {
    pub fn new() -> Self {
        CacheService::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        // A poisoned lock only means a writer panicked. Treat it as a miss rather than crashing.
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store `value` under `key`. Without a `ttl`, or with one too large to represent as a
    /// deadline, the entry never expires.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        // Constructing new value before requesting the lock to minimize lock span.
        let entry = CacheEntry {
            value,
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), entry);
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

/// Cache key for a resolved screen. Every request dimension is part of the key so that payloads
/// never leak across brands, segments or users.
pub fn screen_cache_key(
    screen_id: &str,
    brand: Brand,
    segment: Option<&str>,
    user_id: Option<&str>,
) -> String {
    format!(
        "screen:{}:{}:{}:{}",
        screen_id,
        brand,
        segment.unwrap_or("-"),
        user_id.unwrap_or("-")
    )
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use crate::model::Brand;

    use super::{screen_cache_key, CacheService};

    #[test]
    fn stores_and_returns_values() {
        let cache = CacheService::new();
        cache.set("a", 1, None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);

        cache.set("a", 2, None);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn expired_entries_are_absent() {
        let cache = CacheService::new();
        cache.set("short", "v", Some(Duration::ZERO));
        cache.set("long", "v", Some(Duration::from_secs(3600)));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some("v"));
    }

    #[test]
    fn huge_ttl_never_expires() {
        let cache = CacheService::new();
        cache.set("forever", 1, Some(Duration::MAX));
        assert_eq!(cache.get("forever"), Some(1));
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = CacheService::new();
        cache.set("a", 1, None);
        cache.set("b", 2, None);

        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));

        cache.clear();
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn can_set_from_another_thread() {
        let cache = Arc::new(CacheService::new());

        {
            let cache = cache.clone();
            let _ = std::thread::spawn(move || cache.set("k", 7, None)).join();
        }

        assert_eq!(cache.get("k"), Some(7));
    }

    #[test]
    fn screen_keys_cover_every_dimension() {
        assert_eq!(
            screen_cache_key("home", Brand::BrandA, None, None),
            "screen:home:brand_a:-:-"
        );
        assert_eq!(
            screen_cache_key("home", Brand::BrandB, Some("vip"), Some("alice")),
            "screen:home:brand_b:vip:alice"
        );
        assert_ne!(
            screen_cache_key("home", Brand::BrandA, None, Some("alice")),
            screen_cache_key("home", Brand::BrandA, None, Some("bob"))
        );
    }
}
