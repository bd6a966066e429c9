//! Session-scoped response cache.
//!
//! The cache lives for one process and maps derived request keys to
//! serialized generation results. It is a performance layer only: lookups
//! degrade to a miss and writes are swallowed rather than surfaced, so the
//! caller never depends on it for correctness.

mod memory;

use addon_forge_config::CacheConfig;
use addon_forge_ports::{BoxFuture, CacheStorePort};
use addon_forge_domain::RequestKey;
use addon_forge_shared::Result;
use memory::MemoryCache;

/// In-memory session cache implementing `CacheStorePort`.
///
/// Bounded LRU by entry count and total bytes; a disabled config yields a
/// cache that always misses.
#[derive(Debug)]
pub struct SessionCache {
    memory: Option<MemoryCache>,
}

impl SessionCache {
    /// Create a new cache from config.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let memory = if config.enabled {
            Some(MemoryCache::new(
                config.max_entries as usize,
                config.max_bytes,
            )?)
        } else {
            None
        };
        Ok(Self { memory })
    }

    /// Create a cache that never stores anything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { memory: None }
    }
}

impl CacheStorePort for SessionCache {
    fn get(&self, key: &RequestKey) -> BoxFuture<'_, Option<Box<str>>> {
        let key = key.as_str().to_owned();
        Box::pin(async move {
            match self.memory.as_ref() {
                Some(memory) => memory.get(&key).await,
                None => None,
            }
        })
    }

    fn put(&self, key: &RequestKey, value: Box<str>) -> BoxFuture<'_, ()> {
        let key = key.as_str().to_owned();
        Box::pin(async move {
            if let Some(memory) = self.memory.as_ref() {
                memory.insert(&key, value).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addon_forge_domain::{KeyPart, derive_request_key};
    use addon_forge_shared::ErrorEnvelope;

    fn test_config() -> CacheConfig {
        CacheConfig {
            enabled: true,
            max_entries: 8,
            max_bytes: 4_096,
        }
    }

    fn key(seed: &str) -> Result<RequestKey> {
        derive_request_key(&[KeyPart::Text(seed)]).map_err(ErrorEnvelope::from)
    }

    #[tokio::test]
    async fn cache_round_trip_preserves_nested_payloads() -> Result<()> {
        let cache = SessionCache::new(&test_config())?;
        let key = key("round-trip")?;
        let payload = r#"{"files":[{"path":"a/b.json","content":"{\"nested\":[1,2,3]}\n\t\"quoted\""}]}"#;

        cache.put(&key, payload.into()).await;
        let hit = cache.get(&key).await;
        assert_eq!(hit.as_deref(), Some(payload));
        Ok(())
    }

    #[tokio::test]
    async fn unseen_keys_miss() -> Result<()> {
        let cache = SessionCache::new(&test_config())?;
        assert!(cache.get(&key("never-stored")?).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() -> Result<()> {
        let cache = SessionCache::disabled();
        let key = key("disabled")?;
        cache.put(&key, "value".into()).await;
        assert!(cache.get(&key).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn last_writer_wins_on_same_key() -> Result<()> {
        let cache = SessionCache::new(&test_config())?;
        let key = key("same-key")?;
        cache.put(&key, "first".into()).await;
        cache.put(&key, "second".into()).await;

        assert_eq!(cache.get(&key).await.as_deref(), Some("second"));
        Ok(())
    }
}
