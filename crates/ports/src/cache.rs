//! Response cache boundary contract.
//!
//! Caching is a performance optimization, never a correctness requirement.
//! The contract is therefore infallible: `get` degrades to a miss on unseen
//! keys, corrupt values, or unavailable storage, and `put` swallows write
//! failures (adapters log them). Callers must behave identically whether or
//! not a value was cached.

use crate::BoxFuture;
use addon_forge_domain::RequestKey;

/// Boundary contract for the session-scoped response cache.
pub trait CacheStorePort: Send + Sync {
    /// Purely local lookup; never blocks on network.
    ///
    /// Returns `None` when the key is unseen or storage is unavailable.
    fn get(&self, key: &RequestKey) -> BoxFuture<'_, Option<Box<str>>>;

    /// Store a serialized value under the key.
    ///
    /// Storage failures (e.g. quota exhaustion) are absorbed by the adapter;
    /// last writer wins when the same key is stored twice.
    fn put(&self, key: &RequestKey, value: Box<str>) -> BoxFuture<'_, ()>;
}
