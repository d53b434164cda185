//! Backend-agnostic cache interface and the backend factory.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{RedisStore, SqliteStore};
use crate::{AppConfig, CacheBackend, Error};

/// Key/value store mapping a request URL to its decoded JSON body.
///
/// Keys are compared as exact strings. Every mutating call is durable once it
/// returns. Implementations must behave identically so they can be swapped
/// through [`open_store`].
#[async_trait]
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Return the payload stored for `url`.
    ///
    /// # Errors
    ///
    /// `Error::CacheMiss` if nothing is stored; callers are expected to check
    /// [`CacheStore::contains`] first.
    async fn get(&self, url: &str) -> Result<Value, Error>;

    /// Insert or overwrite the payload for `url`.
    async fn set(&self, url: &str, payload: &Value) -> Result<(), Error>;

    async fn contains(&self, url: &str) -> Result<bool, Error>;

    /// Remove the entry for `url`. Removing a missing key is a no-op.
    async fn clear(&self, url: &str) -> Result<(), Error>;

    /// Remove every entry.
    async fn reset(&self) -> Result<(), Error>;
}

/// Open the backend selected by `config.cache_backend`.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>, Error> {
    match config.cache_backend {
        CacheBackend::Sqlite => {
            tracing::debug!(path = %config.db_path.display(), "opening sqlite cache");
            Ok(Arc::new(SqliteStore::open(&config.db_path).await?))
        }
        CacheBackend::Redis => {
            let redis_url = config
                .require_redis_url()
                .map_err(|e| Error::Connection(e.to_string()))?;
            tracing::debug!(redis_url, "opening redis cache");
            Ok(Arc::new(RedisStore::connect(redis_url).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig { db_path: dir.path().join("cache.sqlite"), ..Default::default() };
        let store = open_store(&config).await.unwrap();
        assert!(!store.contains("https://example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_store_redis_requires_url() {
        let config = AppConfig { cache_backend: CacheBackend::Redis, redis_url: None, ..Default::default() };
        let result = open_store(&config).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
