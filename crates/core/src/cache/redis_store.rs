//! Redis-backed response cache.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use serde_json::Value;

use super::store::CacheStore;
use crate::Error;

/// Response cache stored in an external Redis database.
///
/// Keys are the raw request URLs, values the JSON body serialized as a
/// string. `reset` flushes the selected database, so point `redis_url` at a
/// database dedicated to this cache.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str) -> Result<Self, Error> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, url: &str) -> Result<Value, Error> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(url).await?;
        let raw = raw.ok_or_else(|| Error::CacheMiss(url.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| Error::Decode(format!("{url}: {e}")))
    }

    async fn set(&self, url: &str, payload: &Value) -> Result<(), Error> {
        let body = serde_json::to_string(payload).map_err(|e| Error::Decode(format!("{url}: {e}")))?;
        let mut conn = self.conn.clone();
        let _: () = conn.set(url, body).await?;
        Ok(())
    }

    async fn contains(&self, url: &str) -> Result<bool, Error> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(url).await?;
        Ok(exists)
    }

    async fn clear(&self, url: &str) -> Result<(), Error> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(url).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<(), Error> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        tracing::info!("flushed redis response cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redis_url() -> String {
        std::env::var("RISE_EDR_TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/15".to_string())
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = RedisStore::connect("not a redis url").await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running redis server"]
    async fn test_round_trip_against_server() {
        let store = RedisStore::connect(&redis_url()).await.unwrap();
        store.reset().await.unwrap();

        let url = "https://data.usbr.gov/rise/api/location/1";
        assert!(!store.contains(url).await.unwrap());
        assert!(matches!(store.get(url).await, Err(Error::CacheMiss(_))));

        store.set(url, &json!({"data": {"id": 1}})).await.unwrap();
        assert_eq!(store.get(url).await.unwrap(), json!({"data": {"id": 1}}));

        store.clear(url).await.unwrap();
        assert!(!store.contains(url).await.unwrap());
    }
}
