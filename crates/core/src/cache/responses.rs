//! Response CRUD for the SQLite backend.

use async_trait::async_trait;
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::SqliteStore;
use super::store::CacheStore;
use crate::Error;

impl SqliteStore {
    /// Number of cached responses.
    pub async fn len(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get(&self, url: &str) -> Result<Value, Error> {
        let key = url.to_string();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT payload FROM responses WHERE url = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                });

                match result {
                    Ok(payload) => Ok(Some(payload)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let raw = raw.ok_or_else(|| Error::CacheMiss(url.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| Error::Decode(format!("{url}: {e}")))
    }

    /// Uses UPSERT semantics so a forced refetch overwrites the old body.
    async fn set(&self, url: &str, payload: &Value) -> Result<(), Error> {
        let key = url.to_string();
        let body = serde_json::to_string(payload).map_err(|e| Error::Decode(format!("{url}: {e}")))?;
        let fetched_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO responses (url, payload, fetched_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(url) DO UPDATE SET
                        payload = excluded.payload,
                        fetched_at = excluded.fetched_at",
                    params![key, body, fetched_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn contains(&self, url: &str) -> Result<bool, Error> {
        let key = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM responses WHERE url = ?1)",
                    params![key],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn clear(&self, url: &str) -> Result<(), Error> {
        let key = url.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM responses WHERE url = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn reset(&self) -> Result<(), Error> {
        let deleted = self
            .conn
            .call(|conn| -> Result<usize, Error> { Ok(conn.execute("DELETE FROM responses", [])?) })
            .await
            .map_err(Error::from)?;
        tracing::info!(deleted, "reset response cache");
        Ok(())
    }
}
