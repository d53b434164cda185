//! Cache-aside fetching, single and grouped.
//!
//! A group fetch serves cached URLs from the store and spawns one task per
//! uncached URL. Each task writes its payload to the store as soon as it
//! lands, so an aborted batch still leaves every finished URL cached.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use rise_core::{AppConfig, CacheStore, Error, open_store};

use crate::fetch::{FetchClient, FetchConfig, JsonSource};

/// Default cap on in-flight requests per group fetch.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Per-URL outcome of [`RiseCache::get_or_fetch_group_settled`].
pub type Settled = HashMap<String, Result<Value, Error>>;

/// Handle bundling the response store with the network source.
///
/// Cheap to clone; construct one per process and pass it to every component
/// that needs remote data.
#[derive(Clone)]
pub struct RiseCache {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn JsonSource>,
    max_concurrency: usize,
}

impl std::fmt::Debug for RiseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiseCache")
            .field("store", &self.store)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

impl RiseCache {
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn JsonSource>) -> Self {
        Self { store, source, max_concurrency: DEFAULT_MAX_CONCURRENCY }
    }

    /// Limit the number of requests a group fetch keeps in flight.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Open the configured store and an HTTP source.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let store = open_store(config).await?;
        let source = Arc::new(FetchClient::new(FetchConfig::from(config))?);
        Ok(Self::new(store, source).with_max_concurrency(config.max_concurrency))
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Return the cached payload for `url`, or fetch and cache it.
    ///
    /// With `force_fetch` the store is bypassed for the read but still
    /// overwritten with the fresh payload.
    pub async fn get_or_fetch(&self, url: &str, force_fetch: bool) -> Result<Value, Error> {
        if !force_fetch && self.store.contains(url).await? {
            tracing::debug!(url, "cache hit");
            return self.store.get(url).await;
        }

        tracing::debug!(url, force_fetch, "cache miss, fetching");
        let payload = self.source.get_json(url).await?;
        self.store.set(url, &payload).await?;
        Ok(payload)
    }

    /// Fetch every URL in `urls`, serving cached ones from the store.
    ///
    /// Uncached URLs are fetched concurrently. If any fetch fails the whole
    /// call fails with that error and outstanding fetches are aborted; there
    /// is no partial result.
    pub async fn get_or_fetch_group(&self, urls: &[String], force_fetch: bool) -> Result<HashMap<String, Value>, Error> {
        let (mut results, missing) = self.partition(urls, force_fetch).await?;
        let cached = results.len();

        let mut join_set = self.spawn_fetches(missing);
        while let Some(joined) = join_set.join_next().await {
            let (url, outcome) = joined.map_err(|e| Error::Connection(format!("fetch task failed: {e}")))?;
            match outcome {
                Ok(payload) => {
                    results.insert(url, payload);
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "group fetch failed, aborting batch");
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }

        tracing::debug!(total = results.len(), cached, "group fetch complete");
        Ok(results)
    }

    /// Like [`RiseCache::get_or_fetch_group`] but records each URL's outcome
    /// instead of failing the batch.
    ///
    /// The outer error only reports store failures while partitioning.
    pub async fn get_or_fetch_group_settled(&self, urls: &[String], force_fetch: bool) -> Result<Settled, Error> {
        let (cached, missing) = self.partition(urls, force_fetch).await?;
        let mut results: Settled = cached.into_iter().map(|(url, payload)| (url, Ok(payload))).collect();

        let mut join_set = self.spawn_fetches(missing);
        while let Some(joined) = join_set.join_next().await {
            let (url, outcome) = joined.map_err(|e| Error::Connection(format!("fetch task failed: {e}")))?;
            if let Err(e) = &outcome {
                tracing::warn!(url = %url, error = %e, "fetch failed");
            }
            results.insert(url, outcome);
        }

        Ok(results)
    }

    /// Split `urls` into payloads already in the store and URLs to fetch.
    ///
    /// Duplicates are dropped so each URL has at most one writer per batch.
    async fn partition(&self, urls: &[String], force_fetch: bool) -> Result<(HashMap<String, Value>, Vec<String>), Error> {
        let mut seen = HashSet::new();
        let mut cached = HashMap::new();
        let mut missing = Vec::new();

        for url in urls {
            if !seen.insert(url.as_str()) {
                continue;
            }
            if !force_fetch && self.store.contains(url).await? {
                cached.insert(url.clone(), self.store.get(url).await?);
            } else {
                missing.push(url.clone());
            }
        }

        Ok((cached, missing))
    }

    fn spawn_fetches(&self, urls: Vec<String>) -> JoinSet<(String, Result<Value, Error>)> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();

        for url in urls {
            let semaphore = semaphore.clone();
            let store = self.store.clone();
            let source = self.source.clone();

            join_set.spawn(async move {
                let outcome = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::Connection(format!("fetch limiter closed: {e}")))?;
                    let payload = source.get_json(&url).await?;
                    store.set(&url, &payload).await?;
                    Ok::<Value, Error>(payload)
                }
                .await;
                (url, outcome)
            });
        }

        join_set
    }
}
