//! In-memory [`JsonSource`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use rise_core::Error;

use crate::fetch::JsonSource;

/// Serves canned payloads by exact URL and counts requests.
///
/// Unknown URLs answer like a 404 (`Error::Query`); URLs registered with
/// [`MockSource::fail`] answer like a dropped connection.
#[derive(Debug, Default)]
pub struct MockSource {
    routes: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, url: &str, payload: Value) -> Self {
        self.route(url, payload);
        self
    }

    pub fn route(&self, url: &str, payload: Value) {
        self.routes.lock().expect("routes lock").insert(url.to_string(), payload);
    }

    pub fn fail(&self, url: &str) {
        self.failures.lock().expect("failures lock").insert(url.to_string());
    }

    /// Requests seen for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().expect("calls lock").get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("calls lock").values().sum()
    }
}

#[async_trait]
impl JsonSource for MockSource {
    async fn get_json(&self, url: &str) -> Result<Value, Error> {
        *self.calls.lock().expect("calls lock").entry(url.to_string()).or_default() += 1;

        // let sibling tasks interleave the way real requests would
        tokio::task::yield_now().await;

        if self.failures.lock().expect("failures lock").contains(url) {
            return Err(Error::Connection(format!("connection refused: {url}")));
        }

        self.routes
            .lock()
            .expect("routes lock")
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Query(format!("{url} returned status 404: not found")))
    }
}
