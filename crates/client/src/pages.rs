//! Page aggregation for paginated collections.
//!
//! The RISE API caps `itemsPerPage` at 100. A paginated response carries
//! `meta.totalItems`; every page is requested explicitly (page 1 included)
//! through a group fetch, then [`merge_pages`] stitches the `data` arrays
//! back together in page order.

use std::collections::HashMap;

use serde_json::Value;

use rise_core::Error;

use crate::fetch::with_query;
use crate::fetcher::RiseCache;

/// Largest page the remote API will serve.
pub const MAX_ITEMS_PER_PAGE: u64 = 100;

/// Page URL to raw page payload, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMap(Vec<(String, Value)>);

impl PageMap {
    pub fn single(url: impl Into<String>, payload: Value) -> Self {
        Self(vec![(url.into(), payload)])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&Value> {
        self.0.iter().find(|(key, _)| key == url).map(|(_, payload)| payload)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(url, payload)| (url.as_str(), payload))
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(url, _)| url.as_str())
    }
}

impl FromIterator<(String, Value)> for PageMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn page_url(url: &str, page: u64) -> String {
    with_query(url, &format!("page={page}&itemsPerPage={MAX_ITEMS_PER_PAGE}"))
}

/// Page URLs announced by the first response of `url`, or `None` when it has
/// no `meta` block and is therefore the only page.
fn page_urls(url: &str, first: &Value) -> Result<Option<Vec<String>>, Error> {
    let Some(meta) = first.get("meta") else {
        return Ok(None);
    };

    let total_items = meta
        .get("totalItems")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::query(format!("{url}: meta block has no numeric totalItems")))?;

    let pages = total_items.div_ceil(MAX_ITEMS_PER_PAGE);
    Ok(Some((1..=pages).map(|page| page_url(url, page)).collect()))
}

impl RiseCache {
    /// Fetch every page of the collection at `url`.
    ///
    /// A response without a `meta` block is not paginated and comes back as
    /// the only page, keyed by `url`.
    pub async fn get_or_fetch_all_pages(&self, url: &str, force_fetch: bool) -> Result<PageMap, Error> {
        let first = self.get_or_fetch(url, force_fetch).await?;

        let Some(urls) = page_urls(url, &first)? else {
            return Ok(PageMap::single(url, first));
        };

        let mut fetched = self.get_or_fetch_group(&urls, force_fetch).await?;
        let map: PageMap = urls
            .into_iter()
            .filter_map(|page| fetched.remove(&page).map(|payload| (page, payload)))
            .collect();

        tracing::info!(url, pages = map.len(), "fetched all pages");
        Ok(map)
    }

    /// [`RiseCache::get_or_fetch_all_pages`] for several collections at once.
    ///
    /// First pages go out as one settled group, then every follow-up page as
    /// a second one. A collection whose first page or any later page fails
    /// maps to that error; the others are unaffected.
    pub async fn get_or_fetch_all_pages_settled(
        &self, urls: &[String], force_fetch: bool,
    ) -> Result<HashMap<String, Result<PageMap, Error>>, Error> {
        let firsts = self.get_or_fetch_group_settled(urls, force_fetch).await?;

        let mut outcomes = HashMap::with_capacity(firsts.len());
        let mut pending: Vec<(String, Vec<String>)> = Vec::new();
        for (url, first) in firsts {
            let planned = first.and_then(|payload| page_urls(&url, &payload).map(|pages| (pages, payload)));
            match planned {
                Ok((Some(pages), _)) => pending.push((url, pages)),
                Ok((None, payload)) => {
                    outcomes.insert(url.clone(), Ok(PageMap::single(url, payload)));
                }
                Err(e) => {
                    outcomes.insert(url, Err(e));
                }
            }
        }

        let follow_up: Vec<String> = pending.iter().flat_map(|(_, pages)| pages.iter().cloned()).collect();
        let mut fetched = self.get_or_fetch_group_settled(&follow_up, force_fetch).await?;

        for (url, pages) in pending {
            let map: Result<PageMap, Error> = pages
                .into_iter()
                .map(|page| {
                    let outcome = fetched
                        .remove(&page)
                        .unwrap_or_else(|| Err(Error::NoData(format!("{page} missing from group fetch"))));
                    outcome.map(|payload| (page, payload))
                })
                .collect();
            outcomes.insert(url, map);
        }

        tracing::info!(collections = outcomes.len(), pages = follow_up.len(), "fetched all pages of several collections");
        Ok(outcomes)
    }
}

/// Concatenate the `data` arrays of every page onto the first page.
///
/// Returns the first page URL as the key of the merged payload. Pages
/// whose `data` is missing, empty or not an array are skipped. A single
/// object in the first page's `data` is wrapped into an array.
pub fn merge_pages(pages: &PageMap) -> Result<(String, Value), Error> {
    let mut iter = pages.iter();
    let Some((key, first)) = iter.next() else {
        return Err(Error::NoData("no pages to merge".to_string()));
    };

    let mut merged = first.clone();
    let Value::Object(map) = &mut merged else {
        return Err(Error::query(format!("{key}: first page is not a JSON object")));
    };

    let mut records = match map.get_mut("data").map(Value::take) {
        Some(Value::Array(records)) => records,
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    };

    for (_, page) in iter {
        match page.get("data") {
            Some(Value::Array(data)) if !data.is_empty() => records.extend(data.iter().cloned()),
            _ => continue,
        }
    }

    map.insert("data".to_string(), Value::Array(records));
    Ok((key.to_string(), merged))
}
