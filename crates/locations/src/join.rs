//! Relationship resolution between locations and catalog items.
//!
//! Locations only carry `{type, id}` stubs for their catalog items. The
//! parameter a location measures, and its time series, live on the catalog
//! item and result resources, so both the parameter join and the fill
//! gather every location's URLs first and resolve them in one group fetch.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use rise_client::{PageMap, RiseCache, merge_pages, resolve_relationship, with_query};
use rise_core::{AppConfig, Error};

use crate::model::{CatalogItem, CatalogItemRef, LocationCollection, ResultRecord, value_to_id};

/// Where relationship ids and result series are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
    pub location_api: String,
    pub parameter_api: String,
    pub result_api: String,
}

impl From<&AppConfig> for Endpoints {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            location_api: config.location_api(),
            parameter_api: config.parameter_api(),
            result_api: config.result_api(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Absolute catalog item URLs per location number.
///
/// A location without a `catalogItems` relationship maps to an empty list.
pub fn get_catalog_item_urls(collection: &LocationCollection, base_url: &str) -> BTreeMap<String, Vec<String>> {
    collection
        .data
        .iter()
        .map(|record| {
            if record.relationships.catalog_items.is_none() {
                tracing::warn!(location = %record.id, "location has no catalogItems relationship");
            }
            let urls = record
                .catalog_items()
                .iter()
                .map(|item| resolve_relationship(base_url, item.id()))
                .collect();
            (record.location_number().to_string(), urls)
        })
        .collect()
}

/// Parameter ids measured at each location, keyed by location number.
///
/// Every location's catalog items are fetched in a single group, so one
/// failing item fails the whole join.
pub async fn get_parameters(
    cache: &RiseCache, collection: &LocationCollection, base_url: &str,
) -> Result<BTreeMap<String, Vec<String>>, Error> {
    let lookup = get_catalog_item_urls(collection, base_url);
    let urls: Vec<String> = lookup.values().flatten().cloned().collect();
    let fetched = cache.get_or_fetch_group(&urls, false).await?;

    let mut parameters = BTreeMap::new();
    for (location, item_urls) in lookup {
        let mut ids = Vec::with_capacity(item_urls.len());
        for url in &item_urls {
            let payload = fetched
                .get(url)
                .ok_or_else(|| Error::NoData(format!("{url} missing from group fetch")))?;
            if let Some(id) = parameter_id(url, payload)? {
                ids.push(id);
            }
        }
        parameters.insert(location, ids);
    }

    tracing::debug!(locations = parameters.len(), items = urls.len(), "resolved location parameters");
    Ok(parameters)
}

/// `data.attributes.parameterId` of a catalog item response. A null id is
/// `None`; a missing key is a structural error.
fn parameter_id(url: &str, payload: &Value) -> Result<Option<String>, Error> {
    let attributes = payload
        .get("data")
        .ok_or_else(|| Error::query(format!("catalog item {url} has no data")))?
        .get("attributes")
        .ok_or_else(|| Error::query(format!("catalog item {url} has no attributes")))?;
    let id = attributes
        .get("parameterId")
        .ok_or_else(|| Error::query(format!("catalog item {url} has no parameterId")))?;
    Ok(value_to_id(id))
}

/// Keep only locations that measure every parameter in `required`.
pub async fn filter_by_properties(
    cache: &RiseCache, collection: &LocationCollection, base_url: &str, required: &[String],
) -> Result<LocationCollection, Error> {
    if required.is_empty() {
        return Ok(collection.clone());
    }

    let parameters = get_parameters(cache, collection, base_url).await?;
    let records = collection
        .data
        .iter()
        .filter(|record| {
            parameters
                .get(record.location_number())
                .is_some_and(|ids| required.iter().all(|r| ids.contains(r)))
        })
        .cloned()
        .collect();

    Ok(collection.with_records(records))
}

/// Replace catalog item stubs with their resolved bodies.
///
/// Each distinct item URL is fetched once even when several locations
/// share it. With `include_results`, each resolved item also gets the
/// records from every page of `<result api>?itemId=<n>`. Items whose fetch
/// fails or whose body is unusable stay as stubs.
pub async fn fill_catalog_items(
    cache: &RiseCache, collection: &LocationCollection, endpoints: &Endpoints, include_results: bool,
) -> Result<LocationCollection, Error> {
    let mut items: HashMap<String, CatalogItem> = HashMap::new();
    let mut stubs = Vec::new();
    let mut seen = HashSet::new();

    for item_ref in collection.data.iter().flat_map(|record| record.catalog_items()) {
        let url = resolve_relationship(&endpoints.base_url, item_ref.id());
        if !seen.insert(url.clone()) {
            continue;
        }
        match item_ref {
            CatalogItemRef::Resolved(item) => {
                items.insert(url, (**item).clone());
            }
            CatalogItemRef::Stub { .. } => stubs.push(url),
        }
    }

    let mut unresolved = 0usize;
    for (url, outcome) in cache.get_or_fetch_group_settled(&stubs, false).await? {
        match outcome.and_then(|payload| decode_item(&url, &payload)) {
            Ok(item) => {
                items.insert(url, item);
            }
            Err(e) => {
                unresolved += 1;
                tracing::warn!(url = %url, error = %e, "leaving catalog item unresolved");
            }
        }
    }

    if include_results {
        attach_results(cache, &mut items, &endpoints.result_api).await?;
    }

    tracing::info!(resolved = items.len(), unresolved, include_results, "filled catalog items");

    let records = collection
        .data
        .iter()
        .map(|record| {
            let mut record = record.clone();
            if let Some(catalog_items) = record.relationships.catalog_items.as_mut() {
                for item_ref in &mut catalog_items.data {
                    let url = resolve_relationship(&endpoints.base_url, item_ref.id());
                    if let Some(item) = items.get(&url) {
                        *item_ref = CatalogItemRef::Resolved(Box::new(item.clone()));
                    }
                }
            }
            record
        })
        .collect();

    Ok(collection.with_records(records))
}

/// Attach every page of `<result api>?itemId=<n>` to each item. An item
/// whose series cannot be fetched or decoded keeps `results: None`.
async fn attach_results(cache: &RiseCache, items: &mut HashMap<String, CatalogItem>, result_api: &str) -> Result<(), Error> {
    let result_urls: HashMap<String, String> = items
        .iter()
        .map(|(url, item)| (url.clone(), with_query(result_api, &format!("itemId={}", item.item_number()))))
        .collect();
    let urls: Vec<String> = result_urls.values().cloned().collect();
    let mut fetched = cache.get_or_fetch_all_pages_settled(&urls, false).await?;

    for (url, item) in items.iter_mut() {
        let Some(outcome) = result_urls.get(url).and_then(|result_url| fetched.remove(result_url)) else {
            continue;
        };
        match outcome.and_then(|pages| merged_results(&pages)) {
            Ok(results) => item.results = Some(results),
            Err(e) => tracing::warn!(item = %item.id, error = %e, "results unavailable"),
        }
    }

    Ok(())
}

fn merged_results(pages: &PageMap) -> Result<Vec<ResultRecord>, Error> {
    if pages.is_empty() {
        return Ok(Vec::new());
    }
    let (_, merged) = merge_pages(pages)?;
    decode_results(&merged)
}

fn decode_item(url: &str, payload: &Value) -> Result<CatalogItem, Error> {
    let data = payload
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| Error::NoData(format!("catalog item {url} has no data")))?;
    serde_json::from_value(data.clone()).map_err(|e| Error::query(format!("unexpected catalog item {url}: {e}")))
}

fn decode_results(payload: &Value) -> Result<Vec<ResultRecord>, Error> {
    let Some(records) = payload.get("data").and_then(Value::as_array) else {
        return Err(Error::NoData("result response has no data array".to_string()));
    };

    records
        .iter()
        .map(|record| {
            let attributes = record.get("attributes").unwrap_or(record);
            let date_time = attributes
                .get("dateTime")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::query("result record has no dateTime"))?;
            let result = match attributes.get("result") {
                Some(Value::Number(n)) => n.as_f64(),
                Some(Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            };
            Ok(ResultRecord { date_time: date_time.to_string(), result })
        })
        .collect()
}
