//! Query pipelines over the RISE location collection.
//!
//! A provider loads the merged collection through the cache, runs the
//! requested filters in order and serializes the result.

use geojson::GeoJson;
use serde::Serialize;

use rise_client::{ParameterFields, RiseCache, merge_pages, with_query};
use rise_core::{AppConfig, Error};

use crate::covjson::{CoverageCollection, to_covjson};
use crate::features::to_geojson;
use crate::filter::{
    filter_by_bbox, filter_by_date, filter_by_geometry, filter_by_limit, filter_by_wkt, remove_before_offset,
};
use crate::join::{Endpoints, fill_catalog_items, filter_by_properties};
use crate::model::LocationCollection;
use crate::parse::parse_z;

/// Feature item query.
#[derive(Debug, Clone, Default)]
pub struct ItemsQuery {
    /// Fetch this location only and return it as a bare feature.
    pub item_id: Option<String>,
    pub datetime: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub bbox: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    GeoJson,
    CovJson,
}

/// EDR location query.
#[derive(Debug, Clone, Default)]
pub struct LocationQuery {
    pub location_id: Option<String>,
    pub datetime: Option<String>,
    /// Parameter ids every returned location must measure.
    pub parameter_names: Vec<String>,
    pub bbox: Option<Vec<f64>>,
    pub wkt: Option<String>,
    pub z: Option<String>,
    pub limit: Option<usize>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LocationOutput {
    GeoJson(GeoJson),
    CovJson(CoverageCollection),
}

#[derive(Debug, Clone)]
pub struct LocationProvider {
    cache: RiseCache,
    endpoints: Endpoints,
}

impl LocationProvider {
    pub fn new(cache: RiseCache, endpoints: Endpoints) -> Self {
        Self { cache, endpoints }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(RiseCache::from_config(config).await?, Endpoints::from(config)))
    }

    pub fn cache(&self) -> &RiseCache {
        &self.cache
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Every location, all pages merged. An empty remote collection is an
    /// empty collection, not an error.
    pub async fn all_locations(&self, force_fetch: bool) -> Result<LocationCollection, Error> {
        let pages = self
            .cache
            .get_or_fetch_all_pages(&self.endpoints.location_api, force_fetch)
            .await?;
        if pages.is_empty() {
            return Ok(LocationCollection::default());
        }
        let (_, merged) = merge_pages(&pages)?;
        LocationCollection::from_payload(merged)
    }

    /// The single location RISE returns for `?id=<id>`.
    pub async fn location_by_id(&self, id: &str) -> Result<LocationCollection, Error> {
        let url = with_query(&self.endpoints.location_api, &format!("id={}", id.trim()));
        let payload = self.cache.get_or_fetch(&url, false).await?;
        LocationCollection::from_payload(payload)
    }

    /// Datetime, offset, limit, then bbox.
    pub async fn items(&self, query: &ItemsQuery) -> Result<GeoJson, Error> {
        let mut collection = match &query.item_id {
            Some(id) => self.location_by_id(id).await?,
            None => self.all_locations(false).await?,
        };

        if let Some(datetime) = &query.datetime {
            collection = filter_by_date(&collection, datetime)?;
        }
        if let Some(offset) = query.offset {
            collection = remove_before_offset(&collection, offset);
        }
        if let Some(limit) = query.limit {
            collection = filter_by_limit(&collection, limit);
        }
        if let Some(bbox) = query.bbox.as_deref().filter(|b| !b.is_empty()) {
            collection = filter_by_bbox(&collection, bbox, None)?;
        }

        Ok(to_geojson(&collection, query.item_id.is_some()))
    }

    /// Datetime, geometry and z, parameters, then limit.
    ///
    /// Parameter filtering runs after the local filters so only surviving
    /// locations have their catalog items resolved.
    pub async fn locations(&self, query: &LocationQuery) -> Result<LocationOutput, Error> {
        let mut collection = match &query.location_id {
            Some(id) => self.location_by_id(id).await?,
            None => self.all_locations(false).await?,
        };

        if let Some(datetime) = &query.datetime {
            collection = filter_by_date(&collection, datetime)?;
        }

        let z = query.z.as_deref();
        collection = match (&query.bbox, &query.wkt) {
            (Some(bbox), _) => filter_by_bbox(&collection, bbox, z)?,
            (None, Some(wkt)) => filter_by_wkt(&collection, wkt, z)?,
            (None, None) => match z {
                Some(z) => filter_by_geometry(&collection, None, Some(&parse_z(z)?)),
                None => collection,
            },
        };

        collection =
            filter_by_properties(&self.cache, &collection, &self.endpoints.base_url, &query.parameter_names).await?;

        if let Some(limit) = query.limit {
            collection = filter_by_limit(&collection, limit);
        }

        tracing::debug!(locations = collection.len(), format = ?query.format, "location query filtered");

        match query.format {
            OutputFormat::GeoJson => Ok(LocationOutput::GeoJson(to_geojson(&collection, query.location_id.is_some()))),
            OutputFormat::CovJson => {
                let filled = fill_catalog_items(&self.cache, &collection, &self.endpoints, true).await?;
                let fields = self.fields(false).await?;
                Ok(LocationOutput::CovJson(to_covjson(&filled, &fields)?))
            }
        }
    }

    /// Parameter field metadata.
    pub async fn fields(&self, force_fetch: bool) -> Result<ParameterFields, Error> {
        self.cache
            .get_or_fetch_parameters(&self.endpoints.parameter_api, force_fetch)
            .await
    }
}
