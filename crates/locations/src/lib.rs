//! Location filtering, joins and output for rise-edr.
//!
//! Operates on merged location collections loaded through
//! [`rise_client::RiseCache`]. Filters are pure; only the parameter join and
//! the catalog item fill touch the cache.

pub mod covjson;
pub mod features;
pub mod filter;
pub mod join;
pub mod model;
pub mod parse;
pub mod provider;

#[cfg(test)]
mod fixtures;

pub use covjson::{CoverageCollection, to_covjson};
pub use features::to_geojson;
pub use filter::{
    drop_location, filter_by_bbox, filter_by_date, filter_by_geometry, filter_by_id, filter_by_limit, filter_by_wkt,
    remove_before_offset,
};
pub use join::{Endpoints, fill_catalog_items, filter_by_properties, get_catalog_item_urls, get_parameters};
pub use model::{CatalogItem, CatalogItemRef, LocationCollection, LocationRecord, ResultRecord};
pub use parse::{DateFilter, QueryArea, ZFilter, parse_bbox, parse_bbox_values, parse_datetime, parse_iso, parse_wkt, parse_z};
pub use provider::{ItemsQuery, LocationOutput, LocationProvider, LocationQuery, OutputFormat};
