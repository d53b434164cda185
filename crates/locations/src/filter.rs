//! Pure filters over a [`LocationCollection`].
//!
//! Every function borrows its input and returns a new collection; the
//! merged payload a caller holds (often straight out of the cache) is never
//! touched.

use geo::{Geometry, Relate};
use serde_json::Value;

use rise_core::Error;

use crate::model::{LocationCollection, LocationRecord};
use crate::parse::{ZFilter, parse_bbox, parse_datetime, parse_wkt, parse_z};

/// Keep records whose `updateDate` matches `datetime`.
///
/// A single value is a string prefix match (`2019-10` keeps every October
/// 2019 update). Two `/`-separated bounds form an inclusive range where
/// `..` leaves a side open.
pub fn filter_by_date(collection: &LocationCollection, datetime: &str) -> Result<LocationCollection, Error> {
    let filter = parse_datetime(datetime)?;
    Ok(retain(collection, |record| filter.matches(record.attributes.update_date.as_deref())))
}

/// Keep locations strictly inside a bbox and, optionally, at a z level.
///
/// The z range implied by a 6-value bbox replaces `z`.
pub fn filter_by_bbox(collection: &LocationCollection, bbox: &[f64], z: Option<&str>) -> Result<LocationCollection, Error> {
    let area = parse_bbox(bbox)?;
    let z = match area.z {
        Some(implied) => Some(implied),
        None => z.map(parse_z).transpose()?,
    };
    Ok(filter_by_geometry(collection, Some(&area.geometry), z.as_ref()))
}

/// Keep locations strictly inside a WKT geometry and, optionally, at a z level.
pub fn filter_by_wkt(collection: &LocationCollection, wkt: &str, z: Option<&str>) -> Result<LocationCollection, Error> {
    let geometry = parse_wkt(wkt)?;
    let z = z.map(parse_z).transpose()?;
    Ok(filter_by_geometry(collection, Some(&geometry), z.as_ref()))
}

/// Apply an already parsed geometry and z filter. `None` skips that test.
///
/// Locations whose geometry or elevation is missing or unreadable are
/// dropped while the corresponding test is active.
pub fn filter_by_geometry(
    collection: &LocationCollection, geometry: Option<&Geometry<f64>>, z: Option<&ZFilter>,
) -> LocationCollection {
    retain(collection, |record| {
        if let Some(z) = z {
            match elevation(record) {
                Some(elevation) if z.matches(elevation) => {}
                _ => return false,
            }
        }
        if let Some(area) = geometry {
            match location_geometry(record) {
                Some(location) => return area.relate(&location).is_contains(),
                None => return false,
            }
        }
        true
    })
}

/// The first `limit` records.
pub fn filter_by_limit(collection: &LocationCollection, limit: usize) -> LocationCollection {
    collection.with_records(collection.data.iter().take(limit).cloned().collect())
}

/// Everything after the first `offset` records.
pub fn remove_before_offset(collection: &LocationCollection, offset: usize) -> LocationCollection {
    collection.with_records(collection.data.iter().skip(offset).cloned().collect())
}

/// The record whose `_id` or location number is `id`; empty when none is.
pub fn filter_by_id(collection: &LocationCollection, id: &str) -> LocationCollection {
    let id = id.trim();
    retain(collection, |record| record.location_number() == id || record.numeric_id().to_string() == id)
}

pub fn drop_location(collection: &LocationCollection, numeric_id: i64) -> LocationCollection {
    retain(collection, |record| record.numeric_id() != numeric_id)
}

fn retain(collection: &LocationCollection, keep: impl Fn(&LocationRecord) -> bool) -> LocationCollection {
    collection.with_records(collection.data.iter().filter(|r| keep(r)).cloned().collect())
}

/// Elevation truncated toward zero.
fn elevation(record: &LocationRecord) -> Option<f64> {
    let raw = record.attributes.elevation.as_ref()?;
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed.filter(|v| v.is_finite()) {
        Some(v) => Some(v.trunc()),
        None => {
            tracing::warn!(location = %record.id, elevation = %raw, "unparseable elevation");
            None
        }
    }
}

/// Decode `locationCoordinates` into a planar geometry.
pub(crate) fn location_geometry(record: &LocationRecord) -> Option<Geometry<f64>> {
    let raw = record.attributes.location_coordinates.as_ref()?;
    let decoded = geojson::Geometry::from_json_value(raw.clone())
        .map_err(|e| e.to_string())
        .and_then(|g| Geometry::<f64>::try_from(g).map_err(|e| e.to_string()));
    match decoded {
        Ok(geometry) => Some(geometry),
        Err(error) => {
            tracing::warn!(location = %record.id, %error, "undecodable location geometry");
            None
        }
    }
}
