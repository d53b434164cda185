//! Parsers for the query strings the filters accept.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use geo::{Geometry, Rect, coord};
use regex::Regex;
use wkt::TryFromWkt;

use rise_core::Error;

/// Vertical level filter.
#[derive(Debug, Clone, PartialEq)]
pub enum ZFilter {
    Single(f64),
    /// Inclusive on both ends.
    Range(f64, f64),
    Enumerated(Vec<f64>),
}

impl ZFilter {
    pub fn matches(&self, elevation: f64) -> bool {
        match self {
            ZFilter::Single(z) => elevation == *z,
            ZFilter::Range(lo, hi) => elevation >= *lo && elevation <= *hi,
            ZFilter::Enumerated(values) => values.contains(&elevation),
        }
    }
}

/// Most values an `R<count>/<start>/<step>` interval may expand to.
pub const MAX_Z_REPEAT: usize = 10_000;

static REPEAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^R(\d+)/(-?\d+(?:\.\d+)?)/(-?\d+(?:\.\d+)?)$").expect("valid repeat pattern"));

/// Parse a z value: `v`, `lo/hi`, `v1,v2,...` or `R<count>/<start>/<step>`.
pub fn parse_z(z: &str) -> Result<ZFilter, Error> {
    let z = z.trim();
    if z.is_empty() {
        return Err(Error::query("empty z value"));
    }

    if z.starts_with('R') {
        let caps = REPEAT
            .captures(z)
            .ok_or_else(|| Error::query(format!("invalid z interval: {z}")))?;
        let count: usize = caps[1]
            .parse()
            .map_err(|_| Error::query(format!("invalid z interval count: {z}")))?;
        if count == 0 || count > MAX_Z_REPEAT {
            return Err(Error::query(format!("z interval count must be between 1 and {MAX_Z_REPEAT}: {z}")));
        }
        let start = number(&caps[2], z)?;
        let step = number(&caps[3], z)?;
        return Ok(ZFilter::Enumerated((0..count).map(|i| start + step * i as f64).collect()));
    }

    if z.contains('/') {
        let parts: Vec<&str> = z.split('/').collect();
        let [lo, hi] = parts[..] else {
            return Err(Error::query(format!("invalid z range: {z}")));
        };
        let (lo, hi) = (number(lo, z)?, number(hi, z)?);
        if lo > hi {
            return Err(Error::query(format!("z range start is above its end: {z}")));
        }
        return Ok(ZFilter::Range(lo, hi));
    }

    if z.contains(',') {
        let values = z.split(',').map(|v| number(v, z)).collect::<Result<Vec<_>, _>>()?;
        return Ok(ZFilter::Enumerated(values));
    }

    Ok(ZFilter::Single(number(z, z)?))
}

fn number(part: &str, whole: &str) -> Result<f64, Error> {
    let part = part.trim();
    if part.is_empty() {
        return Err(Error::query(format!("empty entry in z value: {whole}")));
    }
    part.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::query(format!("invalid z value: {whole}")))
}

/// Planar query area plus the z range implied by a 6-value bbox.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryArea {
    pub geometry: Geometry<f64>,
    pub z: Option<ZFilter>,
}

/// Build a box from `minx,miny,maxx,maxy` or `minx,miny,minz,maxx,maxy,maxz`.
pub fn parse_bbox(bbox: &[f64]) -> Result<QueryArea, Error> {
    let (minx, miny, maxx, maxy, z) = match *bbox {
        [minx, miny, maxx, maxy] => (minx, miny, maxx, maxy, None),
        [minx, miny, minz, maxx, maxy, maxz] => {
            if minz > maxz {
                return Err(Error::query(format!("bbox minz {minz} is above maxz {maxz}")));
            }
            (minx, miny, maxx, maxy, Some(ZFilter::Range(minz, maxz)))
        }
        _ => {
            return Err(Error::query(format!("invalid bbox; expected 4 or 6 values but got {}", bbox.len())));
        }
    };

    if bbox.iter().any(|v| !v.is_finite()) {
        return Err(Error::query("bbox values must be finite numbers"));
    }

    let rect = Rect::new(coord! { x: minx, y: miny }, coord! { x: maxx, y: maxy });
    Ok(QueryArea { geometry: Geometry::Polygon(rect.to_polygon()), z })
}

/// Split a comma separated bbox string into numbers.
pub fn parse_bbox_values(bbox: &str) -> Result<Vec<f64>, Error> {
    bbox.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| Error::query(format!("invalid bbox value {v:?} in {bbox}")))
        })
        .collect()
}

pub fn parse_wkt(wkt: &str) -> Result<Geometry<f64>, Error> {
    Geometry::<f64>::try_from_wkt_str(wkt).map_err(|e| Error::query(format!("invalid WKT {wkt:?}: {e}")))
}

/// Parsed `datetime` parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DateFilter {
    /// Keep records whose update timestamp starts with this text.
    Prefix(String),
    /// Inclusive bounds; `None` is open (`..`).
    Range {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

impl DateFilter {
    /// Test a record's raw `updateDate`. Missing or unparseable dates never
    /// match.
    pub fn matches(&self, update_date: Option<&str>) -> bool {
        let Some(update_date) = update_date else {
            return false;
        };
        match self {
            DateFilter::Prefix(prefix) => update_date.starts_with(prefix.as_str()),
            DateFilter::Range { start, end } => match parse_iso(update_date) {
                Ok(date) => start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e),
                Err(_) => false,
            },
        }
    }
}

pub fn parse_datetime(datetime: &str) -> Result<DateFilter, Error> {
    let parts: Vec<&str> = datetime.split('/').collect();
    match parts[..] {
        [single] => Ok(DateFilter::Prefix(single.to_string())),
        [start, end] => {
            let start = bound(start)?;
            let end = bound(end)?;
            if let (Some(s), Some(e)) = (start, end)
                && s > e
            {
                return Err(Error::query(format!("start date must be before end date but got {s} and {e}")));
            }
            Ok(DateFilter::Range { start, end })
        }
        _ => Err(Error::query(format!(
            "datetime must be a date or a range of two dates separated by '/' but got {datetime}"
        ))),
    }
}

fn bound(value: &str) -> Result<Option<DateTime<Utc>>, Error> {
    match value.trim() {
        ".." => Ok(None),
        "" => Err(Error::query("empty datetime bound; use '..' for an open range")),
        value => parse_iso(value).map(Some),
    }
}

/// Parse an ISO 8601 timestamp. Naive datetimes are taken as UTC and plain
/// dates as midnight UTC.
pub fn parse_iso(value: &str) -> Result<DateTime<Utc>, Error> {
    let value = value.trim();
    let normalized = match value.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    Err(Error::query(format!("invalid ISO 8601 datetime: {value}")))
}
