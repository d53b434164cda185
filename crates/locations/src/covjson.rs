//! CoverageJSON output for filled location collections.
//!
//! Each (location, parameter) pair with a non-empty time series becomes one
//! coverage:
//! - point locations get a `PointSeries` domain with `x`, `y` and `t` axes
//! - polygon locations get a `PolygonSeries` domain with a composite
//!   polygon axis and a `t` axis
//!
//! Ranges are `float` NdArrays along `t`; null observations stay null.
//!
//! See: <https://covjson.org/spec/>

use std::collections::BTreeMap;

use geo::{Geometry, LineString, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use rise_client::{ParameterField, ParameterFields};
use rise_core::Error;

use crate::filter::location_geometry;
use crate::model::{CatalogItem, LocationCollection, LocationRecord, ResultRecord};

const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub parameters: BTreeMap<String, CovParameter>,

    pub referencing: Vec<ReferenceSystemConnection>,

    pub coverages: Vec<Coverage>,
}

impl CoverageCollection {
    pub fn new() -> Self {
        Self {
            type_: "CoverageCollection".to_string(),
            parameters: BTreeMap::new(),
            referencing: vec![
                ReferenceSystemConnection {
                    coordinates: vec!["x".to_string(), "y".to_string()],
                    system: ReferenceSystem::Geographic { id: CRS84.to_string() },
                },
                ReferenceSystemConnection {
                    coordinates: vec!["t".to_string()],
                    system: ReferenceSystem::Temporal { calendar: "Gregorian".to_string() },
                },
            ],
            coverages: Vec::new(),
        }
    }
}

impl Default for CoverageCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    #[serde(rename = "type")]
    pub type_: String,

    pub domain: Domain,

    pub ranges: BTreeMap<String, NdArray>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(rename = "domainType")]
    pub domain_type: DomainType,

    pub axes: BTreeMap<String, Axis>,
}

impl Domain {
    /// Time series at a single point.
    pub fn point_series(x: f64, y: f64, t: Vec<String>) -> Self {
        let mut axes = BTreeMap::new();
        axes.insert("x".to_string(), Axis::values(vec![json!(x)]));
        axes.insert("y".to_string(), Axis::values(vec![json!(y)]));
        axes.insert("t".to_string(), Axis::times(t));
        Self { type_: "Domain".to_string(), domain_type: DomainType::PointSeries, axes }
    }

    /// Time series over one polygon.
    pub fn polygon_series(polygon: &Polygon<f64>, t: Vec<String>) -> Self {
        let rings: Vec<Value> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(ring_coordinates)
            .collect();

        let mut axes = BTreeMap::new();
        axes.insert(
            "composite".to_string(),
            Axis {
                data_type: Some("polygon".to_string()),
                coordinates: Some(vec!["x".to_string(), "y".to_string()]),
                values: vec![Value::Array(rings)],
            },
        );
        axes.insert("t".to_string(), Axis::times(t));
        Self { type_: "Domain".to_string(), domain_type: DomainType::PolygonSeries, axes }
    }
}

fn ring_coordinates(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainType {
    PointSeries,
    PolygonSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(rename = "dataType", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<String>>,

    pub values: Vec<Value>,
}

impl Axis {
    pub fn values(values: Vec<Value>) -> Self {
        Self { data_type: None, coordinates: None, values }
    }

    fn times(t: Vec<String>) -> Self {
        Self::values(t.into_iter().map(Value::String).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSystemConnection {
    pub coordinates: Vec<String>,
    pub system: ReferenceSystem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReferenceSystem {
    #[serde(rename = "GeographicCRS")]
    Geographic { id: String },

    #[serde(rename = "TemporalRS")]
    Temporal { calendar: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I18nString {
    pub en: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedProperty {
    pub label: I18nString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovParameter {
    #[serde(rename = "type")]
    pub type_: String,

    pub description: I18nString,

    pub unit: Unit,

    #[serde(rename = "observedProperty")]
    pub observed_property: ObservedProperty,
}

impl CovParameter {
    pub fn new(title: impl Into<String>, description: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            type_: "Parameter".to_string(),
            description: I18nString { en: description.into() },
            unit: Unit { symbol: unit.into() },
            observed_property: ObservedProperty { label: I18nString { en: title.into() } },
        }
    }

    /// Parameter metadata from the catalog item itself, for ids the field
    /// catalog does not know.
    fn from_item(id: &str, item: &CatalogItem) -> Self {
        let attributes = &item.attributes;
        let title = attributes.parameter_name.clone().unwrap_or_else(|| id.to_string());
        let description = attributes.item_title.clone().unwrap_or_else(|| title.clone());
        Self::new(title, description, attributes.parameter_unit.clone().unwrap_or_default())
    }
}

impl From<&ParameterField> for CovParameter {
    fn from(field: &ParameterField) -> Self {
        Self::new(&field.title, &field.description, &field.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(rename = "dataType")]
    pub data_type: String,

    #[serde(rename = "axisNames")]
    pub axis_names: Vec<String>,

    pub shape: Vec<usize>,

    pub values: Vec<Option<f64>>,
}

impl NdArray {
    /// One value per step of the `t` axis.
    pub fn time_series(values: Vec<Option<f64>>) -> Self {
        Self {
            type_: "NdArray".to_string(),
            data_type: "float".to_string(),
            axis_names: vec!["t".to_string()],
            shape: vec![values.len()],
            values,
        }
    }
}

/// Build a coverage collection from a collection filled with results.
///
/// `fields` supplies parameter metadata; only ids that end up in a coverage
/// are copied into the output's `parameters` block.
pub fn to_covjson(collection: &LocationCollection, fields: &ParameterFields) -> Result<CoverageCollection, Error> {
    let refs = collection.data.iter().flat_map(|r| r.catalog_items()).count();
    let filled = collection
        .data
        .iter()
        .flat_map(|r| r.catalog_items())
        .filter_map(|item| item.resolved())
        .any(|item| item.results.is_some());
    if refs > 0 && !filled {
        return Err(Error::query("catalog items must be filled with results before CoverageJSON output"));
    }

    let mut output = CoverageCollection::new();

    for record in &collection.data {
        let Some(geometry) = location_geometry(record) else {
            continue;
        };
        if !matches!(geometry, Geometry::Point(_) | Geometry::Polygon(_)) {
            tracing::warn!(location = %record.id, "skipping coverage for unsupported geometry type");
            continue;
        }

        for (parameter, item, results) in series_by_parameter(record) {
            let t: Vec<String> = results.iter().map(|r| r.date_time.clone()).collect();
            let domain = match &geometry {
                Geometry::Point(point) => Domain::point_series(point.x(), point.y(), t),
                Geometry::Polygon(polygon) => Domain::polygon_series(polygon, t),
                _ => continue,
            };

            let mut ranges = BTreeMap::new();
            ranges.insert(parameter.clone(), NdArray::time_series(results.iter().map(|r| r.result).collect()));
            output.coverages.push(Coverage { type_: "Coverage".to_string(), domain, ranges });

            output.parameters.entry(parameter).or_insert_with_key(|id| match fields.get(id) {
                Some(field) => CovParameter::from(field),
                None => CovParameter::from_item(id, item),
            });
        }
    }

    tracing::debug!(coverages = output.coverages.len(), parameters = output.parameters.len(), "built coverage collection");
    Ok(output)
}

/// One series per parameter of a location, in first-seen order. When several
/// items measure the same parameter the longest series wins; ties keep the
/// earlier item.
fn series_by_parameter(record: &LocationRecord) -> Vec<(String, &CatalogItem, &[ResultRecord])> {
    let mut picked: Vec<(String, &CatalogItem, &[ResultRecord])> = Vec::new();

    for item in record.catalog_items().iter().filter_map(|r| r.resolved()) {
        let Some(parameter) = item.parameter_id() else {
            continue;
        };
        let Some(results) = item.results.as_deref().filter(|r| !r.is_empty()) else {
            continue;
        };

        match picked.iter_mut().find(|(id, _, _)| *id == parameter) {
            Some(entry) if results.len() > entry.2.len() => *entry = (parameter, item, results),
            Some(_) => {}
            None => picked.push((parameter, item, results)),
        }
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: u32, parameter: Value, results: Value) -> Value {
        json!({
            "id": format!("/rise/api/catalog-item/{id}"),
            "type": "CatalogItem",
            "attributes": {"parameterId": parameter, "parameterName": "Storage", "parameterUnit": "af"},
            "results": results
        })
    }

    fn filled(geometry: Value, items: Vec<Value>) -> LocationCollection {
        LocationCollection::from_payload(json!({
            "data": [{
                "id": "/rise/api/location/6902",
                "type": "Location",
                "attributes": {"_id": 6902, "locationCoordinates": geometry},
                "relationships": {"catalogItems": {"data": items}}
            }]
        }))
        .unwrap()
    }

    fn fields() -> ParameterFields {
        let mut fields = ParameterFields::new();
        for (id, title) in [("3", "Lake/Reservoir Storage"), ("20", "Lake/Reservoir Elevation")] {
            fields.insert(
                id.to_string(),
                ParameterField {
                    kind: "af".into(),
                    title: title.into(),
                    description: format!("{title} description"),
                    unit: "af".into(),
                },
            );
        }
        fields
    }

    fn series() -> Value {
        json!([
            {"dateTime": "2024-01-01T00:00:00+00:00", "result": 10.5},
            {"dateTime": "2024-01-02T00:00:00+00:00", "result": null},
            {"dateTime": "2024-01-03T00:00:00+00:00", "result": 12}
        ])
    }

    #[test]
    fn test_point_series() {
        let collection = filled(json!({"type": "Point", "coordinates": [-111.5, 36.9]}), vec![item(1, json!(3), series())]);
        let output = to_covjson(&collection, &fields()).unwrap();

        assert_eq!(output.coverages.len(), 1);
        let coverage = &output.coverages[0];
        assert_eq!(coverage.domain.domain_type, DomainType::PointSeries);
        assert_eq!(coverage.domain.axes["x"].values, vec![json!(-111.5)]);
        assert_eq!(coverage.domain.axes["t"].len(), 3);

        let range = &coverage.ranges["3"];
        assert_eq!(range.shape, vec![3]);
        assert_eq!(range.values, vec![Some(10.5), None, Some(12.0)]);
        assert_eq!(range.axis_names, vec!["t"]);
    }

    #[test]
    fn test_polygon_series() {
        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[-112.0, 36.0], [-111.0, 36.0], [-111.0, 37.0], [-112.0, 36.0]]]
        });
        let output = to_covjson(&filled(polygon, vec![item(1, json!(3), series())]), &fields()).unwrap();

        let domain = &output.coverages[0].domain;
        assert_eq!(domain.domain_type, DomainType::PolygonSeries);
        let composite = &domain.axes["composite"];
        assert_eq!(composite.data_type.as_deref(), Some("polygon"));
        assert_eq!(composite.values[0][0][0], json!([-112.0, 36.0]));
        assert!(!domain.axes.contains_key("x"));
    }

    #[test]
    fn test_parameters_filtered_to_output() {
        let collection = filled(
            json!({"type": "Point", "coordinates": [-111.5, 36.9]}),
            vec![item(1, json!(3), series()), item(2, json!(20), json!([]))],
        );
        let output = to_covjson(&collection, &fields()).unwrap();

        assert_eq!(output.parameters.keys().collect::<Vec<_>>(), vec!["3"]);
        assert_eq!(output.parameters["3"].observed_property.label.en, "Lake/Reservoir Storage");
    }

    #[test]
    fn test_unknown_parameter_uses_item_metadata() {
        let collection = filled(json!({"type": "Point", "coordinates": [0.0, 0.0]}), vec![item(1, json!(99), series())]);
        let output = to_covjson(&collection, &fields()).unwrap();
        assert_eq!(output.parameters["99"].observed_property.label.en, "Storage");
        assert_eq!(output.parameters["99"].unit.symbol, "af");
    }

    #[test]
    fn test_unfilled_collection_is_rejected() {
        let collection = filled(
            json!({"type": "Point", "coordinates": [0.0, 0.0]}),
            vec![json!({"type": "CatalogItem", "id": "/rise/api/catalog-item/1"})],
        );
        assert!(matches!(to_covjson(&collection, &fields()), Err(Error::Query(_))));
    }

    #[test]
    fn test_resolved_items_without_results_are_rejected() {
        let collection = filled(
            json!({"type": "Point", "coordinates": [0.0, 0.0]}),
            vec![json!({
                "id": "/rise/api/catalog-item/1",
                "type": "CatalogItem",
                "attributes": {"parameterId": 3}
            })],
        );
        assert!(matches!(to_covjson(&collection, &fields()), Err(Error::Query(_))));
    }

    #[test]
    fn test_one_coverage_per_parameter() {
        let short = json!([
            {"dateTime": "2024-02-01T00:00:00+00:00", "result": 1.0},
            {"dateTime": "2024-02-02T00:00:00+00:00", "result": 2.0}
        ]);
        let collection = filled(
            json!({"type": "Point", "coordinates": [-111.5, 36.9]}),
            vec![item(1, json!(3), short), item(2, json!(3), series()), item(3, json!(20), series())],
        );
        let output = to_covjson(&collection, &fields()).unwrap();

        assert_eq!(output.coverages.len(), 2);
        let storage = &output.coverages[0].ranges["3"];
        assert_eq!(storage.shape, vec![3]);
        assert_eq!(storage.values[0], Some(10.5));
        assert!(output.coverages[1].ranges.contains_key("20"));
    }

    #[test]
    fn test_equal_series_keep_first_item() {
        let other = json!([
            {"dateTime": "2023-01-01T00:00:00+00:00", "result": 1.0},
            {"dateTime": "2023-01-02T00:00:00+00:00", "result": 2.0},
            {"dateTime": "2023-01-03T00:00:00+00:00", "result": 3.0}
        ]);
        let collection = filled(
            json!({"type": "Point", "coordinates": [-111.5, 36.9]}),
            vec![item(1, json!(3), series()), item(2, json!(3), other)],
        );
        let output = to_covjson(&collection, &fields()).unwrap();

        assert_eq!(output.coverages.len(), 1);
        assert_eq!(output.coverages[0].domain.axes["t"].values[0], json!("2024-01-01T00:00:00+00:00"));
    }

    #[test]
    fn test_serialized_shape() {
        let collection = filled(json!({"type": "Point", "coordinates": [-111.5, 36.9]}), vec![item(1, json!(3), series())]);
        let value = serde_json::to_value(to_covjson(&collection, &fields()).unwrap()).unwrap();

        assert_eq!(value["type"], "CoverageCollection");
        assert_eq!(value["referencing"][0]["system"]["type"], "GeographicCRS");
        assert_eq!(value["coverages"][0]["type"], "Coverage");
        assert_eq!(value["coverages"][0]["domain"]["domainType"], "PointSeries");
        assert_eq!(value["coverages"][0]["ranges"]["3"]["type"], "NdArray");
        assert_eq!(value["coverages"][0]["ranges"]["3"]["dataType"], "float");
        assert_eq!(value["parameters"]["3"]["type"], "Parameter");
    }
}
