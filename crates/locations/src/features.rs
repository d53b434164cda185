//! GeoJSON feature output.

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, feature::Id};
use serde_json::Value;

use crate::model::{LocationCollection, LocationRecord};

/// One feature per location.
///
/// With `single_feature` and exactly one record the bare `Feature` is
/// returned instead of a collection, matching a lookup by id.
pub fn to_geojson(collection: &LocationCollection, single_feature: bool) -> GeoJson {
    let mut features: Vec<Feature> = collection.data.iter().map(to_feature).collect();

    if single_feature
        && features.len() == 1
        && let Some(feature) = features.pop()
    {
        return GeoJson::Feature(feature);
    }

    GeoJson::FeatureCollection(FeatureCollection { bbox: None, features, foreign_members: None })
}

fn to_feature(record: &LocationRecord) -> Feature {
    let attributes = &record.attributes;
    let geometry = attributes
        .location_coordinates
        .as_ref()
        .and_then(|raw| match geojson::Geometry::from_json_value(raw.clone()) {
            Ok(geometry) => Some(geometry),
            Err(error) => {
                tracing::warn!(location = %record.id, %error, "emitting feature without geometry");
                None
            }
        });

    let mut properties = JsonObject::new();
    properties.insert(
        "name".to_string(),
        attributes.location_name.clone().map(Value::String).unwrap_or(Value::Null),
    );
    properties.insert("id".to_string(), Value::from(attributes.numeric_id));
    properties.insert("elevation".to_string(), attributes.elevation.clone().unwrap_or(Value::Null));
    properties.insert(
        "updateDate".to_string(),
        attributes.update_date.clone().map(Value::String).unwrap_or(Value::Null),
    );

    Feature {
        bbox: None,
        geometry,
        id: Some(Id::Number(attributes.numeric_id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_by_id;
    use crate::fixtures;

    #[test]
    fn test_feature_collection() {
        let collection = fixtures::locations();
        let GeoJson::FeatureCollection(fc) = to_geojson(&collection, false) else {
            panic!("expected a feature collection");
        };

        assert_eq!(fc.features.len(), fixtures::LOCATION_COUNT);
        let first = &fc.features[0];
        assert_eq!(first.id, Some(Id::Number(3000.into())));
        assert_eq!(first.property("name"), Some(&Value::from("Reservoir 3000")));
        assert_eq!(first.property("elevation"), Some(&Value::from("1000")));
        assert!(first.geometry.is_some());
    }

    #[test]
    fn test_single_feature() {
        let one = filter_by_id(&fixtures::locations(), "3004");
        let GeoJson::Feature(feature) = to_geojson(&one, true) else {
            panic!("expected a bare feature");
        };
        assert_eq!(feature.id, Some(Id::Number(3004.into())));
    }

    #[test]
    fn test_single_feature_needs_exactly_one_record() {
        assert!(matches!(to_geojson(&fixtures::locations(), true), GeoJson::FeatureCollection(_)));
        let empty = filter_by_id(&fixtures::locations(), "1");
        assert!(matches!(to_geojson(&empty, true), GeoJson::FeatureCollection(fc) if fc.features.is_empty()));
    }

    #[test]
    fn test_serializes_as_geojson() {
        let one = filter_by_id(&fixtures::locations(), "3001");
        let value = serde_json::to_value(to_geojson(&one, false)).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["properties"]["id"], 3001);
    }
}
