//! Shared test data: a 25 location collection whose 236 catalog items are
//! served by a [`MockSource`].

use serde_json::{Value, json};

use rise_client::testing::MockSource;

use crate::model::LocationCollection;

pub const LOCATION_COUNT: usize = 25;
pub const CATALOG_ITEM_COUNT: usize = 236;

/// Only the first item of every fifth location measures this.
pub const RARE_PARAMETER: &str = "1830";

const FIRST_LOCATION: i64 = 3000;
const FIRST_ITEM: u32 = 128_562;
const COMMON: [i64; 4] = [3, 17, 18, 20];

/// (location id, [(item id, parameter id)])
fn layout() -> Vec<(i64, Vec<(u32, i64)>)> {
    let mut next_item = FIRST_ITEM;
    let mut locations = Vec::with_capacity(LOCATION_COUNT);

    for i in 0..LOCATION_COUNT {
        let count = if i < 11 { 10 } else { 9 };
        let mut items = Vec::with_capacity(count);
        for j in 0..count {
            let parameter = if j == 0 && i % 5 == 0 { 1830 } else { COMMON[next_item as usize % COMMON.len()] };
            items.push((next_item, parameter));
            next_item += 1;
        }
        locations.push((FIRST_LOCATION + i as i64, items));
    }

    locations
}

pub fn item_url(id: u32) -> String {
    format!("https://data.usbr.gov/rise/api/catalog-item/{id}")
}

pub fn location(id: i64, items: &[u32]) -> Value {
    let offset = (id % 25) as f64;
    json!({
        "id": format!("/rise/api/location/{id}"),
        "type": "Location",
        "attributes": {
            "_id": id,
            "locationName": format!("Reservoir {id}"),
            "locationCoordinates": {"type": "Point", "coordinates": [-120.0 + offset, 35.0 + offset / 5.0]},
            "elevation": format!("{}", 1000 + (id % 25) * 100),
            "updateDate": format!("2024-03-{:02}T12:00:00+00:00", 1 + id % 25),
            "locationTypeName": "Lake/Reservoir"
        },
        "relationships": {
            "catalogItems": {
                "data": items
                    .iter()
                    .map(|item| json!({"type": "CatalogItem", "id": format!("/rise/api/catalog-item/{item}")}))
                    .collect::<Vec<_>>()
            }
        }
    })
}

pub fn catalog_item(id: u32, parameter_id: Option<Value>) -> Value {
    let mut attributes = json!({
        "_id": id,
        "itemTitle": format!("Item {id}"),
        "parameterName": format!("Parameter for {id}"),
        "parameterUnit": "af"
    });
    if let Some(parameter_id) = parameter_id {
        attributes["parameterId"] = parameter_id;
    }
    json!({"data": {"id": format!("/rise/api/catalog-item/{id}"), "type": "CatalogItem", "attributes": attributes}})
}

/// Route a result series the way the API pages it: the bare `itemId` URL
/// plus every `page=<n>&itemsPerPage=100` page, each carrying `totalItems`.
pub fn route_results(source: &MockSource, item: u32, points: &[(String, Value)]) {
    let base = format!("https://data.usbr.gov/rise/api/result?itemId={item}");
    let page = |chunk: &[(String, Value)]| {
        let data: Vec<Value> = chunk
            .iter()
            .map(|(date_time, result)| json!({"type": "Result", "attributes": {"dateTime": date_time, "result": result}}))
            .collect();
        json!({"meta": {"totalItems": points.len()}, "data": data})
    };

    source.route(&base, page(&points[..points.len().min(100)]));
    for (n, chunk) in points.chunks(100).enumerate() {
        source.route(&format!("{base}&page={}&itemsPerPage=100", n + 1), page(chunk));
    }
}

/// `count` daily observations starting 2024-01-01.
pub fn daily_series(count: usize) -> Vec<(String, Value)> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    (0..count)
        .map(|i| {
            let day = start + chrono::Days::new(i as u64);
            (format!("{day}T00:00:00+00:00"), json!(i as f64))
        })
        .collect()
}

pub fn locations() -> LocationCollection {
    let data: Vec<Value> = layout()
        .iter()
        .map(|(id, items)| {
            let ids: Vec<u32> = items.iter().map(|(item, _)| *item).collect();
            location(*id, &ids)
        })
        .collect();
    LocationCollection::from_payload(json!({"meta": {"totalItems": LOCATION_COUNT}, "data": data}))
        .expect("fixture decodes")
}

pub fn catalog_source() -> MockSource {
    let source = MockSource::new();
    for (_, items) in layout() {
        for (item, parameter) in items {
            source.route(&item_url(item), catalog_item(item, Some(json!(parameter))));
        }
    }
    source
}

pub fn parameters_for(location: i64) -> Vec<String> {
    layout()
        .into_iter()
        .find(|(id, _)| *id == location)
        .map(|(_, items)| items.iter().map(|(_, p)| p.to_string()).collect())
        .unwrap_or_default()
}

pub fn locations_with_rare_parameter() -> Vec<i64> {
    layout()
        .into_iter()
        .filter(|(_, items)| items.iter().any(|(_, p)| p.to_string() == RARE_PARAMETER))
        .map(|(id, _)| id)
        .collect()
}
