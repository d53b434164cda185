//! Subcommand implementations.
//!
//! Each `*_impl` returns the pretty-printed JSON body so `main` only has to
//! write it to stdout.

pub mod cache;
pub mod fields;
pub mod items;
pub mod locations;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use rise_client::{RiseCache, testing::MockSource};
    use rise_core::SqliteStore;
    use rise_locations::{Endpoints, LocationProvider};
    use serde_json::{Value, json};

    pub async fn provider_with(source: Arc<MockSource>) -> LocationProvider {
        let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
        LocationProvider::new(RiseCache::new(store, source), Endpoints::default())
    }

    pub fn location(id: i64, lon: f64, lat: f64, update_date: &str) -> Value {
        json!({
            "id": format!("/rise/api/location/{id}"),
            "type": "Location",
            "attributes": {
                "_id": id,
                "locationName": format!("Site {id}"),
                "locationCoordinates": {"type": "Point", "coordinates": [lon, lat]},
                "elevation": "1200",
                "updateDate": update_date
            },
            "relationships": {"catalogItems": {"data": []}}
        })
    }

    /// Three locations behind a one page `meta` block.
    pub fn location_source() -> MockSource {
        let endpoints = Endpoints::default();
        let page = json!({
            "meta": {"totalItems": 3},
            "data": [
                location(1, -105.0, 40.0, "2024-01-01T00:00:00+00:00"),
                location(2, -110.0, 35.0, "2024-02-01T00:00:00+00:00"),
                location(3, -120.0, 38.0, "2024-03-01T00:00:00+00:00")
            ]
        });
        MockSource::new()
            .with_route(&endpoints.location_api, page.clone())
            .with_route(&format!("{}?page=1&itemsPerPage=100", endpoints.location_api), page)
    }
}
