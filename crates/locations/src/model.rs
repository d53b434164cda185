//! Location collection types as served by `/rise/api/location`.
//!
//! Only the fields the filters and serializers read are typed; everything
//! else rides along in `extra` so a filtered collection re-serializes with
//! the attributes it came in with.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use rise_core::Error;

/// Prefix of every location id.
pub const LOCATION_PREFIX: &str = "/rise/api/location/";

/// A merged (or single-page) location response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationCollection {
    #[serde(default, deserialize_with = "one_or_many")]
    pub data: Vec<LocationRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocationCollection {
    /// Decode a raw response payload.
    pub fn from_payload(payload: Value) -> Result<Self, Error> {
        serde_json::from_value(payload).map_err(|e| Error::query(format!("unexpected location payload: {e}")))
    }

    /// A copy of this collection holding `data` instead of its records.
    pub fn with_records(&self, data: Vec<LocationRecord>) -> Self {
        Self { data, meta: self.meta.clone(), links: self.links.clone(), extra: self.extra.clone() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    pub attributes: LocationAttributes,

    #[serde(default)]
    pub relationships: Relationships,
}

impl LocationRecord {
    /// The trailing number of the record id, e.g. `6902` for
    /// `/rise/api/location/6902`.
    pub fn location_number(&self) -> &str {
        self.id.strip_prefix(LOCATION_PREFIX).unwrap_or(&self.id)
    }

    pub fn numeric_id(&self) -> i64 {
        self.attributes.numeric_id
    }

    /// Catalog item refs, empty when the relationship is absent.
    pub fn catalog_items(&self) -> &[CatalogItemRef] {
        self.relationships
            .catalog_items
            .as_ref()
            .map(|items| items.data.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAttributes {
    #[serde(rename = "_id")]
    pub numeric_id: i64,

    #[serde(rename = "locationName", default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,

    /// GeoJSON geometry object.
    #[serde(rename = "locationCoordinates", default, skip_serializing_if = "Option::is_none")]
    pub location_coordinates: Option<Value>,

    /// Number or numeric string; RISE is not consistent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<Value>,

    #[serde(rename = "updateDate", default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(rename = "catalogItems", default, skip_serializing_if = "Option::is_none")]
    pub catalog_items: Option<CatalogItems>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItems {
    #[serde(default, deserialize_with = "one_or_many")]
    pub data: Vec<CatalogItemRef>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Either the `{type, id}` stub a location carries or the resolved body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogItemRef {
    Resolved(Box<CatalogItem>),
    Stub {
        id: String,
        #[serde(rename = "type", default)]
        kind: String,
    },
}

impl CatalogItemRef {
    pub fn id(&self) -> &str {
        match self {
            CatalogItemRef::Resolved(item) => &item.id,
            CatalogItemRef::Stub { id, .. } => id,
        }
    }

    pub fn resolved(&self) -> Option<&CatalogItem> {
        match self {
            CatalogItemRef::Resolved(item) => Some(item),
            CatalogItemRef::Stub { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    pub attributes: CatalogItemAttributes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ResultRecord>>,
}

impl CatalogItem {
    /// The trailing number of the item id, used as `itemId` on the result API.
    pub fn item_number(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }

    /// Parameter id rendered as a string; `None` when RISE has none.
    pub fn parameter_id(&self) -> Option<String> {
        self.attributes.parameter_id.as_ref().and_then(value_to_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemAttributes {
    #[serde(rename = "itemTitle", default, skip_serializing_if = "Option::is_none")]
    pub item_title: Option<String>,

    #[serde(rename = "parameterId", default, skip_serializing_if = "Option::is_none")]
    pub parameter_id: Option<Value>,

    #[serde(rename = "parameterName", default, skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,

    #[serde(rename = "parameterUnit", default, skip_serializing_if = "Option::is_none")]
    pub parameter_unit: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One observation from `/rise/api/result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    pub result: Option<f64>,
}

/// Render a JSON id (number or string) as a string, `None` for null.
pub(crate) fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Accept a single object, a list, or null where a list is expected.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}
