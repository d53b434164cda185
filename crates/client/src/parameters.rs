//! Parameter field metadata from `/rise/api/parameter`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rise_core::Error;

use crate::fetcher::RiseCache;
use crate::pages::merge_pages;

/// Field description for one RISE parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterField {
    /// RISE reports the unit here; the field catalog keeps that convention.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "x-ogc-unit")]
    pub unit: String,
}

/// Parameter id (as a string) to its field description.
pub type ParameterFields = BTreeMap<String, ParameterField>;

impl RiseCache {
    /// Fetch every page of the parameter collection at `parameter_api` and
    /// build the field catalog.
    pub async fn get_or_fetch_parameters(&self, parameter_api: &str, force_fetch: bool) -> Result<ParameterFields, Error> {
        let pages = self.get_or_fetch_all_pages(parameter_api, force_fetch).await?;
        let (_, merged) = merge_pages(&pages)?;
        let fields = parameter_fields(&merged)?;
        tracing::debug!(count = fields.len(), "loaded parameter fields");
        Ok(fields)
    }
}

/// Build the field catalog from a merged parameter collection.
pub fn parameter_fields(collection: &Value) -> Result<ParameterFields, Error> {
    let records = collection
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::query("parameter collection has no data array"))?;

    records.iter().map(parameter_field).collect()
}

fn parameter_field(record: &Value) -> Result<(String, ParameterField), Error> {
    let attributes = record
        .get("attributes")
        .ok_or_else(|| Error::query("parameter record has no attributes"))?;

    let id = match required(attributes, "_id")? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let unit = text(required(attributes, "parameterUnit")?);

    let field = ParameterField {
        kind: unit.clone(),
        title: text(required(attributes, "parameterName")?),
        description: text(required(attributes, "parameterDescription")?),
        unit,
    };
    Ok((id, field))
}

fn required<'a>(attributes: &'a Value, key: &str) -> Result<&'a Value, Error> {
    attributes
        .get(key)
        .ok_or_else(|| Error::query(format!("parameter attributes missing {key}")))
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
