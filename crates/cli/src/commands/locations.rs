//! `locations` command: the EDR location query.

use clap::{Args, ValueEnum};

use rise_locations::{LocationProvider, LocationQuery, OutputFormat, parse_bbox_values};

use crate::error::CliError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Geojson,
    Covjson,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Geojson => OutputFormat::GeoJson,
            Format::Covjson => OutputFormat::CovJson,
        }
    }
}

/// Arguments for the locations command.
#[derive(Debug, Clone, Default, Args)]
pub struct LocationsArgs {
    /// Query a single location by id.
    #[arg(long)]
    pub location_id: Option<String>,

    #[arg(long)]
    pub datetime: Option<String>,

    /// Parameter ids every returned location must measure.
    #[arg(long = "parameter-name", value_delimiter = ',')]
    pub parameter_names: Vec<String>,

    #[arg(long, allow_hyphen_values = true, conflicts_with = "wkt")]
    pub bbox: Option<String>,

    /// WKT geometry locations must fall within.
    #[arg(long)]
    pub wkt: Option<String>,

    /// Elevation: `z`, `lo/hi` or `R<count>/<start>/<step>`.
    #[arg(long, allow_hyphen_values = true)]
    pub z: Option<String>,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

impl LocationsArgs {
    fn query(&self) -> Result<LocationQuery, CliError> {
        Ok(LocationQuery {
            location_id: self.location_id.clone(),
            datetime: self.datetime.clone(),
            parameter_names: self.parameter_names.clone(),
            bbox: self.bbox.as_deref().map(parse_bbox_values).transpose()?,
            wkt: self.wkt.clone(),
            z: self.z.clone(),
            limit: self.limit,
            format: self.format.into(),
        })
    }
}

pub async fn locations_impl(provider: &LocationProvider, args: &LocationsArgs) -> Result<String, CliError> {
    let output = provider.locations(&args.query()?).await?;
    Ok(serde_json::to_string_pretty(&output)?)
}
