//! `items` command: locations as GeoJSON features.

use clap::Args;

use rise_locations::{ItemsQuery, LocationProvider, parse_bbox_values};

use crate::error::CliError;

/// Arguments for the items command.
#[derive(Debug, Clone, Default, Args)]
pub struct ItemsArgs {
    /// Return this location only, as a bare feature.
    #[arg(long)]
    pub id: Option<String>,

    /// `YYYY-MM-DD` prefix or `start/end` range on `updateDate`.
    #[arg(long)]
    pub datetime: Option<String>,

    /// Skip this many locations.
    #[arg(long)]
    pub offset: Option<usize>,

    #[arg(long)]
    pub limit: Option<usize>,

    /// `minx,miny,maxx,maxy` or `minx,miny,minz,maxx,maxy,maxz`.
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,
}

impl ItemsArgs {
    fn query(&self) -> Result<ItemsQuery, CliError> {
        Ok(ItemsQuery {
            item_id: self.id.clone(),
            datetime: self.datetime.clone(),
            offset: self.offset,
            limit: self.limit,
            bbox: self.bbox.as_deref().map(parse_bbox_values).transpose()?,
        })
    }
}

pub async fn items_impl(provider: &LocationProvider, args: &ItemsArgs) -> Result<String, CliError> {
    let output = provider.items(&args.query()?).await?;
    Ok(serde_json::to_string_pretty(&output)?)
}
