//! `fields` command: the parameter field catalog.

use clap::Args;

use rise_locations::LocationProvider;

use crate::error::CliError;

#[derive(Debug, Clone, Default, Args)]
pub struct FieldsArgs {
    /// Refetch the parameter collection even if it is cached.
    #[arg(long)]
    pub force: bool,
}

pub async fn fields_impl(provider: &LocationProvider, args: &FieldsArgs) -> Result<String, CliError> {
    let fields = provider.fields(args.force).await?;
    Ok(serde_json::to_string_pretty(&fields)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::provider_with;
    use rise_client::testing::MockSource;
    use rise_locations::Endpoints;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn parameter_source() -> Arc<MockSource> {
        let endpoints = Endpoints::default();
        Arc::new(MockSource::new().with_route(
            &endpoints.parameter_api,
            json!({"data": [{"attributes": {
                "_id": 17, "parameterName": "Elevation", "parameterDescription": "Lake elevation", "parameterUnit": "ft"
            }}]}),
        ))
    }

    #[tokio::test]
    async fn test_fields_impl() {
        let provider = provider_with(parameter_source()).await;
        let body = fields_impl(&provider, &FieldsArgs::default()).await.unwrap();

        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["17"]["title"], "Elevation");
        assert_eq!(value["17"]["x-ogc-unit"], "ft");
    }

    #[tokio::test]
    async fn test_fields_impl_force_refetches() {
        let source = parameter_source();
        let provider = provider_with(source.clone()).await;
        let url = provider.endpoints().parameter_api.clone();

        fields_impl(&provider, &FieldsArgs::default()).await.unwrap();
        fields_impl(&provider, &FieldsArgs::default()).await.unwrap();
        assert_eq!(source.calls(&url), 1);

        fields_impl(&provider, &FieldsArgs { force: true }).await.unwrap();
        assert_eq!(source.calls(&url), 2);
    }
}
