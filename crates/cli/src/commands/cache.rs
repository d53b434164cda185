//! `cache` command: drop one cached response or all of them.

use clap::Subcommand;
use serde_json::json;

use rise_core::CacheStore;
use rise_locations::LocationProvider;

use crate::error::CliError;

#[derive(Debug, Clone, Subcommand)]
pub enum CacheCommand {
    /// Remove the cached response for one URL.
    Clear {
        url: String,
    },
    /// Remove every cached response.
    Reset,
}

pub async fn cache_impl(provider: &LocationProvider, command: &CacheCommand) -> Result<String, CliError> {
    let store = provider.cache().store();
    let output = match command {
        CacheCommand::Clear { url } => {
            let existed = store.contains(url).await?;
            store.clear(url).await?;
            tracing::info!(url = %url, existed, "cleared cache entry");
            json!({"cleared": url, "existed": existed})
        }
        CacheCommand::Reset => {
            store.reset().await?;
            tracing::info!("reset cache");
            json!({"reset": true})
        }
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{location_source, provider_with};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cache_clear_forces_refetch() {
        let source = Arc::new(location_source());
        let provider = provider_with(source.clone()).await;
        let url = provider.endpoints().location_api.clone();

        provider.all_locations(false).await.unwrap();
        let body = cache_impl(&provider, &CacheCommand::Clear { url: url.clone() }).await.unwrap();
        assert!(body.contains("\"existed\": true"));

        provider.all_locations(false).await.unwrap();
        assert_eq!(source.calls(&url), 2);
    }

    #[tokio::test]
    async fn test_cache_clear_missing_is_noop() {
        let provider = provider_with(Arc::new(location_source())).await;
        let body = cache_impl(&provider, &CacheCommand::Clear { url: "https://example.com/none".into() })
            .await
            .unwrap();
        assert!(body.contains("\"existed\": false"));
    }

    #[tokio::test]
    async fn test_cache_reset() {
        let provider = provider_with(Arc::new(location_source())).await;
        provider.all_locations(false).await.unwrap();

        cache_impl(&provider, &CacheCommand::Reset).await.unwrap();

        let store = provider.cache().store();
        assert!(!store.contains(&provider.endpoints().location_api).await.unwrap());
    }
}
