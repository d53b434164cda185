//! rise-edr entry point.
//!
//! Runs one query against the RISE catalog through the response cache and
//! prints the JSON body on stdout. Logging goes to stderr so the output can
//! be piped.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rise_core::AppConfig;
use rise_locations::LocationProvider;

use crate::commands::{
    cache::{CacheCommand, cache_impl},
    fields::{FieldsArgs, fields_impl},
    items::{ItemsArgs, items_impl},
    locations::{LocationsArgs, locations_impl},
};
use crate::error::CliError;

mod commands;
mod error;

/// Query the RISE location catalog.
#[derive(Debug, Parser)]
#[command(name = "rise-edr", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Locations as GeoJSON features.
    Items(ItemsArgs),
    /// EDR location query (GeoJSON or CoverageJSON).
    Locations(LocationsArgs),
    /// Parameter field catalog.
    Fields(FieldsArgs),
    /// Manage the response cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

async fn run(provider: &LocationProvider, command: &Command) -> Result<String, CliError> {
    match command {
        Command::Items(args) => items_impl(provider, args).await,
        Command::Locations(args) => locations_impl(provider, args).await,
        Command::Fields(args) => fields_impl(provider, args).await,
        Command::Cache(command) => cache_impl(provider, command).await,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::debug!(backend = ?config.cache_backend, base_url = %config.base_url, "loaded configuration");

    let provider = LocationProvider::from_config(&config)
        .await
        .context("failed to open the response cache")?;

    match run(&provider, &cli.command).await {
        Ok(body) => {
            println!("{body}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("{err}");
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}
