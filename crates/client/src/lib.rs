//! Client code for rise-edr.
//!
//! This crate provides the HTTP JSON source, the cache-aside fetcher and the
//! page aggregation shared by the location engine and the CLI.

pub mod fetch;
pub mod fetcher;
pub mod pages;
pub mod parameters;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use fetch::{FetchClient, FetchConfig, JsonSource, resolve_relationship, with_query};
pub use fetcher::{DEFAULT_MAX_CONCURRENCY, RiseCache, Settled};
pub use pages::{MAX_ITEMS_PER_PAGE, PageMap, merge_pages};
pub use parameters::{ParameterField, ParameterFields, parameter_fields};
