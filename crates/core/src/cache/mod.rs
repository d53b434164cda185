//! URL-keyed response cache.
//!
//! Responses from the remote API are stored verbatim under the exact request
//! URL. Two interchangeable backends sit behind the [`CacheStore`] trait:
//!
//! - [`SqliteStore`]: local file via tokio-rusqlite, with WAL and migrations
//! - [`RedisStore`]: external key-value service
//!
//! There is no TTL or eviction; entries leave only through `clear`/`reset`.

pub mod connection;
pub mod migrations;
pub mod redis_store;
pub mod responses;
pub mod store;

pub use crate::Error;

pub use connection::SqliteStore;
pub use redis_store::RedisStore;
pub use store::{CacheStore, open_store};
