//! Core types and shared functionality for rise-edr.
//!
//! This crate provides:
//! - The `CacheStore` abstraction with SQLite and Redis backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStore, RedisStore, SqliteStore, open_store};
pub use config::{AppConfig, CacheBackend, ConfigError};
pub use error::{Error, ErrorKind};
