//! SQLite-backed cache storage for intercepted responses.
//!
//! This module provides named cache partitions holding request-keyed
//! responses, persisted in SQLite with async access via tokio-rusqlite.
//! It supports:
//!
//! - Request keys derived from method + URL using SHA-256
//! - Implicit partition creation on first write, creation-ordered listing
//! - Atomic batch writes (used by the install precache)
//! - Partition deletion with cascading entry removal
//! - Automatic schema migrations

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
pub use partitions::PartitionInfo;
