//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, PartitionInfo, StoredResponse};
pub use config::{AppConfig, ConfigError, NotificationDefaults};
pub use error::Error;
