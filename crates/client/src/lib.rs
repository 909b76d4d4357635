//! Client code for shellcache.
//!
//! This crate provides the HTTP fetch seam and the offline-caching worker
//! engine: lifecycle, request routing, cache strategies, the control
//! channel, and notification dispatch.

pub mod fetch;
pub mod http;
pub mod worker;

pub use fetch::{FetchConfig, FetchError, Fetcher, HttpFetcher};
pub use http::{Request, Response};
pub use worker::{FetchOutcome, ServiceWorker};
