//! Cache inspection tools.
//!
//! Read-only views over the partitions the worker maintains.

pub mod keys;
pub mod lookup;

pub use keys::keys_impl;
pub use lookup::{CacheMatchParams, match_impl};
