//! Request classification.
//!
//! Decision order (first match wins):
//! 1. non-GET method → pass through
//! 2. path under the API prefix → pass through
//! 3. non-http(s) scheme → pass through
//! 4. path in the static manifest → cache-first
//! 5. URL matches a cacheable pattern → network-first
//! 6. Accept asks for HTML → network-first
//! 7. anything else → network-first

use reqwest::Method;
use serde::{Deserialize, Serialize};
use shellcache_core::{AppConfig, Error};

use super::assets::{CacheablePatterns, StaticManifest};
use crate::http::Request;

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassReason {
    NonGet,
    Api,
    NonHttp,
}

/// Why a request went network-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NetworkReason {
    Cacheable,
    Navigation,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "route", content = "reason", rename_all = "snake_case")]
pub enum Route {
    Passthrough(PassReason),
    CacheFirst,
    NetworkFirst(NetworkReason),
}

#[derive(Debug, Clone)]
pub struct Router {
    manifest: StaticManifest,
    patterns: CacheablePatterns,
    api_prefix: String,
}

impl Router {
    pub fn new(manifest: StaticManifest, patterns: CacheablePatterns, api_prefix: impl Into<String>) -> Self {
        Self { manifest, patterns, api_prefix: api_prefix.into() }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(
            StaticManifest::new(config.static_assets.iter().cloned()),
            CacheablePatterns::new(&config.cacheable_patterns)?,
            config.api_prefix.clone(),
        ))
    }

    pub fn manifest(&self) -> &StaticManifest {
        &self.manifest
    }

    pub fn route(&self, request: &Request) -> Route {
        if request.method != Method::GET {
            return Route::Passthrough(PassReason::NonGet);
        }

        let url = &request.url;
        if url.path().starts_with(&self.api_prefix) {
            return Route::Passthrough(PassReason::Api);
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Route::Passthrough(PassReason::NonHttp);
        }

        if self.manifest.contains(url.path()) {
            return Route::CacheFirst;
        }

        if self.patterns.is_match(url.as_str()) {
            return Route::NetworkFirst(NetworkReason::Cacheable);
        }

        if request.accepts_html() {
            return Route::NetworkFirst(NetworkReason::Navigation);
        }

        Route::NetworkFirst(NetworkReason::Default)
    }
}
