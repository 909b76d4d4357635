//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the application shell is served from.
    ///
    /// Root-relative manifest paths and the offline shell (`/`) resolve
    /// against it. Set via SHELLCACHE_ORIGIN.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by every partition this application owns.
    ///
    /// Set via SHELLCACHE_CACHE_PREFIX.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag appended to partition names. Bumping it retires every
    /// partition of the previous generation on the next activation.
    ///
    /// Set via SHELLCACHE_CACHE_VERSION.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Requests whose path starts with this prefix are never intercepted.
    ///
    /// Set via SHELLCACHE_API_PREFIX.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Root-relative paths precached on install and served cache-first.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Regular expressions (matched against the full URL) selecting
    /// resources eligible for the dynamic partition.
    #[serde(default = "default_cacheable_patterns")]
    pub cacheable_patterns: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fallback presentation for push notifications.
    #[serde(default)]
    pub notification: NotificationDefaults,
}

/// Notification presentation used when a push payload omits a field.
///
/// Nested keys are set via SHELLCACHE_NOTIFICATION__TITLE and friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    #[serde(default = "default_notification_title")]
    pub title: String,
    #[serde(default = "default_notification_body")]
    pub body: String,
    #[serde(default = "default_notification_icon")]
    pub icon: String,
    #[serde(default = "default_notification_badge")]
    pub badge: String,
    /// Vibration pattern in milliseconds (on, off, on, ...).
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_prefix() -> String {
    "holy-grail-".into()
}

fn default_cache_version() -> String {
    "v2".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/manifest.json",
        "/icon-192x192.png",
        "/icon-512x512.png",
        "/apple-touch-icon.png",
        "/favicon-32x32.png",
        "/favicon-16x16.png",
        "/favicon.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_cacheable_patterns() -> Vec<String> {
    [
        r"\.js$",
        r"\.css$",
        r"\.woff2?$",
        r"\.png$",
        r"\.jpg$",
        r"\.jpeg$",
        r"\.svg$",
        r"\.ico$",
        r"fonts\.googleapis\.com",
        r"fonts\.gstatic\.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_notification_title() -> String {
    "聖杯ポートフォリオ".into()
}

fn default_notification_body() -> String {
    "新しい通知があります".into()
}

fn default_notification_icon() -> String {
    "/icon-192x192.png".into()
}

fn default_notification_badge() -> String {
    "/favicon-32x32.png".into()
}

fn default_vibrate() -> Vec<u32> {
    vec![100, 50, 100]
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            body: default_notification_body(),
            icon: default_notification_icon(),
            badge: default_notification_badge(),
            vibrate: default_vibrate(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            api_prefix: default_api_prefix(),
            static_assets: default_static_assets(),
            cacheable_patterns: default_cacheable_patterns(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            notification: NotificationDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./shellcache.sqlite"));
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.cache_prefix, "holy-grail-");
        assert_eq!(config.cache_version, "v2");
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.static_assets.len(), 8);
        assert_eq!(config.static_assets[0], "/");
        assert_eq!(config.cacheable_patterns.len(), 10);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.notification.vibrate, vec![100, 50, 100]);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_load_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SHELLCACHE_CACHE_VERSION", "v3");
            jail.set_env("SHELLCACHE_NOTIFICATION__TITLE", "Portfolio");
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_version, "v3");
            assert_eq!(config.notification.title, "Portfolio");
            assert_eq!(config.notification.body, "新しい通知があります");
            Ok(())
        });
    }

    #[test]
    fn test_load_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "shellcache.toml",
                r#"
                origin = "https://grail.example"
                static_assets = ["/", "/manifest.json"]
                "#,
            )?;
            jail.set_env("SHELLCACHE_CONFIG_FILE", "shellcache.toml");
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.origin, "https://grail.example");
            assert_eq!(config.static_assets, vec!["/".to_string(), "/manifest.json".to_string()]);
            Ok(())
        });
    }
}
