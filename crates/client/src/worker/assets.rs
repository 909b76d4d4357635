//! Static asset manifest and cacheable URL patterns.

use regex::Regex;
use shellcache_core::Error;

/// Root-relative paths that make up the application shell.
///
/// Order is preserved and duplicates are dropped, so precaching the
/// manifest never writes the same path twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticManifest {
    paths: Vec<String>,
}

impl StaticManifest {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manifest = Self::default();
        for path in paths {
            let path = path.into();
            if !manifest.paths.contains(&path) {
                manifest.paths.push(path);
            }
        }
        manifest
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Exact path match; query strings are not part of the comparison.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// URL patterns eligible for the dynamic partition.
#[derive(Debug, Clone, Default)]
pub struct CacheablePatterns {
    patterns: Vec<Regex>,
}

impl CacheablePatterns {
    /// Compile patterns in order.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` naming the first pattern that fails to
    /// compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()).map_err(|e| Error::InvalidInput(format!("pattern {}: {e}", p.as_ref()))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Matched against the full URL, query string included.
    pub fn is_match(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(url))
    }
}
