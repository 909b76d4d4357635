//! Partition naming for one deployed cache generation.

/// Names the partitions owned by one version of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVersion {
    prefix: String,
    version: String,
}

impl CacheVersion {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), version: version.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Partition holding precached shell assets.
    pub fn static_name(&self) -> String {
        format!("{}static-{}", self.prefix, self.version)
    }

    /// Partition holding network-first responses.
    pub fn dynamic_name(&self) -> String {
        format!("{}dynamic-{}", self.prefix, self.version)
    }

    /// Umbrella name from earlier releases. Nothing writes to it and it is
    /// not part of the current set, so activation clears it out.
    pub fn legacy_name(&self) -> String {
        format!("{}{}", self.prefix, self.version)
    }

    /// The partitions that survive activation.
    pub fn current(&self) -> [String; 2] {
        [self.static_name(), self.dynamic_name()]
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current().iter().any(|current| current == name)
    }

    /// A partition is stale when it carries our prefix but belongs to no
    /// current name. Partitions of other applications are never stale.
    pub fn is_stale(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && !self.is_current(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_names() {
        let version = CacheVersion::new("holy-grail-", "v2");
        assert_eq!(version.static_name(), "holy-grail-static-v2");
        assert_eq!(version.dynamic_name(), "holy-grail-dynamic-v2");
        assert_eq!(version.legacy_name(), "holy-grail-v2");
    }

    #[test]
    fn test_is_stale() {
        let version = CacheVersion::new("holy-grail-", "v3");
        assert!(!version.is_stale("holy-grail-static-v3"));
        assert!(!version.is_stale("holy-grail-dynamic-v3"));
        assert!(version.is_stale("holy-grail-static-v2"));
        assert!(version.is_stale("holy-grail-dynamic-v2"));
        assert!(version.is_stale("holy-grail-v3"));
        assert!(!version.is_stale("workbox-precache"));
    }
}
