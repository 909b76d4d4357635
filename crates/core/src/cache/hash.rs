//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// The key covers the method and the absolute URL. Callers strip the
/// fragment before hashing so `/page#a` and `/page` share an entry.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = compute_request_key("GET", "https://app.test/app.js");
        let key2 = compute_request_key("GET", "https://app.test/app.js");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        assert_eq!(compute_request_key("get", "https://app.test/"), compute_request_key("GET", "https://app.test/"));
    }

    #[test]
    fn test_key_different_url() {
        assert_ne!(compute_request_key("GET", "https://app.test/a.js"), compute_request_key("GET", "https://app.test/b.js"));
    }

    #[test]
    fn test_key_different_method() {
        assert_ne!(compute_request_key("GET", "https://app.test/"), compute_request_key("HEAD", "https://app.test/"));
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", "https://app.test/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
