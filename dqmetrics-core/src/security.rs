//! Secret handling for the remote store.
//!
//! The store API key is the only secret the pipeline touches. It is held in
//! an [`ApiKey`] that zeroes its memory on drop, never prints its value, and
//! is never serialized.

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Remote store API key with automatic memory zeroing.
///
/// # Example
///
/// ```rust
/// use dqmetrics_core::security::ApiKey;
///
/// let key = ApiKey::new("service-role-key");
/// assert_eq!(key.expose(), "service-role-key");
/// assert_eq!(format!("{:?}", key), "ApiKey(****)");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the key for building request headers. Never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret-value");
        let debug = format!("{:?}", key);

        assert!(!debug.contains("super-secret-value"));
        assert_eq!(debug, "ApiKey(****)");
    }

    #[test]
    fn test_api_key_blank() {
        assert!(ApiKey::new("").is_blank());
        assert!(ApiKey::new("   ").is_blank());
        assert!(!ApiKey::new("k").is_blank());
    }

    #[test]
    fn test_api_key_zeroize() {
        let mut key = ApiKey::new("secret");
        key.zeroize();
        assert!(key.expose().is_empty());
    }

    #[test]
    fn test_api_key_deserializes_from_string() {
        let key: ApiKey = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(key.expose(), "abc");
    }
}
