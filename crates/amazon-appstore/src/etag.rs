//! ETag cache for optimistic concurrency
//!
//! Every successful response carrying an `ETag` header is recorded under a
//! resource key; writes and deletes attach the recorded value as `If-Match`.
//! The store lives as long as the owning client and is never persisted, so a
//! fresh client must re-fetch a resource before writing to it.

use std::collections::HashMap;
use tracing::debug;

/// In-memory mapping from resource key to last-seen ETag
#[derive(Debug, Default, Clone)]
pub struct EtagStore {
    entries: HashMap<String, String>,
}

impl EtagStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-seen ETag for a resource
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Record an ETag, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, etag: impl Into<String>) {
        let key = key.into();
        let etag = etag.into();
        debug!(key = %key, etag = %etag, "storing etag");
        self.entries.insert(key, etag);
    }

    /// Forget a resource's ETag after it was deleted remotely
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.entries.remove(key);
        debug!(key, removed = removed.is_some(), "removing etag");
        removed
    }

    /// Whether an ETag is recorded for the key
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Resource key composition.
///
/// Identifiers are joined with `-`; their shape is never checked.
pub mod key {
    pub fn edit(edit_id: &str) -> String {
        edit_id.to_string()
    }

    pub fn listings(edit_id: &str) -> String {
        format!("{}-listings", edit_id)
    }

    pub fn listing(edit_id: &str, language: &str) -> String {
        format!("{}-{}", edit_id, language)
    }

    pub fn details(edit_id: &str) -> String {
        format!("{}-details", edit_id)
    }

    pub fn availability(edit_id: &str) -> String {
        format!("{}-availability", edit_id)
    }

    pub fn apks(edit_id: &str) -> String {
        format!("{}-apks", edit_id)
    }

    pub fn apk(apk_id: &str) -> String {
        apk_id.to_string()
    }

    pub fn targeting(apk_id: &str) -> String {
        format!("{}-targeting", apk_id)
    }

    pub fn images(edit_id: &str, language: &str, image_type: &str) -> String {
        format!("{}-{}-{}", edit_id, language, image_type)
    }

    pub fn videos(edit_id: &str, language: &str) -> String {
        format!("{}-{}-videos", edit_id, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut store = EtagStore::new();
        store.set("E1", "\"v1\"");
        store.set("E1", "\"v2\"");

        assert_eq!(store.get("E1"), Some("\"v2\""));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = EtagStore::new();
        store.set(key::apk("APK1"), "abc");

        assert_eq!(store.remove("APK1").as_deref(), Some("abc"));
        assert!(store.get("APK1").is_none());
        assert!(store.remove("APK1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_are_distinct_per_resource() {
        let keys = [
            key::edit("E"),
            key::listings("E"),
            key::listing("E", "en-US"),
            key::details("E"),
            key::availability("E"),
            key::apks("E"),
            key::targeting("E"),
            key::images("E", "en-US", "screenshots"),
            key::videos("E", "en-US"),
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(key::listing("E1", "de-DE"), "E1-de-DE");
    }
}
