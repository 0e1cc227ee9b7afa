//! Cache Entry Module
//!
//! Defines a single cache entry and its durable text encoding.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A stored value together with the metadata needed to age it.
///
/// The same struct is kept in the memory tier and written as JSON text into
/// the durable tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Maximum age in milliseconds
    pub ttl_ms: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped at `now_ms`.
    ///
    /// TTLs beyond `u64::MAX` milliseconds saturate instead of wrapping.
    pub fn new(value: Value, ttl: Duration, now_ms: i64) -> Self {
        Self {
            value,
            created_at: now_ms,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: the entry is expired as soon as its age reaches
    /// the TTL, so a zero TTL is expired immediately.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) >= self.ttl_ms
    }

    /// Age in milliseconds; a creation time in the future counts as age zero.
    pub fn age_ms(&self, now_ms: i64) -> u64 {
        now_ms.saturating_sub(self.created_at).max(0) as u64
    }

    // == Time To Live ==
    /// Returns the remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> u64 {
        self.ttl_ms.saturating_sub(self.age_ms(now_ms))
    }

    // == Durable Encoding ==
    /// Encodes the entry as the text stored in the durable tier.
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes durable text; any malformed input is an error.
    pub fn from_text(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(json!({"name": "Acme"}), Duration::from_secs(60), NOW);

        assert_eq!(entry.value, json!({"name": "Acme"}));
        assert_eq!(entry.created_at, NOW);
        assert_eq!(entry.ttl_ms, 60_000);
        assert!(!entry.is_expired_at(NOW));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(json!(1), Duration::from_secs(1), NOW);

        assert!(!entry.is_expired_at(NOW + 999));
        assert!(entry.is_expired_at(NOW + 1_000));
        assert!(entry.is_expired_at(NOW + 5_000));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(json!("x"), Duration::ZERO, NOW);
        assert!(entry.is_expired_at(NOW), "Zero TTL should be expired at once");
    }

    #[test]
    fn test_clock_skew_counts_as_fresh() {
        let entry = CacheEntry::new(json!("x"), Duration::from_secs(1), NOW);
        assert_eq!(entry.age_ms(NOW - 10_000), 0);
        assert!(!entry.is_expired_at(NOW - 10_000));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new(json!(null), Duration::from_secs(10), NOW);

        assert_eq!(entry.ttl_remaining_ms(NOW), 10_000);
        assert_eq!(entry.ttl_remaining_ms(NOW + 2_500), 7_500);
        assert_eq!(entry.ttl_remaining_ms(NOW + 60_000), 0);
    }

    #[test]
    fn test_text_encoding() {
        let entry = CacheEntry::new(json!([1, "two", {"three": 3}]), Duration::from_secs(5), NOW);

        let text = entry.to_text().unwrap();
        assert!(text.contains("\"created_at\""));
        assert_eq!(CacheEntry::from_text(&text).unwrap(), entry);
    }

    #[test]
    fn test_from_text_rejects_garbage() {
        assert!(CacheEntry::from_text("{not json").is_err());
        assert!(CacheEntry::from_text(r#"{"value": 1}"#).is_err());
        assert!(CacheEntry::from_text("\"just a string\"").is_err());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let ttl = Duration::from_secs(u64::MAX / 1000 + 1);
        let entry = CacheEntry::new(json!(1), ttl, NOW);

        assert_eq!(entry.ttl_ms, u64::MAX);
        assert!(!entry.is_expired_at(NOW + 1_000));
        assert!(!entry.is_expired_at(i64::MAX));

        let max = CacheEntry::new(json!(1), Duration::MAX, NOW);
        assert_eq!(max.ttl_ms, u64::MAX);
    }
}
