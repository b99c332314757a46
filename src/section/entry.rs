//! Persisted section entry and its validity rules

use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Version written when the section has no explicit data version
pub const DEFAULT_DATA_VERSION: &str = "1.0";

/// What a section remembered about itself the last time it was written
///
/// Wire format: `{"state": bool, "version": string, "timestamp": number, "hasContent": bool}`.
/// No other fields are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SectionEntry {
    /// Last open/closed value
    pub state: bool,

    /// Data-schema version the entry was written under
    pub version: String,

    /// Epoch milliseconds at write time
    ///
    /// Fractional values, as written by `Date.now()`-style clients that emit
    /// floats, are truncated.
    #[serde(deserialize_with = "deserialize_millis")]
    pub timestamp: i64,

    /// Whether the section had content when written
    #[serde(default)]
    pub has_content: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Millis {
    Integer(i64),
    Float(f64),
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Millis::deserialize(deserializer)? {
        Millis::Integer(ms) => Ok(ms),
        Millis::Float(ms) if ms.is_finite() && ms.abs() < i64::MAX as f64 => Ok(ms.trunc() as i64),
        Millis::Float(ms) => Err(serde::de::Error::custom(format!("timestamp out of range: {}", ms))),
    }
}

impl SectionEntry {
    /// Create an entry stamped with the current time
    pub fn new(state: bool, version: impl Into<String>, has_content: bool) -> Self {
        Self {
            state,
            version: version.into(),
            timestamp: now_millis(),
            has_content: Some(has_content),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Age of the entry relative to `now_ms`; entries from the future are age zero
    pub fn age(&self, now_ms: i64) -> Duration {
        let elapsed = now_ms.saturating_sub(self.timestamp).max(0);
        Duration::from_millis(elapsed as u64)
    }

    /// Check the entry against the expected version and TTL
    ///
    /// `None` for either check disables it.
    pub fn validate(
        &self,
        expected_version: Option<&str>,
        ttl: Option<Duration>,
        now_ms: i64,
    ) -> std::result::Result<(), EntryRejection> {
        if let Some(expected) = expected_version {
            if self.version != expected {
                return Err(EntryRejection::VersionMismatch {
                    stored: self.version.clone(),
                    expected: expected.to_string(),
                });
            }
        }

        if let Some(ttl) = ttl {
            let age = self.age(now_ms);
            if age >= ttl {
                return Err(EntryRejection::Expired { age, ttl });
            }
        }

        Ok(())
    }

    pub fn is_valid(&self, expected_version: Option<&str>, ttl: Option<Duration>, now_ms: i64) -> bool {
        self.validate(expected_version, ttl, now_ms).is_ok()
    }
}

/// Why a stored entry was thrown away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRejection {
    /// Written under another data version
    VersionMismatch { stored: String, expected: String },

    /// Older than the section's cache timeout
    Expired { age: Duration, ttl: Duration },

    /// Not a well-formed entry
    Malformed(String),
}

impl fmt::Display for EntryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRejection::VersionMismatch { stored, expected } => {
                write!(f, "version mismatch: stored {}, expected {}", stored, expected)
            }
            EntryRejection::Expired { age, ttl } => {
                write!(f, "expired: age {}ms >= ttl {}ms", age.as_millis(), ttl.as_millis())
            }
            EntryRejection::Malformed(reason) => write!(f, "malformed entry: {}", reason),
        }
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_field_names() {
        let entry = SectionEntry {
            state: true,
            version: "2.0".to_string(),
            timestamp: 1_700_000_000_000,
            has_content: Some(false),
        };

        let json: serde_json::Value = serde_json::from_str(&entry.encode().unwrap()).unwrap();
        assert_eq!(json["state"], true);
        assert_eq!(json["version"], "2.0");
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(json["hasContent"], false);
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_decode_without_has_content() {
        let entry = SectionEntry::decode(r#"{"state":true,"version":"1.0","timestamp":5}"#).unwrap();
        assert!(entry.state);
        assert_eq!(entry.has_content, None);
    }

    #[test]
    fn test_decode_float_timestamp() {
        let entry = SectionEntry::decode(r#"{"state":true,"version":"1.0","timestamp":1.7e12}"#).unwrap();
        assert_eq!(entry.timestamp, 1_700_000_000_000);

        let entry =
            SectionEntry::decode(r#"{"state":false,"version":"1.0","timestamp":1700000000123.9}"#).unwrap();
        assert_eq!(entry.timestamp, 1_700_000_000_123);

        assert!(SectionEntry::decode(r#"{"state":true,"version":"1.0","timestamp":"1700000000000"}"#).is_err());
        assert!(SectionEntry::decode(r#"{"state":true,"version":"1.0","timestamp":1e300}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_and_malformed() {
        assert!(SectionEntry::decode(r#"{"state":true,"version":"1.0","timestamp":5,"extra":1}"#).is_err());
        assert!(SectionEntry::decode(r#"{"state":"yes","version":"1.0","timestamp":5}"#).is_err());
        assert!(SectionEntry::decode(r#"{"version":"1.0","timestamp":5}"#).is_err());
        assert!(SectionEntry::decode("not json").is_err());
    }

    #[test]
    fn test_version_mismatch_ignores_freshness() {
        let entry = SectionEntry::new(true, "1.0", true);
        let now = entry.timestamp;

        let rejection = entry.validate(Some("2.0"), Some(Duration::from_secs(3600)), now);
        assert!(matches!(rejection, Err(EntryRejection::VersionMismatch { .. })));

        assert!(entry.is_valid(None, Some(Duration::from_secs(3600)), now));
        assert!(entry.is_valid(Some("1.0"), None, now));
    }

    #[test]
    fn test_ttl_boundary() {
        let entry = SectionEntry {
            state: true,
            version: DEFAULT_DATA_VERSION.to_string(),
            timestamp: 10_000,
            has_content: None,
        };
        let ttl = Some(Duration::from_millis(1000));

        assert!(entry.is_valid(None, ttl, 10_999));
        assert!(!entry.is_valid(None, ttl, 11_000));
        assert!(matches!(
            entry.validate(None, ttl, 11_001),
            Err(EntryRejection::Expired { .. })
        ));
        assert!(entry.is_valid(None, None, i64::MAX));
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let entry = SectionEntry {
            state: false,
            version: DEFAULT_DATA_VERSION.to_string(),
            timestamp: 50_000,
            has_content: None,
        };
        assert_eq!(entry.age(10_000), Duration::ZERO);
    }

    #[test]
    fn test_rejection_display() {
        let rejection = EntryRejection::VersionMismatch {
            stored: "1.0".to_string(),
            expected: "2.0".to_string(),
        };
        assert!(rejection.to_string().contains("expected 2.0"));
    }
}
