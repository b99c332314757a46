//! Core type definitions for the query cache

use crate::error::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Key scope used for vehicle lookups
pub const VEHICLE_SCOPE: &str = "vehicle";

/// Build a query key of the form `scope:id`
pub fn query_key(scope: &str, id: &str) -> String {
    format!("{}:{}", scope, id)
}

/// Normalize a registration number the way vehicle keys store it
///
/// `"abc 123"` and `"ABC123"` refer to the same vehicle.
pub fn normalize_reg_number(reg_number: &str) -> String {
    reg_number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Metadata for one entry of the query cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Query key
    pub key: String,

    /// When the data was last written
    pub updated_at: DateTime<Utc>,

    /// How long the data counts as fresh
    pub stale_time: Duration,

    /// Number of active subscribers
    pub observers: usize,

    /// Approximate size of the cached data
    pub size_bytes: usize,
}

impl QueryInfo {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.updated_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now) >= self.stale_time
    }

    pub fn is_active(&self) -> bool {
        self.observers > 0
    }
}

/// Read-only snapshot of the query cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_queries: usize,
    pub stale_queries: usize,
    pub active_queries: usize,
    pub inactive_queries: usize,
    pub total_size_bytes: usize,

    /// Age of the oldest entry, if any
    pub oldest_age: Option<Duration>,
}

impl CacheStats {
    pub fn from_queries(queries: &[QueryInfo], now: DateTime<Utc>) -> Self {
        let active_queries = queries.iter().filter(|q| q.is_active()).count();

        Self {
            total_queries: queries.len(),
            stale_queries: queries.iter().filter(|q| q.is_stale(now)).count(),
            active_queries,
            inactive_queries: queries.len() - active_queries,
            total_size_bytes: queries.iter().map(|q| q.size_bytes).sum(),
            oldest_age: queries.iter().map(|q| q.age(now)).max(),
        }
    }

    /// Share of entries that are stale, as a percentage
    pub fn stale_ratio(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            (self.stale_queries as f64 / self.total_queries as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ total: {}, stale: {}, active: {}, inactive: {}, size: {} bytes }}",
            self.total_queries,
            self.stale_queries,
            self.active_queries,
            self.inactive_queries,
            self.total_size_bytes
        )
    }
}

/// Selects query keys for removal
#[derive(Debug, Clone)]
pub enum QueryPattern {
    /// Key contains the string
    Substring(String),

    /// Key matches the regular expression
    Regex(Regex),
}

impl QueryPattern {
    pub fn substring(s: impl Into<String>) -> Self {
        QueryPattern::Substring(s.into())
    }

    /// Compile a regex pattern
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(QueryPattern::Regex(Regex::new(pattern)?))
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            QueryPattern::Substring(s) => key.contains(s.as_str()),
            QueryPattern::Regex(re) => re.is_match(key),
        }
    }
}

impl From<&str> for QueryPattern {
    fn from(s: &str) -> Self {
        QueryPattern::Substring(s.to_string())
    }
}

impl From<Regex> for QueryPattern {
    fn from(re: Regex) -> Self {
        QueryPattern::Regex(re)
    }
}

impl fmt::Display for QueryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPattern::Substring(s) => write!(f, "contains:{}", s),
            QueryPattern::Regex(re) => write!(f, "regex:{}", re.as_str()),
        }
    }
}
