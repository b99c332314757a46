//! Cleanup policies for the query cache

use crate::query::types::CacheStats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Keys containing any of these are never swept
pub const DEFAULT_EXCLUDED_KEYS: &[&str] = &["auth", "session", "user"];

/// More queries than this selects the aggressive policy
pub const AGGRESSIVE_QUERY_THRESHOLD: usize = 100;

/// More stale queries than this selects the medium policy
pub const MEDIUM_STALE_THRESHOLD: usize = 20;

/// Parameters for one cleanup sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Entries older than this are removed first
    pub max_age: Duration,

    /// Entry count to keep after the age pass
    pub max_size: usize,

    /// Keys, or key substrings, that are never removed
    pub exclude_keys: Vec<String>,
}

impl CleanupConfig {
    pub fn new(max_age: Duration, max_size: usize) -> Self {
        Self {
            max_age,
            max_size,
            exclude_keys: DEFAULT_EXCLUDED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Replace the exclusion list
    pub fn with_exclusions<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        self.exclude_keys.iter().any(|k| key.contains(k.as_str()))
    }

    /// Light sweep for a healthy cache: 1 hour, 200 entries
    pub fn light() -> Self {
        Self::new(Duration::from_secs(60 * 60), 200)
    }

    /// Medium sweep when many entries are stale: 30 minutes, 100 entries
    pub fn medium() -> Self {
        Self::new(Duration::from_secs(30 * 60), 100)
    }

    /// Aggressive sweep for a crowded cache: 10 minutes, 50 entries
    pub fn aggressive() -> Self {
        Self::new(Duration::from_secs(10 * 60), 50)
    }

    /// Memory-pressure sweep: 5 minutes, 10 entries
    pub fn emergency() -> Self {
        Self::new(Duration::from_secs(5 * 60), 10)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self::light()
    }
}

/// Which preset a sweep ran with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CleanupLevel {
    Light,
    Medium,
    Aggressive,
    Emergency,
}

impl CleanupLevel {
    /// Pick a level from the current cache statistics
    pub fn for_stats(stats: &CacheStats) -> Self {
        if stats.total_queries > AGGRESSIVE_QUERY_THRESHOLD {
            CleanupLevel::Aggressive
        } else if stats.stale_queries > MEDIUM_STALE_THRESHOLD {
            CleanupLevel::Medium
        } else {
            CleanupLevel::Light
        }
    }

    pub fn config(&self) -> CleanupConfig {
        match self {
            CleanupLevel::Light => CleanupConfig::light(),
            CleanupLevel::Medium => CleanupConfig::medium(),
            CleanupLevel::Aggressive => CleanupConfig::aggressive(),
            CleanupLevel::Emergency => CleanupConfig::emergency(),
        }
    }
}

impl fmt::Display for CleanupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupLevel::Light => write!(f, "light"),
            CleanupLevel::Medium => write!(f, "medium"),
            CleanupLevel::Aggressive => write!(f, "aggressive"),
            CleanupLevel::Emergency => write!(f, "emergency"),
        }
    }
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Removed for exceeding `max_age`
    pub removed_by_age: usize,

    /// Removed to get down to `max_size`
    pub removed_by_size: usize,

    /// Removals that failed and were skipped
    pub failures: usize,

    /// Entries left afterwards
    pub retained: usize,
}

impl CleanupReport {
    pub fn total_removed(&self) -> usize {
        self.removed_by_age + self.removed_by_size
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} (age: {}, size: {}), failed {}, retained {}",
            self.total_removed(),
            self.removed_by_age,
            self.removed_by_size,
            self.failures,
            self.retained
        )
    }
}
