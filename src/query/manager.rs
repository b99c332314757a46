//! Cache manager: bounded eviction over the query cache
//!
//! The manager may be created before the query cache exists. Until one is
//! attached every operation is a no-op that returns an empty result.

use crate::query::cleanup::{CleanupConfig, CleanupLevel, CleanupReport};
use crate::query::store::QueryCache;
use crate::query::types::{
    normalize_reg_number, query_key, CacheStats, QueryInfo, QueryPattern, VEHICLE_SCOPE,
};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sweeps a query cache by age, count and key pattern
#[derive(Clone)]
pub struct CacheManager {
    cache: Option<Arc<dyn QueryCache>>,
}

impl CacheManager {
    pub fn new(cache: Option<Arc<dyn QueryCache>>) -> Self {
        Self { cache }
    }

    pub fn attached(cache: Arc<dyn QueryCache>) -> Self {
        Self { cache: Some(cache) }
    }

    /// Manager with no query cache behind it
    pub fn detached() -> Self {
        Self { cache: None }
    }

    pub fn is_attached(&self) -> bool {
        self.cache.is_some()
    }

    async fn snapshot(&self) -> Option<(&Arc<dyn QueryCache>, Vec<QueryInfo>)> {
        let Some(cache) = self.cache.as_ref() else {
            debug!("No query cache attached, skipping");
            return None;
        };

        match cache.entries().await {
            Ok(entries) => Some((cache, entries)),
            Err(e) => {
                warn!("Failed to enumerate query cache: {}", e);
                None
            }
        }
    }

    /// Remove old entries, then the oldest of the rest until `max_size` remain
    ///
    /// Excluded keys survive both passes. A failed removal is counted in the
    /// report and the sweep carries on.
    pub async fn perform_cache_cleanup(&self, config: &CleanupConfig) -> CleanupReport {
        let mut report = CleanupReport::default();
        let Some((cache, entries)) = self.snapshot().await else {
            return report;
        };

        let now = Utc::now();
        let mut remaining = Vec::with_capacity(entries.len());

        for query in entries {
            if config.is_excluded(&query.key) || query.age(now) <= config.max_age {
                remaining.push(query);
                continue;
            }

            match cache.remove(&query.key).await {
                Ok(()) => report.removed_by_age += 1,
                Err(e) => {
                    warn!("Failed to remove query '{}': {}", query.key, e);
                    report.failures += 1;
                    remaining.push(query);
                }
            }
        }

        if remaining.len() > config.max_size {
            let mut excess = remaining.len() - config.max_size;
            let mut candidates: Vec<&QueryInfo> = remaining
                .iter()
                .filter(|q| !config.is_excluded(&q.key))
                .collect();
            candidates.sort_by_key(|q| q.updated_at);

            for query in candidates {
                if excess == 0 {
                    break;
                }
                match cache.remove(&query.key).await {
                    Ok(()) => {
                        report.removed_by_size += 1;
                        excess -= 1;
                    }
                    Err(e) => {
                        warn!("Failed to remove query '{}': {}", query.key, e);
                        report.failures += 1;
                    }
                }
            }
        }

        report.retained = remaining.len() - report.removed_by_size;
        info!("Query cache cleanup: {}", report);
        report
    }

    /// Sweep with the emergency preset, for memory pressure
    pub async fn emergency_cleanup(&self) -> CleanupReport {
        warn!("Running emergency query cache cleanup");
        self.perform_cache_cleanup(&CleanupLevel::Emergency.config()).await
    }

    /// Sweep with a preset chosen from the current statistics
    pub async fn smart_cleanup(&self) -> (CleanupLevel, CleanupReport) {
        let stats = self.get_cache_stats().await;
        let level = CleanupLevel::for_stats(&stats);
        debug!("Smart cleanup chose {} policy for {}", level, stats);

        let report = self.perform_cache_cleanup(&level.config()).await;
        (level, report)
    }

    /// Remove every entry whose key matches, ignoring exclusions
    pub async fn remove_queries_by_pattern(&self, pattern: &QueryPattern) -> usize {
        let Some((cache, entries)) = self.snapshot().await else {
            return 0;
        };

        let mut removed = 0;
        for query in entries.iter().filter(|q| pattern.matches(&q.key)) {
            match cache.remove(&query.key).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove query '{}': {}", query.key, e),
            }
        }

        info!("Removed {} queries matching {}", removed, pattern);
        removed
    }

    /// Drop cached vehicle lookups, for one registration number or all of them
    pub async fn invalidate_vehicle_data(&self, reg_number: Option<&str>) -> usize {
        let prefix = match reg_number {
            Some(reg) => query_key(VEHICLE_SCOPE, &normalize_reg_number(reg)),
            None => format!("{}:", VEHICLE_SCOPE),
        };

        // Anchored so that e.g. "user:vehicle:..." is left alone
        let pattern = match QueryPattern::regex(&format!("^{}", regex::escape(&prefix))) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("Failed to build vehicle pattern: {}", e);
                return 0;
            }
        };

        self.remove_queries_by_pattern(&pattern).await
    }

    pub async fn get_cache_stats(&self) -> CacheStats {
        match self.snapshot().await {
            Some((_, entries)) => CacheStats::from_queries(&entries, Utc::now()),
            None => CacheStats::default(),
        }
    }
}

/// Background task running [`CacheManager::smart_cleanup`] on an interval
///
/// Each wait is jittered by up to 10% so that several clients started
/// together do not sweep in lockstep.
pub fn start_periodic_cleanup(manager: Arc<CacheManager>, interval: Duration) -> JoinHandle<()> {
    info!("Starting periodic query cache cleanup (interval: {:?})", interval);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(jittered(interval, 0.1)).await;

            let (level, report) = manager.smart_cleanup().await;
            if report.total_removed() > 0 {
                debug!("Periodic {} cleanup: {}", level, report);
            }
        }
    })
}

fn jittered(interval: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 || interval.is_zero() {
        return interval;
    }

    let base = interval.as_secs_f64();
    let offset = rand::thread_rng().gen_range(-jitter..=jitter) * base;
    Duration::from_secs_f64((base + offset).max(0.001))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_detached_manager_is_noop() {
        let manager = CacheManager::detached();
        assert!(!manager.is_attached());

        let report = manager.perform_cache_cleanup(&CleanupConfig::emergency()).await;
        assert_eq!(report, CleanupReport::default());
        assert_eq!(manager.remove_queries_by_pattern(&"vehicle".into()).await, 0);
        assert_eq!(manager.get_cache_stats().await, CacheStats::default());
        assert_eq!(manager.smart_cleanup().await.0, CleanupLevel::Light);
        assert_eq!(manager.invalidate_vehicle_data(None).await, 0);
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_secs(100);
        for _ in 0..100 {
            let d = jittered(base, 0.1);
            assert!(d >= Duration::from_secs(90) && d <= Duration::from_secs(110));
        }
        assert_eq!(jittered(base, 0.0), base);
        assert_eq!(jittered(Duration::ZERO, 0.1), Duration::ZERO);
    }
}
