//! # Query cache management
//!
//! Keeps the client's query cache bounded. Entries are evicted when they are
//! old, when there are too many of them, or when a key pattern is invalidated.
//! Keys on the exclusion list (auth and session data by default) are never
//! swept by age or size.
//!
//! ## Example
//!
//! ```rust
//! use bilregistret_cache::query::{CacheManager, CleanupConfig, InMemoryQueryCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let queries = Arc::new(InMemoryQueryCache::new(Duration::from_secs(300)));
//! queries.insert("vehicle:ABC123", serde_json::json!({"make": "Volvo"})).await;
//!
//! let manager = CacheManager::attached(queries);
//! let report = manager
//!     .perform_cache_cleanup(&CleanupConfig::new(Duration::from_secs(3600), 100))
//!     .await;
//! println!("{}", report);
//! # }
//! ```

pub mod cleanup;
pub mod manager;
pub mod store;
pub mod types;

pub use cleanup::{CleanupConfig, CleanupLevel, CleanupReport, DEFAULT_EXCLUDED_KEYS};
pub use manager::{start_periodic_cleanup, CacheManager};
pub use store::{InMemoryQueryCache, QueryCache};
pub use types::{normalize_reg_number, query_key, CacheStats, QueryInfo, QueryPattern, VEHICLE_SCOPE};
