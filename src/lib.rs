//! # Bilregistret cache (bilregistret-cache)
//!
//! Client-side caching for the Bilregistret.ai vehicle lookup app.
//!
//! ## Features
//!
//! - Persisted open/closed state for collapsible sections, with TTL expiry
//!   and data-version invalidation
//! - Search-mode overrides driven by section content
//! - Fail-open storage handling: corrupt or unavailable storage means defaults
//! - Query cache sweeps by age, size and key pattern with an exclusion list
//! - Async-first design using tokio
//!
//! ## Section state
//!
//! ```no_run
//! use bilregistret_cache::{FileStore, SectionOptions, SectionStateManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(FileStore::open("./data/section-state.json").await?);
//!     let options = SectionOptions::builder("faq-section")
//!         .data_version("1.0")
//!         .build();
//!
//!     let section = SectionStateManager::mount(store, options).await;
//!     section.wait_loaded().await;
//!     println!("FAQ open: {}", section.state().await.is_open);
//!     Ok(())
//! }
//! ```
//!
//! ## Query cache cleanup
//!
//! ```no_run
//! use bilregistret_cache::{CacheManager, CleanupConfig, InMemoryQueryCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let queries = Arc::new(InMemoryQueryCache::new(Duration::from_secs(300)));
//!     let manager = CacheManager::attached(queries);
//!
//!     let config = CleanupConfig::new(Duration::from_secs(1800), 100)
//!         .with_exclusions(["auth", "session"]);
//!     let report = manager.perform_cache_cleanup(&config).await;
//!     println!("{}", report);
//! }
//! ```

pub mod config;
pub mod error;
pub mod query;
pub mod section;
pub mod storage;

// Re-export main types for convenience
pub use config::Settings;
pub use error::{CacheError, Result};
pub use query::{
    start_periodic_cleanup, CacheManager, CacheStats, CleanupConfig, CleanupLevel, CleanupReport,
    InMemoryQueryCache, QueryCache, QueryInfo, QueryPattern,
};
pub use section::{
    EntryRejection, SectionEntry, SectionOptions, SectionOptionsBuilder, SectionState,
    SectionStateManager,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
