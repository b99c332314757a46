//! # Section state cache
//!
//! Remembers whether each collapsible section of the app (an FAQ category, a
//! profile panel, ...) was left open, across restarts.
//!
//! ## Features
//!
//! - **TTL expiry**: entries older than the section's cache timeout are dropped
//! - **Versioning**: bumping the data version invalidates every older entry
//! - **Search mode**: while searching, sections follow their content instead of
//!   the cached preference
//! - **Fail-open**: unreadable or corrupt storage means defaults, never an error
//!
//! ## Example
//!
//! ```rust
//! use bilregistret_cache::section::{SectionOptions, SectionStateManager};
//! use bilregistret_cache::storage::MemoryStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let store = Arc::new(MemoryStore::new());
//! let options = SectionOptions::builder("faq-section")
//!     .data_version("1.0")
//!     .cache_timeout(Duration::from_secs(3600))
//!     .build();
//!
//! let section = SectionStateManager::mount(store, options).await;
//! section.wait_loaded().await;
//!
//! if section.toggle_state().await {
//!     println!("FAQ expanded");
//! }
//! # }
//! ```

pub mod entry;
pub mod manager;
pub mod options;
pub mod state;

pub use entry::{EntryRejection, SectionEntry, DEFAULT_DATA_VERSION};
pub use manager::SectionStateManager;
pub use options::{SectionOptions, SectionOptionsBuilder, DEFAULT_CACHE_TIMEOUT};
pub use state::SectionState;
