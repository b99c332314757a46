//! Section state manager
//!
//! Owns the runtime flags of one mounted section, restores them from the
//! key-value store and writes them back when the user toggles or resets.
//!
//! Storage failures never reach the caller. Reads degrade to the defaults,
//! writes are logged and dropped, and the in-memory state is updated either
//! way.
//!
//! Loads run as background tasks. Two counters keep a slow load from
//! clobbering newer information:
//! - a load sequence number: a load that has been superseded by a newer load
//!   or by a search-mode pass is discarded;
//! - a mutation generation, bumped by `toggle_state` and `reset_state`: a load
//!   that started before the user acted is discarded, so the user's choice
//!   wins over the slower read.
//!
//! Writes to the section's key go through one lock. A load deletes a rejected
//! entry only while holding it and only if no user action came first, so a
//! delete in flight can never remove what a toggle writes after it.

use crate::error::CacheError;
use crate::section::entry::{now_millis, EntryRejection, SectionEntry, DEFAULT_DATA_VERSION};
use crate::section::options::SectionOptions;
use crate::section::state::SectionState;
use crate::storage::KeyValueStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Result of reading one section key from storage
#[derive(Debug)]
enum LoadOutcome {
    Restored(SectionEntry),
    Rejected(EntryRejection),
    Missing,
    Unavailable(CacheError),
}

/// State manager for one collapsible section
pub struct SectionStateManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    store: Arc<dyn KeyValueStore>,
    options: RwLock<SectionOptions>,
    state: RwLock<SectionState>,
    mounted: AtomicBool,
    load_seq: AtomicU64,
    generation: AtomicU64,
    persist: Mutex<()>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl SectionStateManager {
    /// Mount a section
    ///
    /// Applies the search-mode rule right away and, outside search mode,
    /// starts loading the cached entry in the background. Must be called from
    /// within a tokio runtime.
    pub async fn mount(store: Arc<dyn KeyValueStore>, options: SectionOptions) -> Self {
        let state = SectionState::initial(
            options.default_state,
            options.has_content,
            options.is_searching,
        );

        let inner = Arc::new(ManagerInner {
            store,
            options: RwLock::new(options),
            state: RwLock::new(state),
            mounted: AtomicBool::new(true),
            load_seq: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            persist: Mutex::new(()),
            pending: Mutex::new(Vec::new()),
        });

        ManagerInner::apply_visibility_rule(&inner).await;

        Self { inner }
    }

    /// Current runtime flags
    pub async fn state(&self) -> SectionState {
        *self.inner.state.read().await
    }

    pub async fn options(&self) -> SectionOptions {
        self.inner.options.read().await.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Wait for every load started so far to finish
    pub async fn wait_loaded(&self) {
        let handles: Vec<JoinHandle<()>> = self.inner.pending.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Section load task failed: {}", e);
            }
        }
    }

    /// Read the cached entry again and wait for the result
    ///
    /// Does nothing while searching.
    pub async fn reload(&self) {
        if self.inner.options.read().await.is_searching {
            return;
        }
        ManagerInner::start_load(&self.inner).await;
        self.wait_loaded().await;
    }

    /// Replace the section's options
    ///
    /// A change to search mode or content re-runs the visibility rule; a change
    /// to any cache-related field reloads from storage unless searching.
    pub async fn set_options(&self, new_options: SectionOptions) {
        let old = {
            let mut options = self.inner.options.write().await;
            std::mem::replace(&mut *options, new_options.clone())
        };

        if old.needs_visibility_pass(&new_options) {
            ManagerInner::apply_visibility_rule(&self.inner).await;
        } else if old.needs_reload(&new_options) && !new_options.is_searching {
            ManagerInner::start_load(&self.inner).await;
        }
    }

    pub async fn set_searching(&self, is_searching: bool) {
        let options = SectionOptions {
            is_searching,
            ..self.options().await
        };
        self.set_options(options).await;
    }

    pub async fn set_has_content(&self, has_content: bool) {
        let options = SectionOptions {
            has_content,
            ..self.options().await
        };
        self.set_options(options).await;
    }

    /// Flip the open state and persist it, returning the new value
    pub async fn toggle_state(&self) -> bool {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let is_open = self.inner.state.write().await.toggle();

        let _persist = self.inner.persist.lock().await;
        // Write whatever is current once the lock is ours; a later toggle may
        // already have flipped it back
        let (current, has_content) = {
            let state = self.inner.state.read().await;
            (state.is_open, state.has_content)
        };
        let options = self.options().await;
        let version = options.data_version.as_deref().unwrap_or(DEFAULT_DATA_VERSION);
        let entry = SectionEntry::new(current, version, has_content);

        let written = match entry.encode() {
            Ok(raw) => self.inner.store.set(&options.section_key, &raw).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!("Failed to persist section '{}': {}", options.section_key, e);
        }

        is_open
    }

    /// Back to the default state, forgetting anything cached
    pub async fn reset_state(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let options = self.options().await;
        self.inner.state.write().await.reset(options.default_state);

        let _persist = self.inner.persist.lock().await;
        if let Err(e) = self.inner.store.remove(&options.section_key).await {
            warn!("Failed to clear section '{}': {}", options.section_key, e);
        }
    }

    /// The section's content appeared or disappeared
    pub async fn update_content_state(&self, has_content: bool) {
        let default_state = self.inner.options.read().await.default_state;
        let mut state = self.inner.state.write().await;

        if let Err(e) = state.apply_content(has_content) {
            warn!("Content update failed, falling back to safe state: {}", e);
            state.fail_safe(default_state);
        }
    }

    /// Detach the manager from its section
    ///
    /// Loads already in flight finish against storage but their results are
    /// dropped.
    pub fn unmount(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
    }
}

impl Drop for SectionStateManager {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl ManagerInner {
    async fn apply_visibility_rule(inner: &Arc<Self>) {
        let options = inner.options.read().await.clone();

        // Any load in flight was started under the previous mode
        inner.load_seq.fetch_add(1, Ordering::SeqCst);
        inner
            .state
            .write()
            .await
            .apply_search_mode(options.is_searching, options.has_content);

        if !options.is_searching {
            Self::start_load(inner).await;
        }
    }

    async fn start_load(inner: &Arc<Self>) {
        let seq = inner.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = inner.generation.load(Ordering::SeqCst);
        inner.state.write().await.is_loading = true;

        let task = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            task.load_saved_state(seq, generation).await;
        });
        let mut pending = inner.pending.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    async fn load_saved_state(&self, seq: u64, generation: u64) {
        let options = self.options.read().await.clone();
        let key = options.section_key.as_str();
        let outcome = read_entry(self.store.as_ref(), &options).await;

        if let LoadOutcome::Rejected(reason) = &outcome {
            let _persist = self.persist.lock().await;
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Keeping rejected entry for '{}': newer local write", key);
            } else {
                debug!("Discarding cached entry for '{}': {}", key, reason);
                if let Err(e) = self.store.remove(key).await {
                    warn!("Failed to delete invalid entry for '{}': {}", key, e);
                }
            }
        }

        if !self.mounted.load(Ordering::SeqCst) {
            debug!("Section '{}' unmounted, dropping load result", key);
            return;
        }
        if self.load_seq.load(Ordering::SeqCst) != seq {
            debug!("Load for '{}' superseded", key);
            return;
        }

        let mut state = self.state.write().await;
        // Checked under the state lock so a toggle cannot slip in between
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Load for '{}' overtaken by a local change", key);
            state.is_loading = false;
            return;
        }

        match outcome {
            LoadOutcome::Restored(entry) => {
                debug!("Restored section '{}' (open: {})", key, entry.state);
                state.restore(&entry);
            }
            LoadOutcome::Missing | LoadOutcome::Rejected(_) => {
                state.restore_defaults(options.default_state, options.has_content);
            }
            LoadOutcome::Unavailable(e) => {
                warn!("Failed to read section '{}', using defaults: {}", key, e);
                state.restore_defaults(options.default_state, options.has_content);
            }
        }
    }
}

async fn read_entry(store: &dyn KeyValueStore, options: &SectionOptions) -> LoadOutcome {
    let raw = match store.get(&options.section_key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return LoadOutcome::Missing,
        Err(e) => return LoadOutcome::Unavailable(e),
    };

    let entry = match SectionEntry::decode(&raw) {
        Ok(entry) => entry,
        Err(e) => return LoadOutcome::Rejected(EntryRejection::Malformed(e.to_string())),
    };

    match entry.validate(options.data_version.as_deref(), options.cache_timeout, now_millis()) {
        Ok(()) => LoadOutcome::Restored(entry),
        Err(reason) => LoadOutcome::Rejected(reason),
    }
}
