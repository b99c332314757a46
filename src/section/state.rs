//! Runtime state of a mounted section and the transitions that change it
//!
//! Everything here is synchronous and storage-free; the manager decides when
//! to call these and what to persist afterwards.

use crate::error::{CacheError, Result};
use crate::section::entry::SectionEntry;
use serde::Serialize;

/// Snapshot of one section's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionState {
    /// Whether the section is expanded
    pub is_open: bool,

    /// True while the initial read from storage is in flight
    pub is_loading: bool,

    /// Whether the section is shown at all
    pub is_visible: bool,

    /// Content flag remembered alongside the open state
    pub has_content: bool,

    /// Mirrors the screen's search mode
    pub is_searching: bool,
}

impl SectionState {
    /// State of a freshly mounted section, before any load or search pass
    pub fn initial(default_state: bool, has_content: bool, is_searching: bool) -> Self {
        Self {
            is_open: default_state,
            is_loading: !is_searching,
            is_visible: true,
            has_content,
            is_searching,
        }
    }

    /// Search-mode visibility rule
    ///
    /// While searching the section follows its content: shown and open with
    /// content, hidden and collapsed without. Leaving search mode only makes
    /// the section visible again; the cached preference comes back via a load.
    pub fn apply_search_mode(&mut self, is_searching: bool, has_content: bool) {
        self.is_searching = is_searching;
        if is_searching {
            self.is_visible = has_content;
            self.is_open = has_content;
            self.is_loading = false;
        } else {
            self.is_visible = true;
        }
    }

    /// Apply a valid stored entry
    pub fn restore(&mut self, entry: &SectionEntry) {
        if !self.is_searching {
            self.is_open = entry.state;
        }
        self.has_content = entry.has_content.unwrap_or(false);
        self.is_loading = false;
    }

    /// Fall back to defaults after a miss, a rejected entry or a failed read
    pub fn restore_defaults(&mut self, default_state: bool, has_content: bool) {
        if !self.is_searching {
            self.is_open = default_state;
        }
        self.has_content = has_content;
        self.is_loading = false;
    }

    /// Flip the open state, returning the new value
    pub fn toggle(&mut self) -> bool {
        self.is_open = !self.is_open;
        self.is_open
    }

    pub fn reset(&mut self, default_state: bool) {
        self.is_open = default_state;
        self.is_visible = true;
        self.has_content = false;
    }

    /// Content changed under the section
    ///
    /// Losing content never collapses the section, it only hides it during a
    /// search, so a user looking at it does not see it jump shut. Gaining
    /// content opens it only during a search.
    ///
    /// The manager's transitions never hide a section outside search mode, so
    /// the error is a guard against snapshots edited by hand. Callers recover
    /// with [`SectionState::fail_safe`].
    pub fn apply_content(&mut self, has_content: bool) -> Result<()> {
        if !self.is_searching && !self.is_visible {
            return Err(CacheError::InconsistentState(
                "section hidden outside search mode".to_string(),
            ));
        }

        self.has_content = has_content;
        if has_content {
            self.is_visible = true;
            if self.is_searching {
                self.is_open = true;
            }
        } else if self.is_searching {
            self.is_visible = false;
        }

        Ok(())
    }

    /// State used when a content transition could not be applied
    pub fn fail_safe(&mut self, default_state: bool) {
        self.is_visible = !self.is_searching;
        self.is_open = if self.is_searching { true } else { default_state };
    }
}
