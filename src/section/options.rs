//! Options for a single section

use std::time::Duration;

/// Default cache timeout for section entries: 24 hours
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Options a section is mounted with
///
/// Changing any of the cache-related fields on a mounted manager triggers a
/// reload, unless the section is in search mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOptions {
    /// Storage key for this section; an empty key is a valid slot of its own
    pub section_key: String,

    /// Open state used whenever nothing valid is cached
    pub default_state: bool,

    /// Schema version; entries written under another version are discarded
    pub data_version: Option<String>,

    /// Maximum entry age; `None` keeps entries forever
    pub cache_timeout: Option<Duration>,

    /// Whether the section currently has content
    pub has_content: bool,

    /// Whether the surrounding screen is in search mode
    pub is_searching: bool,
}

impl SectionOptions {
    /// Options with defaults for everything but the key
    pub fn new(section_key: impl Into<String>) -> Self {
        Self {
            section_key: section_key.into(),
            default_state: false,
            data_version: None,
            cache_timeout: Some(DEFAULT_CACHE_TIMEOUT),
            has_content: false,
            is_searching: false,
        }
    }

    pub fn builder(section_key: impl Into<String>) -> SectionOptionsBuilder {
        SectionOptionsBuilder {
            options: Self::new(section_key),
        }
    }

    /// Whether switching from `self` to `other` requires reading storage again
    pub(crate) fn needs_reload(&self, other: &SectionOptions) -> bool {
        self.section_key != other.section_key
            || self.default_state != other.default_state
            || self.data_version != other.data_version
            || self.cache_timeout != other.cache_timeout
            || self.has_content != other.has_content
    }

    /// Whether switching from `self` to `other` re-runs the search visibility rule
    pub(crate) fn needs_visibility_pass(&self, other: &SectionOptions) -> bool {
        self.is_searching != other.is_searching || self.has_content != other.has_content
    }
}

/// Builder for [`SectionOptions`]
#[derive(Debug, Clone)]
pub struct SectionOptionsBuilder {
    options: SectionOptions,
}

impl SectionOptionsBuilder {
    pub fn default_state(mut self, open: bool) -> Self {
        self.options.default_state = open;
        self
    }

    pub fn data_version(mut self, version: impl Into<String>) -> Self {
        self.options.data_version = Some(version.into());
        self
    }

    pub fn cache_timeout(mut self, timeout: Duration) -> Self {
        self.options.cache_timeout = Some(timeout);
        self
    }

    /// Keep entries regardless of age
    pub fn no_cache_timeout(mut self) -> Self {
        self.options.cache_timeout = None;
        self
    }

    pub fn has_content(mut self, has_content: bool) -> Self {
        self.options.has_content = has_content;
        self
    }

    pub fn is_searching(mut self, searching: bool) -> Self {
        self.options.is_searching = searching;
        self
    }

    pub fn build(self) -> SectionOptions {
        self.options
    }
}
