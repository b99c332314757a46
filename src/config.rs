//! Runtime settings loaded from the environment
//!
//! A `.env` file in the working directory is honoured. Every variable is
//! optional.
//!
//! | Variable                       | Default                       |
//! |--------------------------------|-------------------------------|
//! | `BILREG_STORE_PATH`            | `./data/section-state.json`   |
//! | `BILREG_DATA_VERSION`          | unset (entries written `1.0`) |
//! | `BILREG_SECTION_TTL_MS`        | `86400000` (24 h)             |
//! | `BILREG_CLEANUP_INTERVAL_SECS` | `300`                         |

use crate::error::{CacheError, Result};
use crate::section::{SectionOptions, DEFAULT_CACHE_TIMEOUT};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_STORE_PATH: &str = "BILREG_STORE_PATH";
pub const ENV_DATA_VERSION: &str = "BILREG_DATA_VERSION";
pub const ENV_SECTION_TTL_MS: &str = "BILREG_SECTION_TTL_MS";
pub const ENV_CLEANUP_INTERVAL_SECS: &str = "BILREG_CLEANUP_INTERVAL_SECS";

/// Settings shared by the CLI and embedding applications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// File backing the section store
    pub store_path: PathBuf,

    /// Data version applied to every section
    pub data_version: Option<String>,

    /// Section cache timeout; `0` in the environment disables expiry
    pub section_ttl: Option<Duration>,

    /// Interval of the periodic query cache sweep
    pub cleanup_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./data/section-state.json"),
            data_version: None,
            section_ttl: Some(DEFAULT_CACHE_TIMEOUT),
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let section_ttl = match non_empty(ENV_SECTION_TTL_MS) {
            Some(raw) => match parse_u64(ENV_SECTION_TTL_MS, &raw)? {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            None => defaults.section_ttl,
        };

        let cleanup_interval = match non_empty(ENV_CLEANUP_INTERVAL_SECS) {
            Some(raw) => match parse_u64(ENV_CLEANUP_INTERVAL_SECS, &raw)? {
                0 => {
                    return Err(CacheError::Config(format!(
                        "{} must be greater than 0",
                        ENV_CLEANUP_INTERVAL_SECS
                    )))
                }
                secs => Duration::from_secs(secs),
            },
            None => defaults.cleanup_interval,
        };

        Ok(Self {
            store_path: non_empty(ENV_STORE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            data_version: non_empty(ENV_DATA_VERSION),
            section_ttl,
            cleanup_interval,
        })
    }

    /// Section options carrying these settings' version and timeout
    pub fn section_options(&self, section_key: impl Into<String>) -> SectionOptions {
        SectionOptions {
            data_version: self.data_version.clone(),
            cache_timeout: self.section_ttl,
            ..SectionOptions::new(section_key)
        }
    }
}

fn parse_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| CacheError::Config(format!("{} is not a non-negative integer: {:?}", name, raw)))
}
