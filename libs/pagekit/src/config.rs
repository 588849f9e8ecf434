//! Paging configuration.
//!
//! Deserialized from the application's configuration tree; every field has a
//! default so an empty section is valid.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u64 = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    /// Page size used by `page(n)` before any `per(..)`.
    pub default_per_page: u64,
    /// Upper bound applied by `per(..)`. `None` means unbounded.
    pub max_per_page: Option<u64>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: None,
        }
    }
}

impl PagingConfig {
    /// Resolve a requested page size: missing falls back to the default,
    /// zero becomes one, and the result never exceeds `max_per_page`.
    pub fn clamp_per_page(&self, requested: Option<u64>) -> u64 {
        let mut per = requested.unwrap_or(self.default_per_page);
        if per == 0 {
            per = 1;
        }
        if let Some(max) = self.max_per_page {
            per = per.min(max.max(1));
        }
        per
    }
}
