//! Directory configuration.

use serde::{Deserialize, Serialize};

/// Rows per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// How search terms are compared against user fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

impl SearchMode {
    /// Substring test under this mode.
    pub fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            SearchMode::CaseSensitive => haystack.contains(needle),
            SearchMode::CaseInsensitive => haystack.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub page_size: usize,
    pub search_mode: SearchMode,
}

impl DirectoryConfig {
    /// A zero page size is bumped to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_search_mode(mut self, search_mode: SearchMode) -> Self {
        self.search_mode = search_mode;
        self
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_mode: SearchMode::default(),
        }
    }
}
