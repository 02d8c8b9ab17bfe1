//! Paginated query results

use super::sort::SortSpec;
use serde::{Deserialize, Serialize};

/// One page of matching items plus pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    /// Matches across all pages
    pub total: u64,
    pub page: u64,
    /// `ceil(total / limit)`, zero when nothing matched
    pub pages: u64,
    pub limit: u64,
}

impl<T> QueryResult<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, sort: &SortSpec) -> Self {
        Self {
            items,
            total,
            page: sort.page,
            pages: sort.pages_for(total),
            limit: sort.limit,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a page after this one exists
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.page < self.pages
    }

    /// Transform the items, keeping the pagination metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> QueryResult<U> {
        QueryResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            pages: self.pages,
            limit: self.limit,
        }
    }
}
