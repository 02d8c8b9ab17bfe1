//! Task storage backends
//!
//! Both backends accept the same [`FilterPredicate`] and [`SortSpec`] and
//! must return identical pages for identical data.

mod mappers;
pub mod memory;
pub mod sql_filter;
pub mod sqlite;

pub use memory::MemoryTaskStore;
pub use sql_filter::{SqlFilter, SqlParam};
pub use sqlite::SqliteTaskStore;

use crate::error::Result;
use crate::models::Task;
use crate::query::{FilterPredicate, SortSpec};
use async_trait::async_trait;

/// Read/write access to persisted tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch one page of matching tasks in `sort` order
    async fn find(&self, filter: &FilterPredicate, sort: &SortSpec) -> Result<Vec<Task>>;

    /// Count every task matching `filter`, ignoring pagination
    async fn count(&self, filter: &FilterPredicate) -> Result<u64>;

    async fn insert(&self, task: &Task) -> Result<()>;
}
