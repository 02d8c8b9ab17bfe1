//! Docket Core - Task query engine for law-firm practice management
//!
//! This library turns task list requests (status, priority, due-date windows,
//! free-text search, "my tasks", pagination) into a store-independent filter
//! predicate, then runs the page fetch and the total count against a task
//! store concurrently.
//!
//! # Features
//!
//! - **Typed query parameters**: parsed from query-string maps with field-level validation errors
//! - **Filter predicate tree**: evaluated in-process, rendered as a document filter, or translated to SQL
//! - **Deterministic paging**: clamped pagination and a total sort order with id tie-break
//! - **Stores**: in-memory and SQLite (sqlx) backends behind one async trait
//! - **Layered configuration**: defaults, YAML/JSON files and `DOCKET_*` environment variables
//!
//! # Quick Start
//!
//! ```no_run
//! use docket_core::{DocketError, QueryConfig, QueryParameters, SqliteTaskStore, TaskQueryService};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), DocketError> {
//! let config = QueryConfig::default();
//! let store = SqliteTaskStore::connect(&config.database).await?;
//! let service = TaskQueryService::new(Arc::new(store), config);
//!
//! let params = QueryParameters::builder().overdue().my_tasks_only().build();
//! let page = service.execute(&params, Some(42)).await?;
//! println!("{} of {} overdue tasks", page.items.len(), page.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `test-utils`: Enable test utilities (for testing only)

pub mod config;
pub mod config_loader;
pub mod error;
pub mod models;
pub mod query;
pub mod response;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{DatabaseConfig, LoggingConfig, QueryConfig, ServerConfig};
pub use config_loader::{load_config, ConfigLoader};
pub use error::{DocketError, Result};
pub use models::{
    Task, TaskAttachment, TaskCategory, TaskComment, TaskPriority, TaskStatus, TaskType,
};
pub use query::{
    build_filter, resolve_sort, Condition, FieldValue, FilterPredicate, QueryParameters,
    QueryResult, RangeBound, SearchField, SortDirection, SortField, SortSpec, TaskField,
    TaskQueryService,
};
pub use response::ApiResponse;
pub use store::{MemoryTaskStore, SqlFilter, SqlParam, SqliteTaskStore, TaskStore};

/// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_re_exports_compose() {
        let params = QueryParameters::builder()
            .status(TaskStatus::Pending)
            .build();
        let filter = build_filter(&params, None, Utc::now(), &QueryConfig::default()).unwrap();
        assert!(!filter.is_match_all());
        assert_eq!(resolve_sort(&params, &QueryConfig::default()).limit, 20);
    }
}
