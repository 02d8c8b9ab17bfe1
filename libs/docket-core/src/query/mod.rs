//! Task list query engine
//!
//! The pipeline is: raw query map → [`QueryParameters`] → [`build_filter`]
//! and [`resolve_sort`] → [`TaskQueryService`] fan-out to a store →
//! [`QueryResult`].

pub mod builder;
pub mod params;
pub mod predicate;
pub mod result;
pub mod service;
pub mod sort;

pub use builder::build_filter;
pub use params::{QueryParameters, QueryParametersBuilder, SearchField, SortDirection, SortField};
pub use predicate::{Condition, FieldValue, FilterPredicate, RangeBound, TaskField};
pub use result::QueryResult;
pub use service::TaskQueryService;
pub use sort::{resolve_sort, SortSpec};
