//! Sort and pagination resolution

use super::params::{QueryParameters, SortDirection, SortField};
use crate::config::QueryConfig;
use crate::models::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Resolved ordering and page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
    /// 1-based page number after clamping
    pub page: u64,
    /// Page size after clamping, always at least 1
    pub limit: u64,
    /// Number of matching tasks skipped before this page
    pub skip: u64,
}

impl Default for SortSpec {
    fn default() -> Self {
        resolve_sort(&QueryParameters::default(), &QueryConfig::default())
    }
}

/// Resolve sort order and clamp pagination
///
/// `page` is raised to at least 1 and `limit` is clamped into
/// `1..=config.max_limit`; a missing `limit` uses `config.default_limit`.
#[must_use]
pub fn resolve_sort(params: &QueryParameters, config: &QueryConfig) -> SortSpec {
    let max_limit = u64::from(config.max_limit.max(1));
    let requested = params
        .limit
        .unwrap_or_else(|| i64::from(config.default_limit));

    let page = u64::try_from(params.page.max(1)).unwrap_or(1);
    let limit = u64::try_from(requested.max(1)).unwrap_or(1).min(max_limit);

    SortSpec {
        field: params.sort_field,
        direction: params.sort_order,
        page,
        limit,
        skip: (page - 1).saturating_mul(limit),
    }
}

impl SortSpec {
    /// Total order over tasks for this sort
    ///
    /// Tasks without a due date sort after every dated task in either
    /// direction. Ties are broken by id ascending so pages never overlap.
    #[must_use]
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let directed = |ordering: Ordering| match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };

        let primary = match self.field {
            SortField::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortField::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
            SortField::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at)),
            SortField::Priority => directed(a.priority.rank().cmp(&b.priority.rank())),
            SortField::Status => directed(a.status.as_str().cmp(b.status.as_str())),
            SortField::Title => directed(a.title.cmp(&b.title)),
            SortField::Progress => directed(a.progress.cmp(&b.progress)),
        };

        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// Number of pages needed for `total` matches at this page size
    #[must_use]
    pub fn pages_for(&self, total: u64) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        total.div_ceil(self.limit)
    }
}
