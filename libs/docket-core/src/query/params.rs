//! Task list query parameters and their parsing from query-string maps

use crate::error::{DocketError, Result};
use crate::models::{TaskCategory, TaskPriority, TaskStatus, TaskType};
use chrono::{DateTime, Utc};
use docket_common::{parse_bool, parse_iso_datetime, split_list, DEFAULT_PAGE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Fields a task list may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    DueDate,
    #[default]
    CreatedAt,
    UpdatedAt,
    Priority,
    Status,
    Title,
    Progress,
}

impl SortField {
    pub const ALL: [Self; 7] = [
        Self::DueDate,
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::Priority,
        Self::Status,
        Self::Title,
        Self::Progress,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DueDate => "dueDate",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Title => "title",
            Self::Progress => "progress",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Ascending only for `asc` (any case); everything else is descending
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("asc") {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Text fields that take part in free-text search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Description,
    /// Content of every comment on the task
    Comments,
}

impl SearchField {
    pub const ALL: [Self; 3] = [Self::Title, Self::Description, Self::Comments];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Comments => "comments",
        }
    }
}

macro_rules! impl_allow_list {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    Self::ALL
                        .iter()
                        .copied()
                        .find(|v| v.as_str() == s)
                        .ok_or_else(|| {
                            let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                            format!("unknown value '{s}', expected one of: {}", allowed.join(", "))
                        })
                }
            }
        )+
    };
}

impl_allow_list!(SortField, SearchField);

/// Normalized task list query
///
/// Pagination values are kept as supplied and clamped by the sort resolver;
/// everything else has been parsed into its typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParameters {
    pub page: i64,
    /// `None` means the configured default page size
    pub limit: Option<i64>,
    #[serde(rename = "sortBy", alias = "sortField")]
    pub sort_field: SortField,
    pub sort_order: SortDirection,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub search: Option<String>,
    /// `None` means the configured default search fields
    pub search_fields: Option<Vec<SearchField>>,
    pub assignee_id: Option<i64>,
    pub assigner_id: Option<i64>,
    pub my_tasks_only: bool,
    pub related_entity_id: Option<String>,
    pub has_attachments: Option<bool>,
    pub has_dependencies: Option<bool>,
    pub progress_min: Option<u8>,
    pub progress_max: Option<u8>,
    pub due_soon_days: Option<u32>,
    pub overdue: bool,
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: None,
            sort_field: SortField::default(),
            sort_order: SortDirection::default(),
            status: None,
            priority: None,
            category: None,
            task_type: None,
            date_from: None,
            date_to: None,
            search: None,
            search_fields: None,
            assignee_id: None,
            assigner_id: None,
            my_tasks_only: false,
            related_entity_id: None,
            has_attachments: None,
            has_dependencies: None,
            progress_min: None,
            progress_max: None,
            due_soon_days: None,
            overdue: false,
        }
    }
}

impl QueryParameters {
    /// Start a fluent builder
    #[must_use]
    pub fn builder() -> QueryParametersBuilder {
        QueryParametersBuilder::new()
    }

    /// Parse a query-string map as delivered by the HTTP layer
    ///
    /// Unknown keys are ignored and blank values count as absent.
    ///
    /// # Errors
    /// Returns `DocketError::Validation` naming the first parameter that
    /// cannot be parsed
    pub fn from_query_map(query: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            query
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let mut params = Self::default();

        if let Some(page) = parse_number::<i64>("page", get("page"))? {
            params.page = page;
        }
        params.limit = parse_number::<i64>("limit", get("limit"))?;

        let (sort_key, sort_value) = match get("sortBy") {
            Some(v) => ("sortBy", Some(v)),
            None => ("sortField", get("sortField")),
        };
        if let Some(field) = parse_value::<SortField>(sort_key, sort_value)? {
            params.sort_field = field;
        }
        if let Some(order) = get("sortOrder") {
            params.sort_order = SortDirection::from_wire(order);
        }

        params.status = parse_value("status", get("status"))?;
        params.priority = parse_value("priority", get("priority"))?;
        params.category = parse_value("category", get("category"))?;
        params.task_type = parse_value("type", get("type"))?;

        params.date_from = parse_date("dateFrom", get("dateFrom"))?;
        params.date_to = parse_date("dateTo", get("dateTo"))?;

        params.search = get("search").map(ToString::to_string);
        if let Some(raw) = get("searchFields") {
            let fields = split_list(raw)
                .iter()
                .map(|f| {
                    f.parse::<SearchField>()
                        .map_err(|e| DocketError::validation("searchFields", e))
                })
                .collect::<Result<Vec<_>>>()?;
            if !fields.is_empty() {
                params.search_fields = Some(fields);
            }
        }

        params.assignee_id = parse_number("assigneeId", get("assigneeId"))?;
        params.assigner_id = parse_number("assignerId", get("assignerId"))?;
        params.my_tasks_only = parse_flag("myTasksOnly", get("myTasksOnly"))?.unwrap_or(false);
        params.related_entity_id = get("relatedEntityId").map(ToString::to_string);

        params.has_attachments = parse_flag("hasAttachments", get("hasAttachments"))?;
        params.has_dependencies = parse_flag("hasDependencies", get("hasDependencies"))?;

        params.progress_min = parse_percentage("progressMin", get("progressMin"))?;
        params.progress_max = parse_percentage("progressMax", get("progressMax"))?;

        params.due_soon_days = parse_number("dueSoonDays", get("dueSoonDays"))?;
        params.overdue = parse_flag("overdue", get("overdue"))?.unwrap_or(false);

        Ok(params)
    }

    /// Check cross-field rules that parsing alone cannot
    ///
    /// # Errors
    /// Returns `DocketError::Validation` for out-of-range progress bounds,
    /// inverted progress bounds, or an explicit closed status combined with
    /// `overdue=true`
    pub fn validate(&self) -> Result<()> {
        for (field, bound) in [
            ("progressMin", self.progress_min),
            ("progressMax", self.progress_max),
        ] {
            if let Some(value) = bound {
                if value > 100 {
                    return Err(DocketError::validation(
                        field,
                        format!("must be between 0 and 100, got {value}"),
                    ));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.progress_min, self.progress_max) {
            if min > max {
                return Err(DocketError::validation(
                    "progressMin",
                    format!("must not exceed progressMax ({min} > {max})"),
                ));
            }
        }

        if self.overdue {
            if let Some(status) = self.status.filter(|s| s.is_closed()) {
                return Err(DocketError::validation(
                    "status",
                    format!("'{status}' can never match overdue=true, which excludes completed and cancelled tasks"),
                ));
            }
        }

        Ok(())
    }
}

fn parse_value<T>(field: &str, raw: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    raw.map(|v| v.parse::<T>().map_err(|e| DocketError::validation(field, e)))
        .transpose()
}

fn parse_number<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>> {
    raw.map(|v| {
        v.parse::<T>().map_err(|_| {
            DocketError::validation(field, format!("expected an integer, got '{v}'"))
        })
    })
    .transpose()
}

fn parse_flag(field: &str, raw: Option<&str>) -> Result<Option<bool>> {
    raw.map(|v| {
        parse_bool(v)
            .ok_or_else(|| DocketError::validation(field, format!("expected a boolean, got '{v}'")))
    })
    .transpose()
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|v| {
        parse_iso_datetime(v).map_err(|e| {
            DocketError::validation(field, format!("invalid ISO date '{v}': {e}"))
        })
    })
    .transpose()
}

fn parse_percentage(field: &str, raw: Option<&str>) -> Result<Option<u8>> {
    match parse_number::<i64>(field, raw)? {
        Some(value) => u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Some)
            .ok_or_else(|| {
                DocketError::validation(field, format!("must be between 0 and 100, got {value}"))
            }),
        None => Ok(None),
    }
}

/// Fluent builder for [`QueryParameters`]
#[derive(Debug, Clone, Default)]
pub struct QueryParametersBuilder {
    params: QueryParameters,
}

impl QueryParametersBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn page(mut self, page: i64) -> Self {
        self.params.page = page;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.params.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.params.sort_field = field;
        self.params.sort_order = direction;
        self
    }

    #[must_use]
    pub const fn status(mut self, status: TaskStatus) -> Self {
        self.params.status = Some(status);
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: TaskPriority) -> Self {
        self.params.priority = Some(priority);
        self
    }

    #[must_use]
    pub const fn category(mut self, category: TaskCategory) -> Self {
        self.params.category = Some(category);
        self
    }

    #[must_use]
    pub const fn task_type(mut self, task_type: TaskType) -> Self {
        self.params.task_type = Some(task_type);
        self
    }

    /// Filter by due date range (inclusive bounds)
    #[must_use]
    pub const fn due_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.params.date_from = from;
        self.params.date_to = to;
        self
    }

    #[must_use]
    pub fn search(mut self, query: &str) -> Self {
        self.params.search = Some(query.to_string());
        self
    }

    #[must_use]
    pub fn search_fields(mut self, fields: Vec<SearchField>) -> Self {
        self.params.search_fields = Some(fields);
        self
    }

    #[must_use]
    pub const fn assignee(mut self, user_id: i64) -> Self {
        self.params.assignee_id = Some(user_id);
        self
    }

    #[must_use]
    pub const fn assigner(mut self, user_id: i64) -> Self {
        self.params.assigner_id = Some(user_id);
        self
    }

    #[must_use]
    pub const fn my_tasks_only(mut self) -> Self {
        self.params.my_tasks_only = true;
        self
    }

    #[must_use]
    pub fn related_entity(mut self, id: &str) -> Self {
        self.params.related_entity_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub const fn has_attachments(mut self, value: bool) -> Self {
        self.params.has_attachments = Some(value);
        self
    }

    #[must_use]
    pub const fn has_dependencies(mut self, value: bool) -> Self {
        self.params.has_dependencies = Some(value);
        self
    }

    #[must_use]
    pub const fn progress_between(mut self, min: Option<u8>, max: Option<u8>) -> Self {
        self.params.progress_min = min;
        self.params.progress_max = max;
        self
    }

    #[must_use]
    pub const fn due_soon(mut self, days: u32) -> Self {
        self.params.due_soon_days = Some(days);
        self
    }

    #[must_use]
    pub const fn overdue(mut self) -> Self {
        self.params.overdue = true;
        self
    }

    #[must_use]
    pub fn build(self) -> QueryParameters {
        self.params
    }
}
