//! Store-independent filter predicate tree
//!
//! A [`FilterPredicate`] is produced by the filter builder and consumed by
//! every [`TaskStore`](crate::store::TaskStore). It can be evaluated directly
//! against a [`Task`], rendered as a document-store filter, or translated to
//! SQL by the SQLite store.

use crate::models::Task;
use chrono::{DateTime, Utc};
use docket_common::format_datetime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// Filterable task attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskField {
    Status,
    Priority,
    Category,
    Type,
    RelatedEntityId,
    AssigneeId,
    AssignerId,
    DueDate,
    Progress,
    Title,
    Description,
    /// Content of any comment on the task
    CommentContent,
    Attachments,
    Dependencies,
}

impl TaskField {
    /// Document path of the field
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Category => "category",
            Self::Type => "type",
            Self::RelatedEntityId => "relatedEntityId",
            Self::AssigneeId => "assigneeId",
            Self::AssignerId => "assignerId",
            Self::DueDate => "dueDate",
            Self::Progress => "progress",
            Self::Title => "title",
            Self::Description => "description",
            Self::CommentContent => "comments.content",
            Self::Attachments => "attachments",
            Self::Dependencies => "dependencies",
        }
    }
}

/// Scalar operand of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Compare two values of the same kind; mixed kinds are unordered
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn to_document(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(i) => json!(i),
            Self::Timestamp(t) => json!({ "$date": format_datetime(t) }),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Timestamp(t) => f.write_str(&format_datetime(t)),
        }
    }
}

/// One end of a range condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    pub value: FieldValue,
    pub inclusive: bool,
}

impl RangeBound {
    #[must_use]
    pub const fn inclusive(value: FieldValue) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    #[must_use]
    pub const fn exclusive(value: FieldValue) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

/// Condition applied to a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Equals(FieldValue),
    In(Vec<FieldValue>),
    /// Also matches when the field is absent
    NotIn(Vec<FieldValue>),
    Range {
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    /// Case-insensitive literal substring match
    Contains(String),
    /// The collection field has at least one element
    NonEmpty,
}

/// Boolean filter over tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterPredicate {
    Compare { field: TaskField, condition: Condition },
    /// Conjunction; empty matches every task
    And(Vec<FilterPredicate>),
    /// Disjunction; empty matches no task
    Or(Vec<FilterPredicate>),
}

impl Default for FilterPredicate {
    fn default() -> Self {
        Self::match_all()
    }
}

impl FilterPredicate {
    /// The empty conjunction
    #[must_use]
    pub const fn match_all() -> Self {
        Self::And(Vec::new())
    }

    #[must_use]
    pub const fn compare(field: TaskField, condition: Condition) -> Self {
        Self::Compare { field, condition }
    }

    #[must_use]
    pub fn equals(field: TaskField, value: FieldValue) -> Self {
        Self::compare(field, Condition::Equals(value))
    }

    #[must_use]
    pub fn contains(field: TaskField, needle: &str) -> Self {
        Self::compare(field, Condition::Contains(needle.to_string()))
    }

    #[must_use]
    pub fn is_match_all(&self) -> bool {
        matches!(self, Self::And(children) if children.is_empty())
    }

    /// Evaluate the predicate against a task
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::And(children) => children.iter().all(|p| p.matches(task)),
            Self::Or(children) => children.iter().any(|p| p.matches(task)),
            Self::Compare { field, condition } => condition_matches(*field, condition, task),
        }
    }

    /// Render as a document-store (MongoDB dialect) filter
    #[must_use]
    pub fn to_document_filter(&self) -> Value {
        match self {
            Self::And(children) if children.is_empty() => Value::Object(Map::new()),
            Self::And(children) => json!({
                "$and": children.iter().map(Self::to_document_filter).collect::<Vec<_>>()
            }),
            Self::Or(children) if children.is_empty() => json!({ "$nor": [{}] }),
            Self::Or(children) => json!({
                "$or": children.iter().map(Self::to_document_filter).collect::<Vec<_>>()
            }),
            Self::Compare { field, condition } => compare_document(*field, condition),
        }
    }
}

fn scalar(field: TaskField, task: &Task) -> Option<FieldValue> {
    match field {
        TaskField::Status => Some(FieldValue::Text(task.status.as_str().to_string())),
        TaskField::Priority => Some(FieldValue::Text(task.priority.as_str().to_string())),
        TaskField::Category => Some(FieldValue::Text(task.category.as_str().to_string())),
        TaskField::Type => Some(FieldValue::Text(task.task_type.as_str().to_string())),
        TaskField::RelatedEntityId => task.related_entity_id.clone().map(FieldValue::Text),
        TaskField::AssigneeId => task.assignee_id.map(FieldValue::Integer),
        TaskField::AssignerId => task.assigner_id.map(FieldValue::Integer),
        TaskField::DueDate => task.due_date.map(FieldValue::Timestamp),
        TaskField::Progress => Some(FieldValue::Integer(i64::from(task.progress))),
        TaskField::Title => Some(FieldValue::Text(task.title.clone())),
        TaskField::Description => task.description.clone().map(FieldValue::Text),
        TaskField::CommentContent | TaskField::Attachments | TaskField::Dependencies => None,
    }
}

fn texts(field: TaskField, task: &Task) -> Vec<&str> {
    match field {
        TaskField::CommentContent => task.comments.iter().map(|c| c.content.as_str()).collect(),
        TaskField::Title => vec![task.title.as_str()],
        TaskField::Description => task.description.as_deref().into_iter().collect(),
        TaskField::RelatedEntityId => task.related_entity_id.as_deref().into_iter().collect(),
        _ => Vec::new(),
    }
}

fn condition_matches(field: TaskField, condition: &Condition, task: &Task) -> bool {
    match condition {
        Condition::Equals(expected) => scalar(field, task).is_some_and(|v| &v == expected),
        Condition::In(values) => scalar(field, task).is_some_and(|v| values.contains(&v)),
        Condition::NotIn(values) => scalar(field, task).map_or(true, |v| !values.contains(&v)),
        Condition::Range { lower, upper } => scalar(field, task).is_some_and(|v| {
            let above = lower.as_ref().map_or(true, |b| {
                matches!(
                    (v.compare(&b.value), b.inclusive),
                    (Some(Ordering::Greater), _) | (Some(Ordering::Equal), true)
                )
            });
            let below = upper.as_ref().map_or(true, |b| {
                matches!(
                    (v.compare(&b.value), b.inclusive),
                    (Some(Ordering::Less), _) | (Some(Ordering::Equal), true)
                )
            });
            above && below
        }),
        Condition::Contains(needle) => {
            let needle = needle.to_lowercase();
            texts(field, task)
                .iter()
                .any(|text| text.to_lowercase().contains(&needle))
        }
        Condition::NonEmpty => match field {
            TaskField::Attachments => !task.attachments.is_empty(),
            TaskField::Dependencies => !task.dependencies.is_empty(),
            TaskField::CommentContent => !task.comments.is_empty(),
            _ => false,
        },
    }
}

fn compare_document(field: TaskField, condition: &Condition) -> Value {
    let path = field.path();
    match condition {
        Condition::Equals(v) => json!({ path: { "$eq": v.to_document() } }),
        Condition::In(values) => json!({
            path: { "$in": values.iter().map(FieldValue::to_document).collect::<Vec<_>>() }
        }),
        Condition::NotIn(values) => json!({
            path: { "$nin": values.iter().map(FieldValue::to_document).collect::<Vec<_>>() }
        }),
        Condition::Range { lower, upper } => {
            let mut ops = Map::new();
            if let Some(b) = lower {
                let op = if b.inclusive { "$gte" } else { "$gt" };
                ops.insert(op.to_string(), b.value.to_document());
            }
            if let Some(b) = upper {
                let op = if b.inclusive { "$lte" } else { "$lt" };
                ops.insert(op.to_string(), b.value.to_document());
            }
            json!({ path: ops })
        }
        Condition::Contains(needle) => {
            let regex = json!({ "$regex": regex::escape(needle), "$options": "i" });
            match field {
                TaskField::CommentContent => {
                    json!({ "comments": { "$elemMatch": { "content": regex } } })
                }
                _ => json!({ path: regex }),
            }
        }
        Condition::NonEmpty => json!({ path: { "$exists": true, "$ne": [] } }),
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(children) if children.is_empty() => f.write_str("TRUE"),
            Self::Or(children) if children.is_empty() => f.write_str("FALSE"),
            Self::And(children) => write_joined(f, children, " AND "),
            Self::Or(children) => write_joined(f, children, " OR "),
            Self::Compare { field, condition } => {
                let path = field.path();
                let list = |values: &[FieldValue]| {
                    values
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                match condition {
                    Condition::Equals(v) => write!(f, "{path} = {v}"),
                    Condition::In(values) => write!(f, "{path} IN [{}]", list(values)),
                    Condition::NotIn(values) => write!(f, "{path} NOT IN [{}]", list(values)),
                    Condition::Range { lower, upper } => {
                        let mut parts = Vec::new();
                        if let Some(b) = lower {
                            let op = if b.inclusive { ">=" } else { ">" };
                            parts.push(format!("{path} {op} {}", b.value));
                        }
                        if let Some(b) = upper {
                            let op = if b.inclusive { "<=" } else { "<" };
                            parts.push(format!("{path} {op} {}", b.value));
                        }
                        if parts.is_empty() {
                            f.write_str("TRUE")
                        } else {
                            f.write_str(&parts.join(" AND "))
                        }
                    }
                    Condition::Contains(needle) => write!(f, "{path} ~* {needle:?}"),
                    Condition::NonEmpty => write!(f, "{path} IS NOT EMPTY"),
                }
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[FilterPredicate], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}
