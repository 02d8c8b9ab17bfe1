//! Translation of a [`FilterPredicate`] into a parameterized SQLite clause
//!
//! Values never reach the SQL text; every operand becomes a `?` placeholder
//! with a matching entry in [`SqlFilter::params`].

use crate::models::TaskPriority;
use crate::query::{
    Condition, FieldValue, FilterPredicate, RangeBound, SortDirection, SortField, SortSpec,
    TaskField,
};
use docket_common::escape_like;

/// Bound parameter for a generated clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

impl From<&FieldValue> for SqlParam {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => Self::Text(s.clone()),
            FieldValue::Integer(i) => Self::Integer(*i),
            FieldValue::Timestamp(t) => Self::Integer(t.timestamp_millis()),
        }
    }
}

/// `WHERE` clause text plus its parameters in placeholder order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

enum Target {
    Column(&'static str),
    Comments,
    Collection(&'static str),
}

fn target(field: TaskField) -> Target {
    match field {
        TaskField::Status => Target::Column("status"),
        TaskField::Priority => Target::Column("priority"),
        TaskField::Category => Target::Column("category"),
        TaskField::Type => Target::Column("type"),
        TaskField::RelatedEntityId => Target::Column("related_entity_id"),
        TaskField::AssigneeId => Target::Column("assignee_id"),
        TaskField::AssignerId => Target::Column("assigner_id"),
        TaskField::DueDate => Target::Column("due_date"),
        TaskField::Progress => Target::Column("progress"),
        TaskField::Title => Target::Column("title"),
        TaskField::Description => Target::Column("description"),
        TaskField::CommentContent => Target::Comments,
        TaskField::Attachments => Target::Collection("task_attachments"),
        TaskField::Dependencies => Target::Collection("task_dependencies"),
    }
}

/// Columns substring search may target, each with a `<column>_folded` copy
const TEXT_COLUMNS: [&str; 3] = ["title", "description", "related_entity_id"];

impl SqlFilter {
    /// Translate a predicate tree
    #[must_use]
    pub fn from_predicate(predicate: &FilterPredicate) -> Self {
        let mut params = Vec::new();
        let clause = translate(predicate, &mut params);
        Self { clause, params }
    }
}

fn translate(predicate: &FilterPredicate, params: &mut Vec<SqlParam>) -> String {
    match predicate {
        FilterPredicate::And(children) if children.is_empty() => "1".to_string(),
        FilterPredicate::Or(children) if children.is_empty() => "0".to_string(),
        FilterPredicate::And(children) => join(children, " AND ", params),
        FilterPredicate::Or(children) => join(children, " OR ", params),
        FilterPredicate::Compare { field, condition } => compare(*field, condition, params),
    }
}

fn join(children: &[FilterPredicate], sep: &str, params: &mut Vec<SqlParam>) -> String {
    let parts: Vec<String> = children.iter().map(|c| translate(c, params)).collect();
    format!("({})", parts.join(sep))
}

fn placeholders(values: &[FieldValue], params: &mut Vec<SqlParam>) -> String {
    params.extend(values.iter().map(SqlParam::from));
    vec!["?"; values.len()].join(", ")
}

fn compare(field: TaskField, condition: &Condition, params: &mut Vec<SqlParam>) -> String {
    match target(field) {
        Target::Column(column) => column_condition(column, condition, params),
        Target::Comments => match condition {
            Condition::Contains(needle) => {
                params.push(like_pattern(needle));
                "EXISTS (SELECT 1 FROM task_comments c WHERE c.task_id = tasks.id \
                 AND c.content_folded LIKE ? ESCAPE '\\')"
                    .to_string()
            }
            Condition::NonEmpty => {
                "EXISTS (SELECT 1 FROM task_comments c WHERE c.task_id = tasks.id)".to_string()
            }
            other => absent(other),
        },
        Target::Collection(table) => match condition {
            Condition::NonEmpty => {
                format!("EXISTS (SELECT 1 FROM {table} x WHERE x.task_id = tasks.id)")
            }
            other => absent(other),
        },
    }
}

/// Clause for a condition on a field with no scalar value
fn absent(condition: &Condition) -> String {
    match condition {
        Condition::NotIn(_) => "1".to_string(),
        _ => "0".to_string(),
    }
}

fn column_condition(column: &str, condition: &Condition, params: &mut Vec<SqlParam>) -> String {
    match condition {
        Condition::Equals(value) => {
            params.push(value.into());
            format!("{column} = ?")
        }
        Condition::In(values) if values.is_empty() => "0".to_string(),
        Condition::In(values) => format!("{column} IN ({})", placeholders(values, params)),
        Condition::NotIn(values) if values.is_empty() => "1".to_string(),
        Condition::NotIn(values) => format!(
            "({column} IS NULL OR {column} NOT IN ({}))",
            placeholders(values, params)
        ),
        Condition::Range { lower, upper } => {
            let mut parts = vec![format!("{column} IS NOT NULL")];
            let mut bound = |b: &RangeBound, op: &str, round_up: bool| {
                params.push(range_param(&b.value, round_up));
                parts.push(format!("{column} {op} ?"));
            };
            if let Some(b) = lower {
                if b.inclusive {
                    bound(b, ">=", true);
                } else {
                    bound(b, ">", false);
                }
            }
            if let Some(b) = upper {
                if b.inclusive {
                    bound(b, "<=", false);
                } else {
                    bound(b, "<", true);
                }
            }
            format!("({})", parts.join(" AND "))
        }
        Condition::Contains(needle) if TEXT_COLUMNS.contains(&column) => {
            params.push(like_pattern(needle));
            format!("{column}_folded LIKE ? ESCAPE '\\'")
        }
        Condition::Contains(_) | Condition::NonEmpty => "0".to_string(),
    }
}

/// Bind a range bound against millisecond columns
///
/// Stored instants are whole milliseconds, so a sub-millisecond bound is
/// rounded to the nearest millisecond that keeps the comparison exact:
/// up for `>=` and `<`, down for `>` and `<=`.
fn range_param(value: &FieldValue, round_up: bool) -> SqlParam {
    match value {
        FieldValue::Timestamp(t) => {
            let partial = t.timestamp_subsec_nanos() % 1_000_000 != 0;
            let millis = t.timestamp_millis();
            SqlParam::Integer(if round_up && partial {
                millis.saturating_add(1)
            } else {
                millis
            })
        }
        other => other.into(),
    }
}

fn like_pattern(needle: &str) -> SqlParam {
    SqlParam::Text(format!("%{}%", escape_like(&needle.to_lowercase())))
}

/// `ORDER BY` expression matching [`SortSpec::compare`]
#[must_use]
pub fn order_by(sort: &SortSpec) -> String {
    let dir = match sort.direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    let primary = match sort.field {
        SortField::DueDate => format!("due_date IS NULL, due_date {dir}"),
        SortField::CreatedAt => format!("created_at {dir}"),
        SortField::UpdatedAt => format!("updated_at {dir}"),
        SortField::Status => format!("status {dir}"),
        SortField::Title => format!("title {dir}"),
        SortField::Progress => format!("progress {dir}"),
        SortField::Priority => {
            let arms: String = TaskPriority::ALL
                .iter()
                .map(|p| format!(" WHEN '{}' THEN {}", p.as_str(), p.rank()))
                .collect();
            format!("CASE priority{arms} END {dir}")
        }
    };
    format!("{primary}, id ASC")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_match_all_is_true() {
        let filter = SqlFilter::from_predicate(&FilterPredicate::match_all());
        assert_eq!(filter.clause, "1");
        assert!(filter.params.is_empty());
    }

    #[test]
    fn test_equals_binds_value() {
        let filter = SqlFilter::from_predicate(&FilterPredicate::equals(
            TaskField::Status,
            text("pending"),
        ));
        assert_eq!(filter.clause, "status = ?");
        assert_eq!(filter.params, vec![SqlParam::Text("pending".to_string())]);
    }

    #[test]
    fn test_not_in_keeps_nulls() {
        let filter = SqlFilter::from_predicate(&FilterPredicate::compare(
            TaskField::Status,
            Condition::NotIn(vec![text("completed"), text("cancelled")]),
        ));
        assert_eq!(filter.clause, "(status IS NULL OR status NOT IN (?, ?))");
        assert_eq!(filter.params.len(), 2);
    }

    #[test]
    fn test_range_uses_millis() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filter = SqlFilter::from_predicate(&FilterPredicate::compare(
            TaskField::DueDate,
            Condition::Range {
                lower: Some(RangeBound::exclusive(FieldValue::Timestamp(at))),
                upper: None,
            },
        ));
        assert_eq!(filter.clause, "(due_date IS NOT NULL AND due_date > ?)");
        assert_eq!(filter.params, vec![SqlParam::Integer(at.timestamp_millis())]);
    }

    #[test]
    fn test_sub_millisecond_bounds_round_toward_the_range() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::microseconds(500);
        let millis = at.timestamp_millis();
        let range = |lower, upper| {
            SqlFilter::from_predicate(&FilterPredicate::compare(
                TaskField::DueDate,
                Condition::Range { lower, upper },
            ))
            .params
        };
        let ts = || FieldValue::Timestamp(at);

        assert_eq!(
            range(Some(RangeBound::inclusive(ts())), None),
            vec![SqlParam::Integer(millis + 1)]
        );
        assert_eq!(
            range(Some(RangeBound::exclusive(ts())), None),
            vec![SqlParam::Integer(millis)]
        );
        assert_eq!(
            range(None, Some(RangeBound::inclusive(ts()))),
            vec![SqlParam::Integer(millis)]
        );
        assert_eq!(
            range(None, Some(RangeBound::exclusive(ts()))),
            vec![SqlParam::Integer(millis + 1)]
        );
    }

    #[test]
    fn test_whole_millisecond_bounds_are_unchanged() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filter = SqlFilter::from_predicate(&FilterPredicate::compare(
            TaskField::DueDate,
            Condition::Range {
                lower: Some(RangeBound::inclusive(FieldValue::Timestamp(at))),
                upper: Some(RangeBound::exclusive(FieldValue::Timestamp(at))),
            },
        ));
        assert_eq!(
            filter.params,
            vec![
                SqlParam::Integer(at.timestamp_millis()),
                SqlParam::Integer(at.timestamp_millis()),
            ]
        );
    }

    #[test]
    fn test_contains_escapes_wildcards() {
        let filter =
            SqlFilter::from_predicate(&FilterPredicate::contains(TaskField::Title, "50%_Off"));
        assert_eq!(filter.clause, "title_folded LIKE ? ESCAPE '\\'");
        assert_eq!(filter.params, vec![SqlParam::Text("%50\\%\\_off%".to_string())]);
    }

    #[test]
    fn test_comment_search_uses_exists() {
        let filter =
            SqlFilter::from_predicate(&FilterPredicate::contains(TaskField::CommentContent, "x"));
        assert!(filter.clause.starts_with("EXISTS (SELECT 1 FROM task_comments"));
        assert_eq!(filter.params, vec![SqlParam::Text("%x%".to_string())]);
    }

    #[test]
    fn test_non_empty_collections() {
        let filter = SqlFilter::from_predicate(&FilterPredicate::compare(
            TaskField::Dependencies,
            Condition::NonEmpty,
        ));
        assert_eq!(
            filter.clause,
            "EXISTS (SELECT 1 FROM task_dependencies x WHERE x.task_id = tasks.id)"
        );
    }

    #[test]
    fn test_nested_params_follow_placeholder_order() {
        let predicate = FilterPredicate::And(vec![
            FilterPredicate::equals(TaskField::Priority, text("high")),
            FilterPredicate::Or(vec![
                FilterPredicate::equals(TaskField::AssigneeId, FieldValue::Integer(3)),
                FilterPredicate::equals(TaskField::AssignerId, FieldValue::Integer(3)),
            ]),
        ]);
        let filter = SqlFilter::from_predicate(&predicate);
        assert_eq!(
            filter.clause,
            "(priority = ? AND (assignee_id = ? OR assigner_id = ?))"
        );
        assert_eq!(
            filter.params,
            vec![
                SqlParam::Text("high".to_string()),
                SqlParam::Integer(3),
                SqlParam::Integer(3),
            ]
        );
    }

    #[test]
    fn test_order_by() {
        let sort = SortSpec {
            field: SortField::Priority,
            direction: SortDirection::Descending,
            ..SortSpec::default()
        };
        assert_eq!(
            order_by(&sort),
            "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 WHEN 'high' THEN 2 \
             WHEN 'urgent' THEN 3 END DESC, id ASC"
        );

        let sort = SortSpec {
            field: SortField::DueDate,
            direction: SortDirection::Ascending,
            ..SortSpec::default()
        };
        assert_eq!(order_by(&sort), "due_date IS NULL, due_date ASC, id ASC");
    }
}
