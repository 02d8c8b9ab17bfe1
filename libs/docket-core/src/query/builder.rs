//! Translate normalized query parameters into a [`FilterPredicate`]

use super::params::{QueryParameters, SearchField};
use super::predicate::{Condition, FieldValue, FilterPredicate, RangeBound, TaskField};
use crate::config::QueryConfig;
use crate::error::{DocketError, Result};
use crate::models::TaskStatus;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Build the filter for a task list request
///
/// Every supplied criterion becomes one conjunct, in a fixed order, so two
/// identical requests always produce identical predicates. Due-date criteria
/// are mutually exclusive: `overdue` (`dueDate < now`) wins over
/// `dueSoonDays` (`now < dueDate <= now + N days`), which wins over
/// `dateFrom`/`dateTo` (inclusive).
///
/// `user_id` is only consulted for `myTasksOnly`; when it is absent the flag
/// is ignored and any explicit assignee/assigner filters stand.
///
/// # Errors
/// Returns `DocketError::Validation` if the parameters are contradictory or
/// `dueSoonDays` overflows the calendar
pub fn build_filter(
    params: &QueryParameters,
    user_id: Option<i64>,
    now: DateTime<Utc>,
    config: &QueryConfig,
) -> Result<FilterPredicate> {
    params.validate()?;

    let text = |s: &str| FieldValue::Text(s.to_string());

    let status = params
        .status
        .map(|s| FilterPredicate::equals(TaskField::Status, text(s.as_str())));
    let priority = params
        .priority
        .map(|p| FilterPredicate::equals(TaskField::Priority, text(p.as_str())));
    let category = params
        .category
        .map(|c| FilterPredicate::equals(TaskField::Category, text(c.as_str())));
    let task_type = params
        .task_type
        .map(|t| FilterPredicate::equals(TaskField::Type, text(t.as_str())));
    let related_entity = params
        .related_entity_id
        .as_deref()
        .map(|id| FilterPredicate::equals(TaskField::RelatedEntityId, text(id)));

    let identity = identity_filter(params, user_id);
    let due_date = due_date_filter(params, now)?;

    let open_only = params.overdue.then(|| {
        FilterPredicate::compare(
            TaskField::Status,
            Condition::NotIn(
                TaskStatus::CLOSED
                    .iter()
                    .map(|s| text(s.as_str()))
                    .collect(),
            ),
        )
    });

    let search = search_filter(params, config);
    let progress = progress_filter(params);

    let attachments = (params.has_attachments == Some(true))
        .then(|| FilterPredicate::compare(TaskField::Attachments, Condition::NonEmpty));
    let dependencies = (params.has_dependencies == Some(true))
        .then(|| FilterPredicate::compare(TaskField::Dependencies, Condition::NonEmpty));

    let conjuncts: Vec<FilterPredicate> = [status, priority, category, task_type, related_entity]
        .into_iter()
        .chain(identity)
        .chain([due_date, open_only, search, progress, attachments, dependencies])
        .flatten()
        .collect();

    debug!(conditions = conjuncts.len(), "Built task filter");

    Ok(FilterPredicate::And(conjuncts))
}

fn identity_filter(
    params: &QueryParameters,
    user_id: Option<i64>,
) -> Vec<Option<FilterPredicate>> {
    let user = |field, id| FilterPredicate::equals(field, FieldValue::Integer(id));

    match (params.my_tasks_only, user_id) {
        (true, Some(uid)) => vec![Some(FilterPredicate::Or(vec![
            user(TaskField::AssigneeId, uid),
            user(TaskField::AssignerId, uid),
        ]))],
        _ => vec![
            params.assignee_id.map(|id| user(TaskField::AssigneeId, id)),
            params.assigner_id.map(|id| user(TaskField::AssignerId, id)),
        ],
    }
}

fn due_date_filter(
    params: &QueryParameters,
    now: DateTime<Utc>,
) -> Result<Option<FilterPredicate>> {
    let at = FieldValue::Timestamp;
    let range = |lower: Option<RangeBound>, upper: Option<RangeBound>| {
        FilterPredicate::compare(TaskField::DueDate, Condition::Range { lower, upper })
    };

    if params.overdue {
        return Ok(Some(range(None, Some(RangeBound::exclusive(at(now))))));
    }

    if let Some(days) = params.due_soon_days {
        let horizon = now
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                DocketError::validation("dueSoonDays", format!("{days} days is too far ahead"))
            })?;
        return Ok(Some(range(
            Some(RangeBound::exclusive(at(now))),
            Some(RangeBound::inclusive(at(horizon))),
        )));
    }

    match (params.date_from, params.date_to) {
        (None, None) => Ok(None),
        (from, to) => Ok(Some(range(
            from.map(|d| RangeBound::inclusive(at(d))),
            to.map(|d| RangeBound::inclusive(at(d))),
        ))),
    }
}

fn search_filter(params: &QueryParameters, config: &QueryConfig) -> Option<FilterPredicate> {
    let needle = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let fields = params
        .search_fields
        .as_deref()
        .filter(|f| !f.is_empty())
        .unwrap_or(config.default_search_fields.as_slice());

    let mut seen = Vec::with_capacity(fields.len());
    for field in fields {
        if !seen.contains(field) {
            seen.push(*field);
        }
    }

    Some(FilterPredicate::Or(
        seen.into_iter()
            .map(|field| {
                let target = match field {
                    SearchField::Title => TaskField::Title,
                    SearchField::Description => TaskField::Description,
                    SearchField::Comments => TaskField::CommentContent,
                };
                FilterPredicate::contains(target, needle)
            })
            .collect(),
    ))
}

fn progress_filter(params: &QueryParameters) -> Option<FilterPredicate> {
    if params.progress_min.is_none() && params.progress_max.is_none() {
        return None;
    }
    let bound = |v: u8| RangeBound::inclusive(FieldValue::Integer(i64::from(v)));
    Some(FilterPredicate::compare(
        TaskField::Progress,
        Condition::Range {
            lower: params.progress_min.map(bound),
            upper: params.progress_max.map(bound),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskType};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
    }

    fn build(params: &QueryParameters, user_id: Option<i64>) -> Vec<FilterPredicate> {
        match build_filter(params, user_id, now(), &QueryConfig::default()).unwrap() {
            FilterPredicate::And(children) => children,
            other => panic!("Expected top-level And, got {other:?}"),
        }
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn due_range(children: &[FilterPredicate]) -> Vec<&Condition> {
        children
            .iter()
            .filter_map(|p| match p {
                FilterPredicate::Compare {
                    field: TaskField::DueDate,
                    condition,
                } => Some(condition),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_parameters_match_all() {
        let filter =
            build_filter(&QueryParameters::default(), Some(1), now(), &QueryConfig::default())
                .unwrap();
        assert!(filter.is_match_all());
    }

    #[test]
    fn test_conjunct_order_is_fixed() {
        let params = QueryParameters::builder()
            .has_attachments(true)
            .search("lease")
            .priority(TaskPriority::High)
            .status(TaskStatus::Pending)
            .task_type(TaskType::Deadline)
            .assignee(4)
            .build();

        let children = build(&params, None);
        assert_eq!(children.len(), 6);
        assert_eq!(
            children[0],
            FilterPredicate::equals(TaskField::Status, text("pending"))
        );
        assert_eq!(
            children[1],
            FilterPredicate::equals(TaskField::Priority, text("high"))
        );
        assert_eq!(
            children[2],
            FilterPredicate::equals(TaskField::Type, text("deadline"))
        );
        assert_eq!(
            children[3],
            FilterPredicate::equals(TaskField::AssigneeId, FieldValue::Integer(4))
        );
        assert!(matches!(children[4], FilterPredicate::Or(_)));
        assert_eq!(
            children[5],
            FilterPredicate::compare(TaskField::Attachments, Condition::NonEmpty)
        );
    }

    #[test]
    fn test_same_input_same_predicate() {
        let params = QueryParameters::builder()
            .search("x")
            .due_soon(3)
            .my_tasks_only()
            .build();
        let a = build_filter(&params, Some(5), now(), &QueryConfig::default()).unwrap();
        let b = build_filter(&params, Some(5), now(), &QueryConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_overdue_wins_over_other_date_criteria() {
        let params = QueryParameters::builder()
            .overdue()
            .due_soon(7)
            .due_between(Some(now() - Duration::days(30)), Some(now()))
            .build();
        let children = build(&params, None);

        let ranges = due_range(&children);
        assert_eq!(ranges.len(), 1);
        assert_eq!(
            ranges[0],
            &Condition::Range {
                lower: None,
                upper: Some(RangeBound::exclusive(FieldValue::Timestamp(now()))),
            }
        );
        assert!(children.contains(&FilterPredicate::compare(
            TaskField::Status,
            Condition::NotIn(vec![text("completed"), text("cancelled")]),
        )));
    }

    #[test]
    fn test_overdue_with_open_status_keeps_both() {
        let params = QueryParameters::builder()
            .status(TaskStatus::Pending)
            .overdue()
            .build();
        let children = build(&params, None);
        assert_eq!(
            children[0],
            FilterPredicate::equals(TaskField::Status, text("pending"))
        );
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn test_overdue_with_closed_status_is_rejected() {
        let params = QueryParameters::builder()
            .status(TaskStatus::Completed)
            .overdue()
            .build();
        let err = build_filter(&params, None, now(), &QueryConfig::default()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_due_soon_wins_over_explicit_range() {
        let params = QueryParameters::builder()
            .due_soon(7)
            .due_between(Some(now() - Duration::days(30)), None)
            .build();
        let children = build(&params, None);
        let ranges = due_range(&children);
        assert_eq!(
            ranges,
            vec![&Condition::Range {
                lower: Some(RangeBound::exclusive(FieldValue::Timestamp(now()))),
                upper: Some(RangeBound::inclusive(FieldValue::Timestamp(
                    now() + Duration::days(7)
                ))),
            }]
        );
    }

    #[test]
    fn test_due_soon_zero_days_matches_nothing() {
        let params = QueryParameters::builder().due_soon(0).build();
        let filter = build_filter(&params, None, now(), &QueryConfig::default()).unwrap();

        let due_now = crate::test_utils::TaskBuilder::new("now").due(now()).build();
        let due_later = crate::test_utils::TaskBuilder::new("later")
            .due(now() + Duration::minutes(1))
            .build();
        assert!(!filter.matches(&due_now));
        assert!(!filter.matches(&due_later));
    }

    #[test]
    fn test_explicit_range_one_sided() {
        let from = now() - Duration::days(2);
        let params = QueryParameters::builder().due_between(Some(from), None).build();
        let children = build(&params, None);
        assert_eq!(
            due_range(&children),
            vec![&Condition::Range {
                lower: Some(RangeBound::inclusive(FieldValue::Timestamp(from))),
                upper: None,
            }]
        );
    }

    #[test]
    fn test_my_tasks_only_replaces_identity_filters() {
        let params = QueryParameters::builder()
            .my_tasks_only()
            .assignee(99)
            .assigner(98)
            .build();
        let children = build(&params, Some(42));

        assert_eq!(
            children,
            vec![FilterPredicate::Or(vec![
                FilterPredicate::equals(TaskField::AssigneeId, FieldValue::Integer(42)),
                FilterPredicate::equals(TaskField::AssignerId, FieldValue::Integer(42)),
            ])]
        );
    }

    #[test]
    fn test_my_tasks_only_without_user_keeps_explicit_filters() {
        let params = QueryParameters::builder()
            .my_tasks_only()
            .assignee(99)
            .build();
        let children = build(&params, None);
        assert_eq!(
            children,
            vec![FilterPredicate::equals(
                TaskField::AssigneeId,
                FieldValue::Integer(99)
            )]
        );
    }

    #[test]
    fn test_search_uses_default_fields() {
        let params = QueryParameters::builder().search("  memo ").build();
        let children = build(&params, None);
        assert_eq!(
            children,
            vec![FilterPredicate::Or(vec![
                FilterPredicate::contains(TaskField::Title, "memo"),
                FilterPredicate::contains(TaskField::Description, "memo"),
            ])]
        );
    }

    #[test]
    fn test_search_with_explicit_fields_deduplicates() {
        let params = QueryParameters::builder()
            .search("memo")
            .search_fields(vec![
                SearchField::Comments,
                SearchField::Title,
                SearchField::Comments,
            ])
            .build();
        let children = build(&params, None);
        assert_eq!(
            children,
            vec![FilterPredicate::Or(vec![
                FilterPredicate::contains(TaskField::CommentContent, "memo"),
                FilterPredicate::contains(TaskField::Title, "memo"),
            ])]
        );
    }

    #[test]
    fn test_blank_search_adds_nothing() {
        let params = QueryParameters::builder().search("   ").build();
        assert!(build(&params, None).is_empty());
    }

    #[test]
    fn test_progress_range() {
        let params = QueryParameters::builder()
            .progress_between(Some(10), None)
            .build();
        assert_eq!(
            build(&params, None),
            vec![FilterPredicate::compare(
                TaskField::Progress,
                Condition::Range {
                    lower: Some(RangeBound::inclusive(FieldValue::Integer(10))),
                    upper: None,
                },
            )]
        );

        let inverted = QueryParameters::builder()
            .progress_between(Some(90), Some(10))
            .build();
        assert!(build_filter(&inverted, None, now(), &QueryConfig::default()).is_err());
    }

    #[test]
    fn test_has_flags_false_add_nothing() {
        let params = QueryParameters::builder()
            .has_attachments(false)
            .has_dependencies(false)
            .build();
        assert!(build(&params, None).is_empty());

        let params = QueryParameters::builder().has_dependencies(true).build();
        assert_eq!(
            build(&params, None),
            vec![FilterPredicate::compare(
                TaskField::Dependencies,
                Condition::NonEmpty
            )]
        );
    }

    #[test]
    fn test_related_entity() {
        let params = QueryParameters::builder().related_entity("case-12").build();
        assert_eq!(
            build(&params, None),
            vec![FilterPredicate::equals(
                TaskField::RelatedEntityId,
                text("case-12")
            )]
        );
    }
}
