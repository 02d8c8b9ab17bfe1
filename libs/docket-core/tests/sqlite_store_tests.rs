//! The SQLite store must return the same tasks, in the same order, as the
//! in-memory store for every query.

#![cfg(feature = "test-utils")]

use chrono::{DateTime, Duration, TimeZone, Utc};
use docket_core::test_utils::{memory_store_with, sample_tasks, sqlite_store_with, TaskBuilder};
use docket_core::{
    DatabaseConfig, QueryConfig, QueryParameters, SqliteTaskStore, Task, TaskQueryService,
    TaskStore, Uuid,
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
}

/// Sample data plus tasks that stress ordering ties, LIKE escaping and
/// non-ASCII case folding
fn fixture() -> Vec<Task> {
    let mut tasks = sample_tasks(now());
    tasks.push(
        TaskBuilder::new("ÉTUDE du dossier Müller")
            .description("Revue des pièces ÉCRITES")
            .comment_text(4, "Déposer au GREFFE avant vendredi")
            .due(now() + Duration::days(5))
            .created_at(now() - Duration::days(6))
            .build(),
    );
    tasks.push(
        TaskBuilder::new("Discount 50% off_fees")
            .description("Billing adjustment")
            .due(now() + Duration::days(2))
            .created_at(now() - Duration::days(3))
            .build(),
    );
    tasks.push(
        TaskBuilder::new("Discount 50 percent")
            .due(now() + Duration::days(2))
            .created_at(now() - Duration::days(3))
            .build(),
    );
    tasks
}

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn ids(items: &[Task]) -> Vec<Uuid> {
    items.iter().map(|t| t.id).collect()
}

const QUERIES: &[&[(&str, &str)]] = &[
    &[],
    &[("status", "pending")],
    &[("priority", "high"), ("sortBy", "title"), ("sortOrder", "asc")],
    &[("category", "case"), ("type", "deadline")],
    &[("relatedEntityId", "client-77")],
    &[("assigneeId", "2")],
    &[("assigneeId", "2"), ("assignerId", "1")],
    &[("myTasksOnly", "true")],
    &[("overdue", "true"), ("sortBy", "dueDate"), ("sortOrder", "asc")],
    &[("dueSoonDays", "7"), ("sortBy", "dueDate")],
    &[("dueSoonDays", "0")],
    &[("dateFrom", "2024-09-01"), ("dateTo", "2024-09-10")],
    &[("dateTo", "2024-09-02T10:00:00Z"), ("sortBy", "dueDate"), ("sortOrder", "asc")],
    &[("search", "contract")],
    &[("search", "CONTRACT"), ("searchFields", "comments")],
    &[("search", "witness"), ("searchFields", "title,description,comments")],
    &[("search", "50%")],
    &[("search", "off_fees")],
    &[("search", "عقد")],
    &[("search", "étude")],
    &[("search", "MÜLLER"), ("searchFields", "title")],
    &[("search", "écrites")],
    &[("search", "greffe"), ("searchFields", "comments")],
    &[("dateFrom", "2024-09-04T10:00:00.000500Z")],
    &[("dateFrom", "2024-09-04T09:59:59.999500Z"), ("dateTo", "2024-09-04T10:00:00.000500Z")],
    &[("dateTo", "2024-09-04T09:59:59.999500Z"), ("sortBy", "dueDate")],
    &[("hasAttachments", "true")],
    &[("hasDependencies", "true")],
    &[("progressMin", "10"), ("progressMax", "80"), ("sortBy", "progress")],
    &[("sortBy", "priority"), ("sortOrder", "asc")],
    &[("sortBy", "status"), ("sortOrder", "desc")],
    &[("sortBy", "dueDate"), ("sortOrder", "desc")],
    &[("sortBy", "updatedAt"), ("limit", "3"), ("page", "2")],
    &[("sortBy", "dueDate"), ("sortOrder", "asc"), ("limit", "4"), ("page", "3")],
    &[("page", "50")],
];

// ===========================
// Parity with the in-memory store
// ===========================

#[tokio::test]
async fn test_sqlite_matches_memory_for_every_query() {
    let tasks = fixture();
    let memory = TaskQueryService::new(
        Arc::new(memory_store_with(tasks.clone())),
        QueryConfig::default(),
    );
    let sqlite = TaskQueryService::new(
        Arc::new(sqlite_store_with(&tasks).await.unwrap()),
        QueryConfig::default(),
    );

    for pairs in QUERIES {
        let params = QueryParameters::from_query_map(&query(pairs)).unwrap();
        let expected = memory.execute_at(&params, Some(1), now()).await.unwrap();
        let actual = sqlite.execute_at(&params, Some(1), now()).await.unwrap();

        assert_eq!(actual.total, expected.total, "total for {pairs:?}");
        assert_eq!(actual.pages, expected.pages, "pages for {pairs:?}");
        assert_eq!(ids(&actual.items), ids(&expected.items), "order for {pairs:?}");
    }
}

#[tokio::test]
async fn test_sqlite_round_trips_full_tasks() {
    let tasks = fixture();
    let memory = TaskQueryService::new(
        Arc::new(memory_store_with(tasks.clone())),
        QueryConfig::default(),
    );
    let sqlite = TaskQueryService::new(
        Arc::new(sqlite_store_with(&tasks).await.unwrap()),
        QueryConfig::default(),
    );
    let params = QueryParameters::builder().limit(100).build();

    let expected = memory.execute_at(&params, None, now()).await.unwrap();
    let actual = sqlite.execute_at(&params, None, now()).await.unwrap();
    assert_eq!(actual, expected);
}

// ===========================
// Sub-millisecond bounds
// ===========================

#[tokio::test]
async fn test_sub_millisecond_bounds_match_memory() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let tasks = vec![TaskBuilder::new("Due on the second").due(base).build()];
    let sqlite = TaskQueryService::new(
        Arc::new(sqlite_store_with(&tasks).await.unwrap()),
        QueryConfig::default(),
    );
    let later = base + Duration::microseconds(500);

    let params = QueryParameters::builder()
        .due_between(Some(later), None)
        .build();
    let result = sqlite.execute_at(&params, None, now()).await.unwrap();
    assert_eq!(result.total, 0);

    let params = QueryParameters::builder().overdue().build();
    let result = sqlite.execute_at(&params, None, later).await.unwrap();
    assert_eq!(result.total, 1);
}

// ===========================
// Case folding
// ===========================

#[tokio::test]
async fn test_search_folds_accented_capitals() {
    let sqlite = TaskQueryService::new(
        Arc::new(sqlite_store_with(&fixture()).await.unwrap()),
        QueryConfig::default(),
    );

    let result = sqlite
        .execute_raw(&query(&[("search", "étude")]), None)
        .await
        .unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].title, "ÉTUDE du dossier Müller");
}

// ===========================
// LIKE escaping
// ===========================

#[tokio::test]
async fn test_wildcards_are_literal() {
    let sqlite = TaskQueryService::new(
        Arc::new(sqlite_store_with(&fixture()).await.unwrap()),
        QueryConfig::default(),
    );

    let percent = sqlite
        .execute_raw(&query(&[("search", "50%")]), None)
        .await
        .unwrap();
    assert_eq!(percent.total, 1);
    assert_eq!(percent.items[0].title, "Discount 50% off_fees");

    let underscore = sqlite
        .execute_raw(&query(&[("search", "off_")]), None)
        .await
        .unwrap();
    assert_eq!(underscore.total, 1);
}

// ===========================
// File-backed database
// ===========================

#[tokio::test]
async fn test_file_database_persists_between_connections() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("firm.db"),
        ..DatabaseConfig::default()
    };
    let tasks = sample_tasks(now());

    {
        let store = SqliteTaskStore::connect(&config).await.unwrap();
        for task in &tasks {
            store.insert(task).await.unwrap();
        }
        store.pool().close().await;
    }

    let reopened = SqliteTaskStore::connect(&config).await.unwrap();
    let service = TaskQueryService::new(Arc::new(reopened), QueryConfig::default());
    let params = QueryParameters::builder().overdue().build();
    let result = service.execute_at(&params, None, now()).await.unwrap();

    assert_eq!(result.total, 2);
    assert!(result.items.iter().all(|t| !t.status.is_closed()));
}
