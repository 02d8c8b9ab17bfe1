//! Tests for CLI command paths against a real SQLite file

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use clap::Parser;
use docket_cli::server::router;
use docket_cli::{init_database, run_query, Cli, Commands};
use docket_core::{QueryConfig, SqliteTaskStore, TaskQueryService};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

#[test]
fn test_core_command_parsing() {
    let test_cases = vec![
        vec!["docket", "init"],
        vec!["docket", "init", "--demo"],
        vec!["docket", "query"],
        vec!["docket", "query", "overdue=true", "sortBy=dueDate"],
        vec!["docket", "query", "myTasksOnly=true", "--user-id", "2"],
        vec!["docket", "serve"],
        vec!["docket", "serve", "--host", "0.0.0.0", "--port", "9090"],
        vec!["docket", "--verbose", "--json-logs", "query"],
    ];

    for args in test_cases {
        let cli = Cli::try_parse_from(args.clone());
        assert!(cli.is_ok(), "Failed to parse: {:?}", args);
    }
}

#[test]
fn test_query_without_subcommand_fails() {
    assert!(Cli::try_parse_from(["docket"]).is_err());
    assert!(Cli::try_parse_from(["docket", "query", "--user-id", "me"]).is_err());
}

#[tokio::test]
async fn test_init_then_query_from_a_new_connection() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("firm.db");
    let cli = Cli::try_parse_from([
        "docket",
        "--database",
        db_path.to_str().unwrap(),
        "init",
        "--demo",
    ])
    .unwrap();
    assert_eq!(cli.command, Commands::Init { demo: true });

    let mut config = QueryConfig::default();
    config.database.path.clone_from(&db_path);
    init_database(&config, true).await.unwrap().pool().close().await;

    let store = SqliteTaskStore::connect(&config.database).await.unwrap();
    let service = TaskQueryService::new(Arc::new(store), config);
    let params = vec![
        ("myTasksOnly".to_string(), "true".to_string()),
        ("sortBy".to_string(), "dueDate".to_string()),
        ("sortOrder".to_string(), "asc".to_string()),
    ];
    let (rendered, ok) = run_query(&service, &params, Some(2), false).await.unwrap();

    assert!(ok);
    let value: Value = serde_json::from_str(&rendered).unwrap();
    let items = value["data"]["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items
        .iter()
        .all(|t| t["assigneeId"] == 2 || t["assignerId"] == 2));
}

#[tokio::test]
async fn test_router_serves_sqlite_store() {
    let store = SqliteTaskStore::in_memory().await.unwrap();
    let app = router(TaskQueryService::new(Arc::new(store), QueryConfig::default()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tasks?search=%C3%A9tude")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["pagination"]["total"], 0);
}
