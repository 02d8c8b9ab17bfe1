//! HTTP endpoint for task list queries
//!
//! `GET /api/tasks` maps the query string onto [`QueryParameters`] and the
//! `x-user-id` header onto the requesting user, then answers with the
//! standard response envelope.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use docket_common::USER_ID_HEADER;
use docket_core::{
    ApiResponse, DocketError, FilterPredicate, Task, TaskQueryService, TaskStore,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

/// Health response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    /// Number of stored tasks, absent when the store is unreachable
    pub tasks: Option<u64>,
}

/// Build the application router over any task store
pub fn router<S>(service: TaskQueryService<S>) -> Router
where
    S: TaskStore + 'static,
{
    Router::new()
        .route("/api/tasks", get(list_tasks::<S>))
        .route("/health", get(health_check::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Bind `host:port` and serve until Ctrl-C
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails
#[instrument(skip(service))]
pub async fn serve<S>(service: TaskQueryService<S>, host: &str, port: u16) -> std::io::Result<()>
where
    S: TaskStore + 'static,
{
    let listener = TcpListener::bind((host, port)).await?;
    info!("Task query server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
}

async fn list_tasks<S>(
    State(service): State<TaskQueryService<S>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<ApiResponse<Task>>)
where
    S: TaskStore + 'static,
{
    let result = match requesting_user(&headers) {
        Ok(user_id) => service.execute_raw(&query, user_id).await,
        Err(e) => Err(e),
    };

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    };
    (status, Json(ApiResponse::from(result)))
}

async fn health_check<S>(
    State(service): State<TaskQueryService<S>>,
) -> (StatusCode, Json<HealthResponse>)
where
    S: TaskStore + 'static,
{
    let (status, tasks) = match service.store().count(&FilterPredicate::match_all()).await {
        Ok(total) => (StatusCode::OK, Some(total)),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, None)
        }
    };

    let response = HealthResponse {
        status: if tasks.is_some() { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        tasks,
    };
    (status, Json(response))
}

/// The requesting user, or `None` when the header is absent or blank
fn requesting_user(headers: &HeaderMap) -> Result<Option<i64>, DocketError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| DocketError::validation(USER_ID_HEADER, "header is not valid text"))?
        .trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>().map(Some).map_err(|_| {
        DocketError::validation(USER_ID_HEADER, format!("expected an integer, got '{raw}'"))
    })
}
