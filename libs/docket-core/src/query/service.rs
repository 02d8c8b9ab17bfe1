//! Query orchestration: filter, sort, then fetch a page and count in parallel

use super::builder::build_filter;
use super::params::QueryParameters;
use super::result::QueryResult;
use super::sort::resolve_sort;
use crate::config::QueryConfig;
use crate::error::{DocketError, Result};
use crate::models::Task;
use crate::store::TaskStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Runs task list queries against a [`TaskStore`]
pub struct TaskQueryService<S: TaskStore> {
    store: Arc<S>,
    config: QueryConfig,
}

impl<S: TaskStore> Clone for TaskQueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: TaskStore> std::fmt::Debug for TaskQueryService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueryService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: TaskStore> TaskQueryService<S> {
    #[must_use]
    pub const fn new(store: Arc<S>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a query relative to the current instant
    ///
    /// # Errors
    /// Returns `DocketError::Validation` for bad parameters and
    /// `DocketError::Store` if either store read fails or times out
    pub async fn execute(
        &self,
        params: &QueryParameters,
        user_id: Option<i64>,
    ) -> Result<QueryResult<Task>> {
        self.execute_at(params, user_id, Utc::now()).await
    }

    /// Parse a raw query-string map, then run it
    ///
    /// # Errors
    /// Same as [`Self::execute`], plus parse failures as
    /// `DocketError::Validation`
    pub async fn execute_raw(
        &self,
        query: &HashMap<String, String>,
        user_id: Option<i64>,
    ) -> Result<QueryResult<Task>> {
        let params = QueryParameters::from_query_map(query)?;
        self.execute(&params, user_id).await
    }

    /// Run a query with `now` fixed by the caller
    ///
    /// # Errors
    /// Same as [`Self::execute`]
    #[instrument(skip(self, params), fields(page = params.page, sort = %params.sort_field))]
    pub async fn execute_at(
        &self,
        params: &QueryParameters,
        user_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<QueryResult<Task>> {
        let started = Instant::now();

        let filter = build_filter(params, user_id, now, &self.config).map_err(|e| {
            debug!(error = %e, "Rejected task query");
            e
        })?;
        let sort = resolve_sort(params, &self.config);
        debug!(%filter, skip = sort.skip, limit = sort.limit, "Executing task query");

        let timeout = self.config.store_timeout();
        let (items, total) = tokio::try_join!(
            bounded("find", timeout, self.store.find(&filter, &sort)),
            bounded("count", timeout, self.store.count(&filter)),
        )?;

        let result = QueryResult::new(items, total, &sort);
        info!(
            total = result.total,
            returned = result.items.len(),
            pages = result.pages,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Task query completed"
        );
        Ok(result)
    }
}

async fn bounded<T>(
    operation: &'static str,
    timeout: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(operation, error = %e, "Task store read failed");
            Err(match e {
                DocketError::Store { .. } => e,
                other => DocketError::store(other.to_string()),
            })
        }
        Err(_) => {
            warn!(operation, timeout_secs = timeout.as_secs(), "Task store read timed out");
            Err(DocketError::store(format!(
                "{operation} timed out after {}s",
                timeout.as_secs()
            )))
        }
    }
}
