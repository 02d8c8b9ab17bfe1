//! SQLite task store built on sqlx

use super::mappers::{map_attachment_row, map_comment_row, map_dependency_row, map_task_row};
use super::sql_filter::{order_by, SqlFilter, SqlParam};
use super::TaskStore;
use crate::config::DatabaseConfig;
use crate::error::{DocketError, Result};
use crate::models::Task;
use crate::query::{FilterPredicate, SortSpec};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::query::Query;
use sqlx::{Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SCHEMA: [&str; 8] = [
    r"CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        title_folded TEXT NOT NULL,
        description TEXT,
        description_folded TEXT,
        status TEXT NOT NULL,
        priority TEXT NOT NULL,
        category TEXT NOT NULL,
        type TEXT NOT NULL,
        related_entity_id TEXT,
        related_entity_id_folded TEXT,
        assignee_id INTEGER,
        assigner_id INTEGER,
        due_date INTEGER,
        progress INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS task_comments (
        task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        author_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        content_folded TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        PRIMARY KEY (task_id, position)
    )",
    r"CREATE TABLE IF NOT EXISTS task_attachments (
        task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        PRIMARY KEY (task_id, position)
    )",
    r"CREATE TABLE IF NOT EXISTS task_dependencies (
        task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        depends_on TEXT NOT NULL,
        PRIMARY KEY (task_id, position)
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assignee_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_assigner ON tasks(assigner_id)",
];

const TASK_COLUMNS: &str = "id, title, description, status, priority, category, type, \
     related_entity_id, assignee_id, assigner_id, due_date, progress, created_at, updated_at";

/// Unicode-lowercased copies of the searchable text, matched by `LIKE`
const FOLDED_COLUMNS: &str = "title_folded, description_folded, related_entity_id_folded";

fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Task store backed by a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Open (creating if missing) the database file named in `config` and
    /// make sure the schema exists
    ///
    /// # Errors
    /// Returns `DocketError::Store` if the database cannot be opened or
    /// the schema cannot be created
    #[instrument(skip(config), fields(path = %config.path.display()))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| DocketError::store(format!("Failed to open task database: {e}")))?;

        info!(
            max_connections = config.max_connections,
            "Task database connection pool established"
        );

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Private in-memory database with the schema applied
    ///
    /// The pool holds a single connection that is never recycled, since
    /// every SQLite in-memory connection is a separate database.
    ///
    /// # Errors
    /// Returns `DocketError::Store` if SQLite cannot be initialized
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool without touching the schema
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    ///
    /// # Errors
    /// Returns `DocketError::Store` if a statement fails
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Task schema ready");
        Ok(())
    }

    async fn load_collections(&self, tasks: &mut [Task]) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = tasks.iter().map(|t| t.id.to_string()).collect();
        let marks = vec!["?"; ids.len()].join(", ");
        let index: HashMap<String, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let sql = format!(
            "SELECT task_id, author_id, content, created_at FROM task_comments \
             WHERE task_id IN ({marks}) ORDER BY task_id, position"
        );
        for row in bind_ids(sqlx::query(&sql), &ids).fetch_all(&self.pool).await? {
            let (task_id, comment) = map_comment_row(&row)?;
            if let Some(&i) = index.get(&task_id) {
                tasks[i].comments.push(comment);
            }
        }

        let sql = format!(
            "SELECT task_id, name, url FROM task_attachments \
             WHERE task_id IN ({marks}) ORDER BY task_id, position"
        );
        for row in bind_ids(sqlx::query(&sql), &ids).fetch_all(&self.pool).await? {
            let (task_id, attachment) = map_attachment_row(&row)?;
            if let Some(&i) = index.get(&task_id) {
                tasks[i].attachments.push(attachment);
            }
        }

        let sql = format!(
            "SELECT task_id, depends_on FROM task_dependencies \
             WHERE task_id IN ({marks}) ORDER BY task_id, position"
        );
        for row in bind_ids(sqlx::query(&sql), &ids).fetch_all(&self.pool).await? {
            let (task_id, dependency) = map_dependency_row(&row)?;
            if let Some(&i) = index.get(&task_id) {
                tasks[i].dependencies.push(dependency);
            }
        }

        Ok(())
    }
}

fn bind_ids<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ids: &'q [String],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for id in ids {
        query = query.bind(id.as_str());
    }
    query
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlParam],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s.as_str()),
            SqlParam::Integer(i) => query.bind(*i),
        };
    }
    query
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    #[instrument(skip(self, filter))]
    async fn find(&self, filter: &FilterPredicate, sort: &SortSpec) -> Result<Vec<Task>> {
        let where_clause = SqlFilter::from_predicate(filter);
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            where_clause.clause,
            order_by(sort)
        );
        debug!(%sql, params = where_clause.params.len(), "Fetching task page");

        let rows = bind_params(sqlx::query(&sql), &where_clause.params)
            .bind(to_i64(sort.limit))
            .bind(to_i64(sort.skip))
            .fetch_all(&self.pool)
            .await?;

        let mut tasks = rows
            .iter()
            .map(map_task_row)
            .collect::<Result<Vec<_>>>()?;
        self.load_collections(&mut tasks).await?;
        Ok(tasks)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &FilterPredicate) -> Result<u64> {
        let where_clause = SqlFilter::from_predicate(filter);
        let sql = format!(
            "SELECT COUNT(*) AS total FROM tasks WHERE {}",
            where_clause.clause
        );

        let row = bind_params(sqlx::query(&sql), &where_clause.params)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        u64::try_from(total).map_err(|_| DocketError::store(format!("negative count {total}")))
    }

    #[instrument(skip(self, task), fields(id = %task.id))]
    async fn insert(&self, task: &Task) -> Result<()> {
        let id = task.id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}, {FOLDED_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&id)
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.category.as_str())
        .bind(task.task_type.as_str())
        .bind(task.related_entity_id.as_deref())
        .bind(task.assignee_id)
        .bind(task.assigner_id)
        .bind(task.due_date.map(|d| d.timestamp_millis()))
        .bind(i64::from(task.progress))
        .bind(task.created_at.timestamp_millis())
        .bind(task.updated_at.timestamp_millis())
        .bind(fold(&task.title))
        .bind(task.description.as_deref().map(fold))
        .bind(task.related_entity_id.as_deref().map(fold))
        .execute(&mut *tx)
        .await?;

        for (position, comment) in (0_i64..).zip(&task.comments) {
            sqlx::query(
                "INSERT INTO task_comments \
                 (task_id, position, author_id, content, content_folded, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(position)
            .bind(comment.author_id)
            .bind(&comment.content)
            .bind(fold(&comment.content))
            .bind(comment.created_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }

        for (position, attachment) in (0_i64..).zip(&task.attachments) {
            sqlx::query(
                "INSERT INTO task_attachments (task_id, position, name, url) VALUES (?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(position)
            .bind(&attachment.name)
            .bind(&attachment.url)
            .execute(&mut *tx)
            .await?;
        }

        for (position, dependency) in (0_i64..).zip(&task.dependencies) {
            sqlx::query(
                "INSERT INTO task_dependencies (task_id, position, depends_on) VALUES (?, ?, ?)",
            )
            .bind(&id)
            .bind(position)
            .bind(dependency.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Task inserted");
        Ok(())
    }
}
