//! Row mapping between SQLite rows and task models

use crate::error::{DocketError, Result};
use crate::models::{Task, TaskAttachment, TaskComment};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DocketError::store(format!("timestamp {ms} is out of range")))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| DocketError::store(format!("invalid task id '{raw}': {e}")))
}

fn parse_column<T: FromStr<Err = String>>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| DocketError::store(format!("invalid {column} in task row: {e}")))
}

/// Map a `tasks` row; collections are filled in separately
pub(crate) fn map_task_row(row: &SqliteRow) -> Result<Task> {
    let id: String = row.try_get("id")?;
    let progress: i64 = row.try_get("progress")?;

    Ok(Task {
        id: parse_uuid(&id)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: parse_column(row, "status")?,
        priority: parse_column(row, "priority")?,
        category: parse_column(row, "category")?,
        task_type: parse_column(row, "type")?,
        related_entity_id: row.try_get("related_entity_id")?,
        assignee_id: row.try_get("assignee_id")?,
        assigner_id: row.try_get("assigner_id")?,
        due_date: row
            .try_get::<Option<i64>, _>("due_date")?
            .map(millis_to_datetime)
            .transpose()?,
        progress: u8::try_from(progress)
            .map_err(|_| DocketError::store(format!("progress {progress} out of range")))?,
        comments: Vec::new(),
        attachments: Vec::new(),
        dependencies: Vec::new(),
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?)?,
    })
}

pub(crate) fn map_comment_row(row: &SqliteRow) -> Result<(String, TaskComment)> {
    Ok((
        row.try_get("task_id")?,
        TaskComment {
            author_id: row.try_get("author_id")?,
            content: row.try_get("content")?,
            created_at: millis_to_datetime(row.try_get("created_at")?)?,
        },
    ))
}

pub(crate) fn map_attachment_row(row: &SqliteRow) -> Result<(String, TaskAttachment)> {
    Ok((
        row.try_get("task_id")?,
        TaskAttachment {
            name: row.try_get("name")?,
            url: row.try_get("url")?,
        },
    ))
}

pub(crate) fn map_dependency_row(row: &SqliteRow) -> Result<(String, Uuid)> {
    let depends_on: String = row.try_get("depends_on")?;
    Ok((row.try_get("task_id")?, parse_uuid(&depends_on)?))
}
