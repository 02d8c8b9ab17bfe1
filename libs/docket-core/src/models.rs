//! Data models for practice-management tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task lifecycle status, including the approval workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    AwaitingApproval,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::InProgress,
        Self::AwaitingApproval,
        Self::Approved,
        Self::Rejected,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Statuses that end a task's lifecycle; such tasks are never overdue
    pub const CLOSED: [Self; 2] = [Self::Completed, Self::Cancelled];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn is_closed(self) -> bool {
        Self::CLOSED.contains(&self)
    }
}

/// Task priority, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Sort rank used by every store
    #[must_use]
    pub const fn rank(self) -> i64 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Urgent => 3,
        }
    }
}

/// Practice area a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Case,
    Session,
    Client,
    Consultation,
    Financial,
    Administrative,
    Hr,
    Other,
}

impl TaskCategory {
    pub const ALL: [Self; 8] = [
        Self::Case,
        Self::Session,
        Self::Client,
        Self::Consultation,
        Self::Financial,
        Self::Administrative,
        Self::Hr,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Session => "session",
            Self::Client => "client",
            Self::Consultation => "consultation",
            Self::Financial => "financial",
            Self::Administrative => "administrative",
            Self::Hr => "hr",
            Self::Other => "other",
        }
    }
}

/// Kind of work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Task,
    Approval,
    Reminder,
    FollowUp,
    Deadline,
}

impl TaskType {
    pub const ALL: [Self; 5] = [
        Self::Task,
        Self::Approval,
        Self::Reminder,
        Self::FollowUp,
        Self::Deadline,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Approval => "approval",
            Self::Reminder => "reminder",
            Self::FollowUp => "follow_up",
            Self::Deadline => "deadline",
        }
    }
}

macro_rules! impl_wire_name {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
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

impl_wire_name!(TaskStatus, TaskPriority, TaskCategory, TaskType);

/// A comment left on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A file attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAttachment {
    pub name: String,
    pub url: String,
}

/// Main task entity as seen by the query engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Linked parent record (case, client, session, ...)
    pub related_entity_id: Option<String>,
    /// User the task is assigned to
    pub assignee_id: Option<i64>,
    /// User who assigned the task
    pub assigner_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    /// Completion percentage, 0 to 100
    pub progress: u8,
    pub comments: Vec<TaskComment>,
    pub attachments: Vec<TaskAttachment>,
    /// Ids of tasks this one depends on
    pub dependencies: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
