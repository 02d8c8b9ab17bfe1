//! Test utilities and fixture data for the query engine

use crate::error::Result;
use crate::models::{
    Task, TaskAttachment, TaskCategory, TaskComment, TaskPriority, TaskStatus, TaskType,
};
use crate::store::{MemoryTaskStore, SqliteTaskStore, TaskStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

/// Instant every builder timestamp defaults to
#[must_use]
pub fn fixture_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Fluent builder for [`Task`] fixtures
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    #[must_use]
    pub fn new(title: &str) -> Self {
        let epoch = fixture_epoch();
        Self {
            task: Task {
                id: Uuid::new_v4(),
                title: title.to_string(),
                description: None,
                status: TaskStatus::Pending,
                priority: TaskPriority::Medium,
                category: TaskCategory::Other,
                task_type: TaskType::Task,
                related_entity_id: None,
                assignee_id: None,
                assigner_id: None,
                due_date: None,
                progress: 0,
                comments: Vec::new(),
                attachments: Vec::new(),
                dependencies: Vec::new(),
                created_at: epoch,
                updated_at: epoch,
            },
        }
    }

    #[must_use]
    pub const fn id(mut self, id: Uuid) -> Self {
        self.task.id = id;
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.task.description = Some(description.to_string());
        self
    }

    #[must_use]
    pub const fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: TaskPriority) -> Self {
        self.task.priority = priority;
        self
    }

    #[must_use]
    pub const fn category(mut self, category: TaskCategory) -> Self {
        self.task.category = category;
        self
    }

    #[must_use]
    pub const fn task_type(mut self, task_type: TaskType) -> Self {
        self.task.task_type = task_type;
        self
    }

    #[must_use]
    pub fn related_entity(mut self, id: &str) -> Self {
        self.task.related_entity_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub const fn assignee(mut self, user_id: i64) -> Self {
        self.task.assignee_id = Some(user_id);
        self
    }

    #[must_use]
    pub const fn assigner(mut self, user_id: i64) -> Self {
        self.task.assigner_id = Some(user_id);
        self
    }

    #[must_use]
    pub const fn due(mut self, due: DateTime<Utc>) -> Self {
        self.task.due_date = Some(due);
        self
    }

    #[must_use]
    pub const fn progress(mut self, progress: u8) -> Self {
        self.task.progress = progress;
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: TaskComment) -> Self {
        self.task.comments.push(comment);
        self
    }

    /// Add a comment authored by `author_id` at the fixture epoch
    #[must_use]
    pub fn comment_text(self, author_id: i64, content: &str) -> Self {
        self.comment(TaskComment {
            author_id,
            content: content.to_string(),
            created_at: fixture_epoch(),
        })
    }

    #[must_use]
    pub fn attachment(mut self, name: &str) -> Self {
        self.task.attachments.push(TaskAttachment {
            name: name.to_string(),
            url: format!("https://files.example.com/{name}"),
        });
        self
    }

    #[must_use]
    pub fn dependency(mut self, id: Uuid) -> Self {
        self.task.dependencies.push(id);
        self
    }

    #[must_use]
    pub const fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.task.created_at = at;
        self.task.updated_at = at;
        self
    }

    #[must_use]
    pub const fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.task.updated_at = at;
        self
    }

    #[must_use]
    pub fn build(self) -> Task {
        self.task
    }
}

/// A small firm's task list, with due dates relative to `now`
///
/// Users 1 (partner), 2 (associate) and 3 (paralegal) assign work to each
/// other; several tasks are overdue, due this week, closed, or carry
/// comments, attachments and dependencies.
#[must_use]
pub fn sample_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let hearing_prep = TaskBuilder::new("Prepare hearing bundle")
        .description("Collect exhibits for the appeal hearing")
        .status(TaskStatus::InProgress)
        .priority(TaskPriority::Urgent)
        .category(TaskCategory::Session)
        .task_type(TaskType::Deadline)
        .related_entity("case-1042")
        .assignee(2)
        .assigner(1)
        .due(now + Duration::days(2))
        .progress(60)
        .comment_text(1, "Include the expert report")
        .attachment("exhibit-list.pdf")
        .created_at(now - Duration::days(10))
        .build();

    let hearing_id = hearing_prep.id;

    vec![
        hearing_prep,
        TaskBuilder::new("File statement of defence")
            .description("Deadline set by the commercial court")
            .priority(TaskPriority::Urgent)
            .category(TaskCategory::Case)
            .task_type(TaskType::Deadline)
            .related_entity("case-1042")
            .assignee(2)
            .assigner(1)
            .due(now - Duration::days(1))
            .progress(80)
            .created_at(now - Duration::days(20))
            .build(),
        TaskBuilder::new("Approve retainer agreement")
            .status(TaskStatus::AwaitingApproval)
            .priority(TaskPriority::High)
            .category(TaskCategory::Client)
            .task_type(TaskType::Approval)
            .related_entity("client-77")
            .assignee(1)
            .assigner(3)
            .due(now + Duration::days(5))
            .attachment("retainer-draft.docx")
            .created_at(now - Duration::days(3))
            .build(),
        TaskBuilder::new("Send invoice reminder")
            .description("Second reminder for the March invoice")
            .status(TaskStatus::Completed)
            .priority(TaskPriority::Low)
            .category(TaskCategory::Financial)
            .task_type(TaskType::Reminder)
            .related_entity("client-77")
            .assignee(3)
            .assigner(1)
            .due(now - Duration::days(4))
            .progress(100)
            .created_at(now - Duration::days(15))
            .build(),
        TaskBuilder::new("Follow up with witness")
            .status(TaskStatus::Pending)
            .priority(TaskPriority::Medium)
            .category(TaskCategory::Case)
            .task_type(TaskType::FollowUp)
            .related_entity("case-1042")
            .assignee(3)
            .assigner(2)
            .due(now - Duration::hours(6))
            .comment_text(2, "Witness asked to reschedule")
            .comment_text(3, "Left a voicemail")
            .dependency(hearing_id)
            .created_at(now - Duration::days(7))
            .build(),
        TaskBuilder::new("Consultation notes")
            .description("Summarize the tenancy consultation")
            .status(TaskStatus::Cancelled)
            .priority(TaskPriority::Low)
            .category(TaskCategory::Consultation)
            .assignee(2)
            .due(now - Duration::days(2))
            .created_at(now - Duration::days(12))
            .build(),
        TaskBuilder::new("Quarterly payroll review")
            .status(TaskStatus::Approved)
            .priority(TaskPriority::Medium)
            .category(TaskCategory::Hr)
            .task_type(TaskType::Approval)
            .assignee(1)
            .due(now + Duration::days(20))
            .progress(30)
            .created_at(now - Duration::days(1))
            .build(),
        TaskBuilder::new("Renew office lease")
            .description("Landlord sent the renewal contract")
            .status(TaskStatus::Rejected)
            .priority(TaskPriority::High)
            .category(TaskCategory::Administrative)
            .assignee(3)
            .assigner(1)
            .comment_text(1, "Negotiate the CONTRACT term first")
            .created_at(now - Duration::days(30))
            .build(),
        TaskBuilder::new("مراجعة عقد الموكل")
            .description("مراجعة البنود قبل التوقيع")
            .status(TaskStatus::Pending)
            .priority(TaskPriority::High)
            .category(TaskCategory::Client)
            .related_entity("client-12")
            .assignee(2)
            .assigner(1)
            .due(now + Duration::hours(12))
            .progress(10)
            .created_at(now - Duration::days(2))
            .build(),
        TaskBuilder::new("Archive closed case files")
            .status(TaskStatus::Pending)
            .priority(TaskPriority::Low)
            .category(TaskCategory::Other)
            .created_at(now - Duration::days(40))
            .build(),
    ]
}

/// In-memory store preloaded with `tasks`
#[must_use]
pub fn memory_store_with(tasks: Vec<Task>) -> MemoryTaskStore {
    MemoryTaskStore::with_tasks(tasks)
}

/// Private in-memory SQLite store preloaded with `tasks`
///
/// # Errors
/// Returns `DocketError::Store` if SQLite cannot be initialized or a task
/// cannot be inserted
pub async fn sqlite_store_with(tasks: &[Task]) -> Result<SqliteTaskStore> {
    let store = SqliteTaskStore::in_memory().await?;
    for task in tasks {
        store.insert(task).await?;
    }
    Ok(store)
}
