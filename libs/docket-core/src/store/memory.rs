//! In-process task store

use super::TaskStore;
use crate::error::{DocketError, Result};
use crate::models::Task;
use crate::query::{FilterPredicate, SortSpec};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument};

/// Task store backed by a vector behind a read/write lock
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    #[instrument(skip(self, filter))]
    async fn find(&self, filter: &FilterPredicate, sort: &SortSpec) -> Result<Vec<Task>> {
        let mut matching: Vec<Task> = self
            .tasks
            .read()
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let skip = usize::try_from(sort.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(sort.limit).unwrap_or(usize::MAX);
        let page: Vec<Task> = matching.into_iter().skip(skip).take(limit).collect();

        debug!(returned = page.len(), "Memory store page fetched");
        Ok(page)
    }

    async fn count(&self, filter: &FilterPredicate) -> Result<u64> {
        let count = self.tasks.read().iter().filter(|t| filter.matches(t)).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn insert(&self, task: &Task) -> Result<()> {
        let mut tasks = self.tasks.write();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(DocketError::store(format!("task {} already exists", task.id)));
        }
        tasks.push(task.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FieldValue, SortDirection, SortField, TaskField};
    use crate::test_utils::TaskBuilder;

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = MemoryTaskStore::new();
        assert!(store.is_empty());

        store.insert(&TaskBuilder::new("One").build()).await.unwrap();
        store.insert(&TaskBuilder::new("Two").build()).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.count(&FilterPredicate::match_all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = MemoryTaskStore::new();
        let task = TaskBuilder::new("Once").build();
        store.insert(&task).await.unwrap();

        let err = store.insert(&task).await.unwrap_err();
        assert!(matches!(err, DocketError::Store { .. }));
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_pages() {
        let tasks: Vec<Task> = ["d", "a", "c", "b", "e"]
            .iter()
            .map(|t| TaskBuilder::new(t).assignee(1).build())
            .chain(std::iter::once(TaskBuilder::new("z").assignee(2).build()))
            .collect();
        let store = MemoryTaskStore::with_tasks(tasks);

        let filter = FilterPredicate::equals(TaskField::AssigneeId, FieldValue::Integer(1));
        let sort = SortSpec {
            field: SortField::Title,
            direction: SortDirection::Ascending,
            page: 2,
            limit: 2,
            skip: 2,
        };

        let page = store.find(&filter, &sort).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "d"]);
        assert_eq!(store.count(&filter).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_skip_past_end_is_empty() {
        let store = MemoryTaskStore::with_tasks(vec![TaskBuilder::new("only").build()]);
        let sort = SortSpec {
            page: 9,
            skip: 160,
            ..SortSpec::default()
        };
        assert!(store
            .find(&FilterPredicate::match_all(), &sort)
            .await
            .unwrap()
            .is_empty());
    }
}
