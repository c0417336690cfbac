//! Task service - cached task list with server-confirmed mutations
//!
//! Every mutation is one request; the in-memory list only changes after the
//! server answered, using the representation it returned.

use std::sync::Arc;

use crate::adapters::api_client::ApiClient;
use crate::domain::result::{Error, Result};
use crate::domain::{NewTask, Task, TaskPriority, TaskStats, TaskStatus, TaskUpdate};
use crate::services::TaskFilter;

/// Task list view-model
pub struct TaskService {
    api: Arc<ApiClient>,
    tasks: Vec<Task>,
    filter: TaskFilter,
    last_error: Option<String>,
}

impl TaskService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            last_error: None,
        }
    }

    /// Cached list, newest first as delivered by the server
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    /// Cached tasks matching the current filter
    pub fn visible(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    /// Message of the most recent failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Reload the whole list; on failure the list is emptied
    pub async fn fetch_all(&mut self) -> Result<&[Task]> {
        match self.api.list_tasks().await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.last_error = None;
                Ok(&self.tasks)
            }
            Err(e) => {
                self.tasks.clear();
                self.last_error = Some(format!("Failed to fetch tasks: {}", e));
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, draft: NewTask) -> Result<Task> {
        let draft = self.record(draft.normalized(), "Failed to create task")?;
        let result = self.api.create_task(&draft).await;
        let created = self.record(result, "Failed to create task")?;

        self.tasks.insert(0, created.clone());
        Ok(created)
    }

    pub async fn update(&mut self, id: &str, update: TaskUpdate) -> Result<Task> {
        let update = self.record(update.normalized(), "Failed to update task")?;
        if update.is_empty() {
            return self.record(Err(Error::validation("Nothing to update")), "Failed to update task");
        }
        let result = self.api.update_task(id, &update).await;
        let updated = self.record(result, "Failed to update task")?;

        self.replace(updated.clone());
        Ok(updated)
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let result = self.api.delete_task(id).await;
        self.record(result, "Failed to delete task")?;

        self.tasks.retain(|task| task.id != id);
        Ok(())
    }

    pub async fn complete(&mut self, id: &str) -> Result<Task> {
        let result = self.api.complete_task(id).await;
        let task = self.record(result, "Failed to complete task")?;

        self.replace(task.clone());
        Ok(task)
    }

    /// Mark a task as in progress
    pub async fn start(&mut self, id: &str) -> Result<Task> {
        let result = self.api.start_task(id).await;
        let task = self.record(result, "Failed to update task status")?;

        self.replace(task.clone());
        Ok(task)
    }

    // === Server-side queries (cached list untouched) ===

    pub async fn by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        self.api.tasks_by_status(status).await
    }

    pub async fn by_priority(&self, priority: TaskPriority) -> Result<Vec<Task>> {
        self.api.tasks_by_priority(priority).await
    }

    pub async fn search(&self, title: &str) -> Result<Vec<Task>> {
        self.api.search_tasks(title).await
    }

    pub async fn overdue(&self) -> Result<Vec<Task>> {
        self.api.overdue_tasks().await
    }

    pub async fn statistics(&self) -> Result<TaskStats> {
        self.api.statistics().await
    }

    fn replace(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    fn record<T>(&mut self, result: Result<T>, context: &str) -> Result<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(e) => {
                self.last_error = Some(format!("{}: {}", context, e));
                Err(e)
            }
        }
    }
}
