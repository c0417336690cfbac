//! Client-side task filtering
//!
//! Pure and synchronous: the visible list is recomputed from the cached tasks
//! every time it is read.

use crate::domain::{Task, TaskPriority, TaskStatus};

/// Criteria for the visible task list; `None` means "any"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring of title or description; empty clears it
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.is_empty() { None } else { Some(search) };
        self
    }

    pub fn with_status(mut self, status: Option<TaskStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Option<TaskPriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_active(&self) -> bool {
        self.search.is_some() || self.status.is_some() || self.priority.is_some()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }

        match &self.search {
            None => true,
            Some(search) => {
                let needle = search.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
        }
    }

    /// Matching tasks, in their original order
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        tasks.into_iter().filter(|task| self.matches(task)).collect()
    }
}
