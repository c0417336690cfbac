//! Dashboard service - statistics plus the most recent tasks

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::api_client::ApiClient;
use crate::domain::result::Result;
use crate::domain::{Task, TaskStats};

/// Number of tasks shown in the "recent" section
pub const RECENT_TASKS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub stats: TaskStats,
    pub recent_tasks: Vec<Task>,
}

pub struct DashboardService {
    api: Arc<ApiClient>,
}

impl DashboardService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch statistics and tasks concurrently; either failure fails the load
    pub async fn load(&self) -> Result<DashboardSummary> {
        let (stats, mut tasks) = tokio::try_join!(self.api.statistics(), self.api.list_tasks())?;
        tasks.truncate(RECENT_TASKS);

        Ok(DashboardSummary {
            stats,
            recent_tasks: tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::api_client::DEFAULT_TIMEOUT;
    use crate::adapters::memory::MemoryTokenStore;
    use crate::adapters::mock_server::{MockConfig, MockTaskServer, DEFAULT_EMAIL};
    use crate::domain::result::Error;
    use crate::domain::{TaskPriority, TaskStatus};
    use crate::services::SessionStore;

    fn service_for(server: &MockTaskServer) -> DashboardService {
        let tokens = server.issue_tokens(DEFAULT_EMAIL);
        let session = Arc::new(SessionStore::new(Arc::new(MemoryTokenStore::with_tokens(tokens))));
        session.hydrate().unwrap();
        let api = ApiClient::new(&server.base_url(), DEFAULT_TIMEOUT, session).unwrap();
        DashboardService::new(Arc::new(api))
    }

    #[tokio::test]
    async fn test_load_limits_recent_tasks() {
        let server = MockTaskServer::start(MockConfig::default()).unwrap();
        for i in 0..7 {
            let status = if i % 2 == 0 { TaskStatus::Completed } else { TaskStatus::Pending };
            server.seed_task(DEFAULT_EMAIL, &format!("Task {}", i), status, TaskPriority::Medium);
        }
        let service = service_for(&server);

        let summary = service.load().await.unwrap();

        assert_eq!(summary.stats.total, 7);
        assert_eq!(summary.stats.completed, 4);
        assert_eq!(summary.recent_tasks.len(), RECENT_TASKS);
        assert_eq!(summary.recent_tasks[0].title, "Task 6");
    }

    #[tokio::test]
    async fn test_load_fails_when_either_request_fails() {
        let server = MockTaskServer::start(MockConfig::default()).unwrap();
        server.fail_requests_to("GET", "/api/tasks/statistics", 503);
        let service = service_for(&server);

        let err = service.load().await.unwrap_err();
        assert!(matches!(err, Error::ServerError { status: 503, .. }));
    }
}
