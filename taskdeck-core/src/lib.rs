//! Taskdeck Core - client library for a task-management REST API
//!
//! This crate implements the client logic following hexagonal architecture:
//!
//! - **domain**: Core entities (User, Task, Session, ...) and the error taxonomy
//! - **ports**: Trait definitions for external dependencies (TokenStore, Credentials)
//! - **services**: Auth session manager, task view-model, dashboard, health, logging
//! - **adapters**: Concrete implementations (reqwest API client, token files)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::api_client::ApiClient;
use adapters::token_file::FileTokenStore;
use config::Config;
use ports::TokenStore;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{NewTask, Session, StoredTokens, Task, TaskPriority, TaskStats, TaskStatus, TaskUpdate, User};
pub use domain::result::Error;
pub use services::{EntryPoint, LogEvent, LoggingService, TaskFilter};

/// Main context for Taskdeck operations
///
/// Wires the session store, the API client and the services together. The
/// API client reads its tokens from the same session store the auth service
/// writes, so a refresh performed for any request is visible everywhere.
pub struct TaskdeckContext {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    pub auth_service: AuthService,
    pub dashboard_service: DashboardService,
    pub health_service: HealthService,
}

impl TaskdeckContext {
    /// Create a context persisting tokens in the taskdeck directory
    pub fn new(taskdeck_dir: &Path) -> Result<Self> {
        let config = Config::load(taskdeck_dir)?;
        let tokens = Arc::new(FileTokenStore::new(taskdeck_dir));
        Self::with_token_store(config, tokens)
    }

    /// Create a context over any token store
    pub fn with_token_store(config: Config, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let session = Arc::new(SessionStore::new(tokens));
        let api = Arc::new(ApiClient::new(&config.base_url, config.timeout, session.clone())?);

        let auth_service = AuthService::new(Arc::clone(&api), Arc::clone(&session));
        let dashboard_service = DashboardService::new(Arc::clone(&api));
        let health_service = HealthService::new(Arc::clone(&api), config.health_interval);

        Ok(Self {
            config,
            session,
            api,
            auth_service,
            dashboard_service,
            health_service,
        })
    }

    /// A fresh task view-model with an empty list
    pub fn task_service(&self) -> TaskService {
        TaskService::new(Arc::clone(&self.api))
    }
}
