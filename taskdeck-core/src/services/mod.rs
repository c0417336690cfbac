//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod auth;
mod dashboard;
mod filter;
pub mod health;
pub mod logging;
mod session;
mod tasks;

pub use auth::AuthService;
pub use dashboard::{DashboardService, DashboardSummary, RECENT_TASKS};
pub use filter::TaskFilter;
pub use health::{HealthService, HealthState, HealthStatus};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use session::SessionStore;
pub use tasks::TaskService;
