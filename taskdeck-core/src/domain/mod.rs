//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod session;
pub mod task;
mod user;
pub mod result;
pub mod wire;

pub use session::{Session, StoredTokens};
pub use task::{parse_due_date, NewTask, Task, TaskPriority, TaskStats, TaskStatus, TaskUpdate};
pub use user::User;
