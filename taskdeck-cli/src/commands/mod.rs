//! CLI command implementations

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod health;
pub mod logs;
pub mod tasks;

use std::path::PathBuf;

use anyhow::{Context, Result};
use taskdeck_core::adapters::api_client::CURRENT_USER_PATH;
use taskdeck_core::{EntryPoint, LogEvent, LoggingService, Session, TaskdeckContext};

use crate::output;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let taskdeck_dir = get_taskdeck_dir();
    std::fs::create_dir_all(&taskdeck_dir).ok()?;
    LoggingService::new(&taskdeck_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the taskdeck directory from environment or default
pub fn get_taskdeck_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TASKDECK_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".taskdeck"))
        .unwrap_or_else(|| PathBuf::from(".taskdeck"))
}

/// Build the context and restore the persisted session
pub async fn get_context() -> Result<TaskdeckContext> {
    let taskdeck_dir = get_taskdeck_dir();

    std::fs::create_dir_all(&taskdeck_dir)
        .with_context(|| format!("Failed to create taskdeck directory: {:?}", taskdeck_dir))?;

    let ctx = TaskdeckContext::new(&taskdeck_dir).context("Failed to initialize taskdeck context")?;

    let had_tokens = taskdeck_dir.join("session.json").exists();
    let session = output::with_spinner("Restoring session...", ctx.auth_service.restore_session()).await;
    if had_tokens && !session.is_authenticated() {
        log_event(
            &get_logger(),
            LogEvent::new("session_restore_failed").with_endpoint(CURRENT_USER_PATH),
        );
    }

    Ok(ctx)
}

/// Restored context that is known to be logged in
pub async fn get_authenticated_context() -> Result<TaskdeckContext> {
    let ctx = get_context().await?;
    require_login(&ctx.auth_service.session())?;
    Ok(ctx)
}

fn require_login(session: &Session) -> Result<()> {
    if !session.is_authenticated() {
        anyhow::bail!("Not logged in. Run `td login` first.");
    }
    Ok(())
}
