//! Health command - probe the task API

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use taskdeck_core::adapters::api_client::HEALTH_PATH;
use taskdeck_core::services::{HealthService, HealthStatus};
use taskdeck_core::LogEvent;

use super::{get_context, get_logger, log_event};
use crate::output;

fn print_status(status: &HealthStatus) {
    let time = status.checked_at.with_timezone(&chrono::Local).format("%H:%M:%S");
    if status.is_healthy() {
        println!("{} {} ({} ms)", time.to_string().dimmed(), "healthy".green(), status.response_time_ms);
    } else {
        println!(
            "{} {} {}",
            time.to_string().dimmed(),
            "unhealthy".red(),
            status.error.as_deref().unwrap_or_default().dimmed()
        );
    }
}

pub async fn run(watch: bool, interval: Option<u64>, json: bool) -> Result<()> {
    let ctx = get_context().await?;

    if !watch {
        let status = output::with_spinner("Checking API health...", ctx.health_service.check()).await;
        if let Some(error) = &status.error {
            log_event(
                &get_logger(),
                LogEvent::new("health_check_failed")
                    .with_command("health")
                    .with_endpoint(HEALTH_PATH)
                    .with_error(error.clone()),
            );
        }
        if json {
            return output::json(&status);
        }
        print_status(&status);
        if !status.is_healthy() {
            anyhow::bail!("API at {} is not healthy", ctx.config.base_url);
        }
        return Ok(());
    }

    let interval = interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.health_service.interval());
    let service = HealthService::new(ctx.api.clone(), interval);

    output::info(&format!(
        "Watching {} every {}s (Ctrl-C to stop)",
        ctx.config.base_url,
        interval.as_secs()
    ));

    let report = |status: &HealthStatus| {
        if json {
            if let Ok(line) = serde_json::to_string(status) {
                println!("{}", line);
            }
        } else {
            print_status(status);
        }
    };

    tokio::select! {
        _ = service.poll(report, None) => {}
        _ = tokio::signal::ctrl_c() => {}
    }

    Ok(())
}
