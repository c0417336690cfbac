//! Dashboard command - task counters and recent tasks

use anyhow::Result;
use colored::Colorize;

use super::get_authenticated_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_authenticated_context().await?;
    let summary = output::with_spinner("Loading dashboard...", ctx.dashboard_service.load()).await?;

    if json {
        return output::json(&summary);
    }

    if let Some(user) = ctx.auth_service.session().current_user {
        println!("{}", format!("Welcome back, {}", user.display_name).bold());
        println!();
    }

    let stats = &summary.stats;
    let mut table = output::create_table();
    table.set_header(vec!["Total", "Completed", "In progress", "Overdue"]);
    table.add_row(vec![
        stats.total.to_string(),
        stats.completed.to_string().green().to_string(),
        stats.in_progress.to_string().cyan().to_string(),
        if stats.overdue > 0 {
            stats.overdue.to_string().red().to_string()
        } else {
            stats.overdue.to_string()
        },
    ]);
    println!("{}", table);
    println!();

    println!("{}", "Recent Tasks".bold());
    if summary.recent_tasks.is_empty() {
        println!("{}", "  No tasks yet".dimmed());
    } else {
        println!("{}", output::task_table(&summary.recent_tasks));
    }

    Ok(())
}
