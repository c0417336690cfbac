//! Output formatting utilities

use std::future::Future;
use std::time::Duration;

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use taskdeck_core::{Task, TaskPriority, TaskStatus};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Spinner on stderr, hidden when stderr is not a terminal
pub fn spinner(msg: &str) -> ProgressBar {
    if atty::isnt(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Await `fut` behind a spinner
pub async fn with_spinner<F, T>(msg: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let pb = spinner(msg);
    let result = fut.await;
    pb.finish_and_clear();
    result
}

pub fn status_label(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Pending => "pending".yellow(),
        TaskStatus::InProgress => "in progress".cyan(),
        TaskStatus::Completed => "completed".green(),
        TaskStatus::Cancelled => "cancelled".dimmed(),
    }
}

pub fn priority_label(priority: TaskPriority) -> ColoredString {
    match priority {
        TaskPriority::Low => "low".dimmed(),
        TaskPriority::Medium => "medium".normal(),
        TaskPriority::High => "high".yellow(),
        TaskPriority::Urgent => "urgent".red().bold(),
    }
}

/// Table with one row per task
pub fn task_table<'a, I>(tasks: I) -> Table
where
    I: IntoIterator<Item = &'a Task>,
{
    let today = chrono::Local::now().date_naive();
    let mut table = create_table();
    table.set_header(vec!["ID", "Title", "Status", "Priority", "Due"]);

    for task in tasks {
        let due = match task.due_day() {
            Some(day) if task.is_overdue(today) => format!("{} (overdue)", day).red().to_string(),
            Some(day) => day.to_string(),
            None => String::new(),
        };
        table.add_row(vec![
            task.id.clone(),
            task.title.clone(),
            status_label(task.status).to_string(),
            priority_label(task.priority).to_string(),
            due,
        ]);
    }

    table
}

/// Print JSON, pretty
pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
