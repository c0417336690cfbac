//! Task commands - list, add, edit, done, start, rm, query

use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use taskdeck_core::domain::parse_due_date;
use taskdeck_core::services::TaskService;
use taskdeck_core::{LogEvent, NewTask, Task, TaskFilter, TaskPriority, TaskStatus, TaskUpdate};

use super::{get_authenticated_context, get_logger, log_event};
use crate::output;

fn parse_due(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_due_date(s).map_err(|e| e.to_string())
}

#[derive(Subcommand)]
pub enum TasksCommands {
    /// List tasks, optionally filtered locally
    List {
        /// Case-insensitive text to find in title or description
        #[arg(long, short)]
        search: Option<String>,
        /// Only tasks with this status
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Only tasks with this priority
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a task
    Add {
        title: String,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short, default_value = "medium")]
        priority: TaskPriority,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due)]
        due: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due)]
        due: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as completed
    Done { id: String },
    /// Mark a task as in progress
    Start { id: String },
    /// Delete a task
    Rm {
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
    /// Ask the server for a subset of tasks
    Query {
        #[command(subcommand)]
        query: TaskQuery,
        /// Output as JSON
        #[arg(long, global = true)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TaskQuery {
    /// Tasks with a status
    Status { status: TaskStatus },
    /// Tasks with a priority
    Priority { priority: TaskPriority },
    /// Tasks whose title contains TEXT
    Search { text: String },
    /// Tasks past their due date and not completed
    Overdue,
    /// Task counters
    Stats,
}

pub async fn run(command: TasksCommands) -> Result<()> {
    let ctx = get_authenticated_context().await?;
    let mut service = ctx.task_service();
    let logger = get_logger();

    match command {
        TasksCommands::List {
            search,
            status,
            priority,
            json,
        } => {
            output::with_spinner("Loading tasks...", service.fetch_all()).await?;
            service.set_filter(
                TaskFilter::new()
                    .with_search(search.unwrap_or_default())
                    .with_status(status)
                    .with_priority(priority),
            );
            let visible = service.visible();

            if json {
                return output::json(&visible);
            }
            if visible.is_empty() {
                if service.filter().is_active() {
                    println!("No tasks match the filter ({} tasks in total).", service.tasks().len());
                } else {
                    println!("No tasks yet. Create one with `td tasks add`.");
                }
                return Ok(());
            }

            println!("{}", output::task_table(visible.iter().copied()));
            if service.filter().is_active() {
                println!("{}", format!("{} of {} tasks shown", visible.len(), service.tasks().len()).dimmed());
            }
        }
        TasksCommands::Add {
            title,
            description,
            priority,
            due,
            json,
        } => {
            let mut draft = NewTask::new(title).with_priority(priority);
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            if let Some(due) = due {
                draft = draft.with_due_date(due);
            }

            let task = output::with_spinner("Creating task...", service.create(draft)).await?;
            log_event(&logger, LogEvent::new("task_created").with_command("tasks add"));
            print_task_result(&task, "Created", json)?;
        }
        TasksCommands::Edit {
            id,
            title,
            description,
            priority,
            status,
            due,
            json,
        } => {
            let update = TaskUpdate {
                title,
                description,
                priority,
                status,
                due_date: due,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to change. Pass at least one of --title, --description, --priority, --status, --due.");
            }

            let task = output::with_spinner("Updating task...", service.update(&id, update)).await?;
            log_event(&logger, LogEvent::new("task_updated").with_command("tasks edit"));
            print_task_result(&task, "Updated", json)?;
        }
        TasksCommands::Done { id } => {
            let task = output::with_spinner("Completing task...", service.complete(&id)).await?;
            log_event(&logger, LogEvent::new("task_completed").with_command("tasks done"));
            print_task_result(&task, "Completed", false)?;
        }
        TasksCommands::Start { id } => {
            let task = output::with_spinner("Updating task...", service.start(&id)).await?;
            log_event(&logger, LogEvent::new("task_started").with_command("tasks start"));
            print_task_result(&task, "Started", false)?;
        }
        TasksCommands::Rm { id, force } => {
            if !force
                && !Confirm::new()
                    .with_prompt(format!("Delete task {}?", id))
                    .default(false)
                    .interact()?
            {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }

            output::with_spinner("Deleting task...", service.delete(&id)).await?;
            log_event(&logger, LogEvent::new("task_deleted").with_command("tasks rm"));
            output::success(&format!("Deleted task {}", id));
        }
        TasksCommands::Query { query, json } => {
            let tasks = match query {
                TaskQuery::Stats => return print_stats(&service, json).await,
                TaskQuery::Status { status } => {
                    output::with_spinner("Querying tasks...", service.by_status(status)).await?
                }
                TaskQuery::Priority { priority } => {
                    output::with_spinner("Querying tasks...", service.by_priority(priority)).await?
                }
                TaskQuery::Search { text } => {
                    output::with_spinner("Querying tasks...", service.search(&text)).await?
                }
                TaskQuery::Overdue => output::with_spinner("Querying tasks...", service.overdue()).await?,
            };

            if json {
                return output::json(&tasks);
            }
            if tasks.is_empty() {
                println!("No matching tasks.");
            } else {
                println!("{}", output::task_table(&tasks));
            }
        }
    }

    Ok(())
}

async fn print_stats(service: &TaskService, json: bool) -> Result<()> {
    let stats = output::with_spinner("Loading statistics...", service.statistics()).await?;
    if json {
        return output::json(&stats);
    }

    let mut table = output::create_table();
    table.add_row(vec!["Total", &stats.total.to_string()]);
    table.add_row(vec!["Completed", &stats.completed.to_string()]);
    table.add_row(vec!["In progress", &stats.in_progress.to_string()]);
    table.add_row(vec!["Overdue", &stats.overdue.to_string()]);
    println!("{}", table);
    Ok(())
}

fn print_task_result(task: &Task, verb: &str, json: bool) -> Result<()> {
    if json {
        return output::json(task);
    }
    output::success(&format!("{} task {}: {}", verb, task.id, task.title));
    println!(
        "  {} · {}",
        output::status_label(task.status),
        output::priority_label(task.priority)
    );
    if let Some(due) = task.due_day() {
        println!("  Due {}", due);
    }
    Ok(())
}
