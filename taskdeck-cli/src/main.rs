//! Taskdeck CLI - your task list in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use taskdeck_core::{Error, LogEvent};

mod commands;
mod output;

use commands::{auth, config, dashboard, health, logs, tasks};

/// Taskdeck - your task list in the terminal
#[derive(Parser)]
#[command(name = "td", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the task API
    Login {
        /// Email or username (prompted when omitted)
        #[arg(long, short)]
        email: Option<String>,
        /// Password (falls back to TASKDECK_PASSWORD, then a prompt)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Create an account and log in
    Register {
        #[arg(long, short)]
        name: Option<String>,
        #[arg(long, short)]
        email: Option<String>,
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Log out and forget the stored session
    Logout,

    /// Show the profile and task statistics of the logged-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the local session state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: tasks::TasksCommands,
    },

    /// Task counters and the most recent tasks
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the task API is up
    Health {
        /// Keep checking until interrupted
        #[arg(long, short)]
        watch: bool,
        /// Seconds between checks in watch mode
        #[arg(long)]
        interval: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    /// Name recorded in the event log
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Register { .. } => "register",
            Commands::Logout => "logout",
            Commands::Whoami { .. } => "whoami",
            Commands::Status { .. } => "status",
            Commands::Tasks { command } => match command {
                tasks::TasksCommands::List { .. } => "tasks list",
                tasks::TasksCommands::Add { .. } => "tasks add",
                tasks::TasksCommands::Edit { .. } => "tasks edit",
                tasks::TasksCommands::Done { .. } => "tasks done",
                tasks::TasksCommands::Start { .. } => "tasks start",
                tasks::TasksCommands::Rm { .. } => "tasks rm",
                tasks::TasksCommands::Query { .. } => "tasks query",
            },
            Commands::Dashboard { .. } => "dashboard",
            Commands::Health { .. } => "health",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command_name = cli.command.name();
    let logs_command = matches!(cli.command, Commands::Logs { .. });

    let result = run(cli).await;

    // Inspecting the log should not add to it
    let logger = if logs_command { None } else { commands::get_logger() };

    match result {
        Ok(()) => {
            commands::log_event(&logger, LogEvent::new("command_executed").with_command(command_name));
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(core_error) => {
                    if let Some(l) = &logger {
                        let _ = l.log_failure(command_name, core_error);
                    }
                }
                None => commands::log_event(
                    &logger,
                    LogEvent::new("command_failed")
                        .with_command(command_name)
                        .with_error(e.to_string()),
                ),
            }

            output::error(&format!("{:#}", e));
            if let Some(Error::SessionExpired(_)) = e.downcast_ref::<Error>() {
                eprintln!("Your session has ended. Run `td login` to sign in again.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password } => auth::login(email, password).await,
        Commands::Register { name, email, password } => auth::register(name, email, password).await,
        Commands::Logout => auth::logout().await,
        Commands::Whoami { json } => auth::whoami(json).await,
        Commands::Status { json } => auth::status(json).await,
        Commands::Tasks { command } => tasks::run(command).await,
        Commands::Dashboard { json } => dashboard::run(json).await,
        Commands::Health { watch, interval, json } => health::run(watch, interval, json).await,
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
