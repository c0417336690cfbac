//! Config command - show or change client settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use taskdeck_core::config::{Config, API_URL_ENV};

use super::get_taskdeck_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the task API base URL
    SetUrl {
        /// e.g. https://tasks.example.com
        url: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let taskdeck_dir = get_taskdeck_dir();
    let mut config = Config::load(&taskdeck_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            if json {
                return output::json(&json!({
                    "directory": taskdeck_dir.to_string_lossy(),
                    "apiUrl": config.base_url,
                    "apiUrlFromEnv": config.base_url_from_env(),
                    "timeoutSecs": config.timeout.as_secs(),
                    "healthIntervalSecs": config.health_interval.as_secs(),
                }));
            }

            let mut table = output::create_table();
            table.add_row(vec!["Directory", &taskdeck_dir.display().to_string()]);
            let url = if config.base_url_from_env() {
                format!("{} (from {})", config.base_url, API_URL_ENV)
            } else {
                config.base_url.clone()
            };
            table.add_row(vec!["API URL", &url]);
            table.add_row(vec!["Request timeout", &format!("{}s", config.timeout.as_secs())]);
            table.add_row(vec!["Health interval", &format!("{}s", config.health_interval.as_secs())]);
            println!("{}", "Configuration".bold());
            println!("{}", table);
        }
        ConfigCommands::SetUrl { url } => {
            config.set_base_url(&url)?;
            std::fs::create_dir_all(&taskdeck_dir)?;
            config.save(&taskdeck_dir)?;
            output::success(&format!("API URL set to {}", config.base_url));
            if std::env::var(API_URL_ENV).is_ok() {
                output::warning(&format!("{} is set and still overrides this value", API_URL_ENV));
            }
        }
    }

    Ok(())
}
