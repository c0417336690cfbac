//! Account commands - login, register, logout, whoami, status

use std::env;

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};
use serde_json::json;
use taskdeck_core::{LogEvent, User};

use super::{get_authenticated_context, get_context, get_logger, log_event};
use crate::output;

/// Get the password from --password, TASKDECK_PASSWORD, or a prompt
fn get_password_or_prompt(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }
    if let Ok(p) = env::var("TASKDECK_PASSWORD") {
        return Ok(p);
    }
    let p = Password::new().with_prompt(prompt).interact()?;
    Ok(p)
}

fn get_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

fn print_user(user: &User) {
    let mut table = output::create_table();
    table.add_row(vec!["Name", &user.display_name]);
    table.add_row(vec!["Email", &user.email]);
    table.add_row(vec!["ID", &user.id]);
    table.add_row(vec!["Member since", &user.created_at.format("%Y-%m-%d").to_string()]);
    println!("{}", table);
}

pub async fn login(email: Option<String>, password: Option<String>) -> Result<()> {
    let ctx = get_context().await?;
    let logger = get_logger();

    let identifier = get_or_prompt(email, "Email or username")?;
    let secret = get_password_or_prompt(password, "Password")?;

    let user = output::with_spinner("Logging in...", ctx.auth_service.login(&identifier, &secret)).await?;
    log_event(&logger, LogEvent::new("login_succeeded").with_command("login"));

    output::success(&format!("Logged in as {}", user.display_name));
    Ok(())
}

pub async fn register(name: Option<String>, email: Option<String>, password: Option<String>) -> Result<()> {
    let ctx = get_context().await?;
    let logger = get_logger();

    let name = get_or_prompt(name, "Name")?;
    let email = get_or_prompt(email, "Email")?;
    let secret = match password {
        Some(p) => p,
        None if env::var("TASKDECK_PASSWORD").is_ok() => get_password_or_prompt(None, "Password")?,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let user = output::with_spinner(
        "Creating account...",
        ctx.auth_service.register(&name, &email, &secret),
    )
    .await?;
    log_event(&logger, LogEvent::new("register_succeeded").with_command("register"));

    output::success(&format!("Welcome, {}! You are now logged in.", user.display_name));
    Ok(())
}

pub async fn logout() -> Result<()> {
    let ctx = get_context().await?;

    if !ctx.auth_service.session().is_authenticated() {
        output::info("Not logged in.");
        return Ok(());
    }

    output::with_spinner("Logging out...", ctx.auth_service.logout()).await?;
    log_event(&get_logger(), LogEvent::new("logged_out").with_command("logout"));

    output::success("Logged out.");
    Ok(())
}

/// Profile view: re-fetches the user and their task counters
pub async fn whoami(json: bool) -> Result<()> {
    let ctx = get_authenticated_context().await?;
    let user = output::with_spinner("Loading profile...", ctx.auth_service.profile()).await?;
    let stats = output::with_spinner("Loading statistics...", ctx.api.statistics()).await?;

    if json {
        return output::json(&json!({
            "user": user,
            "stats": stats,
            "completionRate": stats.completion_rate(),
        }));
    }

    println!("{}", "Profile".bold());
    print_user(&user);

    println!();
    println!("{}", "Task Statistics".bold());
    let mut table = output::create_table();
    table.add_row(vec!["Total", &stats.total.to_string()]);
    table.add_row(vec!["Completed", &stats.completed.to_string()]);
    table.add_row(vec!["In progress", &stats.in_progress.to_string()]);
    table.add_row(vec!["Overdue", &stats.overdue.to_string()]);
    table.add_row(vec!["Completion rate", &format!("{}%", stats.completion_rate())]);
    println!("{}", table);
    Ok(())
}

/// Local session state, without tokens
pub async fn status(json: bool) -> Result<()> {
    let ctx = get_context().await?;
    let session = ctx.auth_service.session();

    if json {
        return output::json(&json!({
            "apiUrl": ctx.config.base_url,
            "authenticated": session.is_authenticated(),
            "user": session.current_user,
            "hasRefreshToken": session.refresh_token.is_some(),
        }));
    }

    println!("{}", "Session".bold());
    println!("  API: {}", ctx.config.base_url);
    match &session.current_user {
        Some(user) if session.is_authenticated() => {
            println!("  Status: {}", "logged in".green());
            println!("  User: {} <{}>", user.display_name, user.email);
        }
        _ => println!("  Status: {}", "not logged in".yellow()),
    }
    Ok(())
}
