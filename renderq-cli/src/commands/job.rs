//! Job command handlers
//!
//! Handles all job-related CLI commands: listing, inspecting, queueing,
//! claiming, patching and deleting jobs.

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Subcommand;
use colored::*;
use renderq_client::QueueClient;
use renderq_core::domain::job::Job;
use renderq_core::domain::state::JobState;
use renderq_core::domain::status::JobStatus;
use serde_json::Value;

use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List all jobs
    List,
    /// Show the status of all jobs, or of one job
    Status {
        /// Job uid
        uid: Option<String>,
    },
    /// Get full job details
    Get {
        /// Job uid
        uid: String,
    },
    /// Queue a new job from a JSON payload
    Create {
        /// Job JSON, e.g. '{"template":{"src":"file:///a.aep","composition":"main"}}'
        #[arg(default_value = "{}")]
        payload: String,
    },
    /// Claim the oldest queued job
    Pickup {
        /// Only claim jobs carrying all of these comma separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Merge a JSON patch into a job
    Update {
        /// Job uid
        uid: String,
        /// Patch JSON, e.g. '{"state":"finished"}'
        patch: String,
    },
    /// Delete a job
    Delete {
        /// Job uid
        uid: String,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Status { uid } => show_status(&client, uid.as_deref()).await,
        JobCommands::Get { uid } => get_job(&client, &uid).await,
        JobCommands::Create { payload } => create_job(&client, &payload).await,
        JobCommands::Pickup { tags } => pickup_job(&client, tags.as_deref()).await,
        JobCommands::Update { uid, patch } => update_job(&client, &uid, &patch).await,
        JobCommands::Delete { uid } => delete_job(&client, &uid).await,
    }
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON: {}", raw))
}

/// List all jobs
async fn list_jobs(client: &QueueClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_status_summary(&job.status());
        }
    }

    Ok(())
}

async fn show_status(client: &QueueClient, uid: Option<&str>) -> Result<()> {
    match uid {
        Some(uid) => print_status_summary(&client.job_status(uid).await?),
        None => {
            let statuses = client.list_statuses().await?;
            if statuses.is_empty() {
                println!("{}", "No jobs found.".yellow());
            }
            for status in statuses {
                print_status_summary(&status);
            }
        }
    }

    Ok(())
}

async fn get_job(client: &QueueClient, uid: &str) -> Result<()> {
    let job = client.get_job(uid).await?;
    print_job_details(&job);
    Ok(())
}

async fn create_job(client: &QueueClient, payload: &str) -> Result<()> {
    let body = parse_json(payload)?;
    let job = client.create_job(&body).await?;

    println!("{} Queued job {}", "✓".green(), job.uid().cyan());
    Ok(())
}

async fn pickup_job(client: &QueueClient, tags: Option<&str>) -> Result<()> {
    let job = match tags {
        Some(tags) => {
            let tags: Vec<&str> = tags.split(',').map(str::trim).collect();
            client.pickup_tagged(&tags).await?
        }
        None => client.pickup().await?,
    };

    match job {
        Some(job) => print_job_details(&job),
        None => println!("{}", "No queued job to pick up.".yellow()),
    }

    Ok(())
}

async fn update_job(client: &QueueClient, uid: &str, patch: &str) -> Result<()> {
    let patch = parse_json(patch)?;
    let job = client.update_job(uid, &patch).await?;

    println!("{} Updated job {}", "✓".green(), job.uid().cyan());
    print_status_summary(&job.status());
    Ok(())
}

async fn delete_job(client: &QueueClient, uid: &str) -> Result<()> {
    if client.delete_job(uid).await? {
        println!("{} Deleted job {}", "✓".green(), uid.cyan());
    } else {
        println!("{}", format!("Job {} did not exist.", uid).yellow());
    }
    Ok(())
}

/// Render a stored value for the terminal: strings unquoted, null as `-`
fn display(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// RFC 3339 timestamps as `%Y-%m-%d %H:%M:%S`, anything else as stored
fn display_time(value: &Value) -> String {
    value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| display(value))
}

/// Print a one-block summary of a job status
fn print_status_summary(status: &JobStatus) {
    println!("  {} Job {}", "▸".cyan(), status.uid.dimmed());
    println!("    State:    {}", colorize_state(&status.state));
    println!("    Type:     {}", display(&status.job_type));
    if status.tags.as_str().is_some_and(|tags| !tags.is_empty()) {
        println!("    Tags:     {}", display(&status.tags));
    }
    match status.render_progress.as_f64() {
        Some(progress) => println!("    Progress: {:.0}%", progress),
        None => println!("    Progress: {}", display(&status.render_progress)),
    }
    println!("    Updated:  {}", display_time(&status.updated_at).dimmed());
    if !status.job_executor.is_null() {
        println!("    Executor: {}", display(&status.job_executor).dimmed());
    }
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    let field = |key: &str| job.get(key).cloned().unwrap_or_default();

    println!("{}", "Job Details:".bold());
    println!("  UID:       {}", job.uid().cyan());
    println!("  State:     {}", colorize_state(&field("state")));
    println!("  Type:      {}", display(&field("type")));
    println!("  Priority:  {}", display(&field("priority")));
    println!("  Tags:      {}", job.tags());
    match job.render_progress() {
        Some(progress) => println!("  Progress:  {:.0}%", progress),
        None => println!("  Progress:  {}", display(&field("renderProgress"))),
    }
    println!("  Created:   {}", display_time(&field("createdAt")));
    println!("  Updated:   {}", display_time(&field("updatedAt")));

    if !field("startedAt").is_null() {
        println!("  Started:   {}", display_time(&field("startedAt")));
    }

    if !field("finishedAt").is_null() {
        println!("  Finished:  {}", display_time(&field("finishedAt")));

        if let (Some(started), Some(finished)) = (job.started_at(), job.finished_at()) {
            let duration = finished.signed_duration_since(started);
            println!("  Duration:  {}s", duration.num_seconds());
        }
    }

    if let Some(creator) = job.creator() {
        println!("  Creator:   {}", creator);
    }
    if let Some(executor) = job.executor() {
        println!("  Executor:  {}", executor);
    }

    println!("\n{}", "Template:".bold());
    match serde_json::to_string_pretty(&field("template")) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{:?}", field("template")),
    }

    let errors = error_lines(&field("error"));
    if !errors.is_empty() {
        println!("\n{}", "Errors:".bold());
        for error in errors {
            println!("  {}", error.red());
        }
    }
}

/// Workers report errors as a list or a single value
fn error_lines(error: &Value) -> Vec<String> {
    match error {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(display).collect(),
        Value::String(text) if text.is_empty() => Vec::new(),
        other => vec![display(other)],
    }
}

/// Colorize job state for display; states outside the vocabulary stay plain
fn colorize_state(state: &Value) -> colored::ColoredString {
    let text = display(state);
    match state.as_str().and_then(|raw| raw.parse::<JobState>().ok()) {
        Some(JobState::Created | JobState::Queued) => text.yellow(),
        Some(JobState::Picked | JobState::Started | JobState::Render(_)) => text.cyan(),
        Some(JobState::Finished) => text.green(),
        Some(JobState::Error) => text.red(),
        None => text.normal(),
    }
}
