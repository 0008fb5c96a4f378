//! Job command handlers
//!
//! Handles submitting jobs, checking their status, listing recent jobs and
//! waiting for a job to finish.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use curator_client::CuratorClient;
use curator_core::domain::{Job, JobStatus};
use curator_core::dto::job::{JobSummary, ListJobs, SubmitJob};
use std::time::Duration;

use super::parse_key_value;
use crate::config::Config;
use crate::id_resolver::resolve_job_id;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a creative workflow job
    Submit {
        /// What should be created
        task: String,

        /// Background on the project, brand or audience
        #[arg(short, long)]
        context: Option<String>,

        /// Extra requirement as key=value (repeatable); JSON values are kept as JSON
        #[arg(short, long = "requirement", value_name = "KEY=VALUE")]
        requirements: Vec<String>,

        /// Priority from 1 (lowest) to 10
        #[arg(short, long)]
        priority: Option<i64>,

        /// Wait for the job to finish and print the result
        #[arg(short, long)]
        wait: bool,
    },
    /// Show a job's status and result
    Status {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// List recent jobs, newest first
    List {
        /// Maximum number of jobs (at most 100)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only jobs in this status (pending, processing, completed, failed)
        #[arg(short, long)]
        status: Option<JobStatus>,
    },
    /// Wait until a job is completed or failed
    Wait {
        /// Job ID or unambiguous prefix
        id: String,

        /// Seconds between status checks (at least 1)
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = CuratorClient::new(&config.api_url);

    match command {
        JobCommands::Submit {
            task,
            context,
            requirements,
            priority,
            wait,
        } => submit_job(&client, task, context, requirements, priority, wait).await,
        JobCommands::Status { id } => show_job(&client, &id).await,
        JobCommands::List { limit, status } => list_jobs(&client, limit, status).await,
        JobCommands::Wait {
            id,
            interval,
            timeout,
        } => {
            let job_id = resolve_job_id(&client, &id).await?;
            let job = wait_for(&client, job_id, interval, timeout).await?;
            print_job_details(&job);
            Ok(())
        }
    }
}

async fn submit_job(
    client: &CuratorClient,
    task: String,
    context: Option<String>,
    requirements: Vec<String>,
    priority: Option<i64>,
    wait: bool,
) -> Result<()> {
    let mut req = SubmitJob::new(task);
    if let Some(context) = context {
        req = req.with_context(context);
    }
    for requirement in &requirements {
        let (key, value) = parse_key_value(requirement)?;
        req = req.with_requirement(key, value);
    }
    if let Some(priority) = priority {
        req = req.with_priority(priority);
    }

    let submission = match client.submit_job(&req).await {
        Ok(submission) => submission,
        Err(e) if e.is_validation_error() => bail!("Job rejected: {}", e),
        Err(e) => return Err(e).context("Failed to submit job"),
    };

    println!("{}", "✓ Job submitted".green());
    println!("  ID:     {}", submission.job_id.to_string().cyan());
    println!("  Status: {}", colorize_status(&submission.status));

    if wait {
        println!();
        let job = wait_for(client, submission.job_id, 2, None).await?;
        print_job_details(&job);
    }

    Ok(())
}

async fn show_job(client: &CuratorClient, id: &str) -> Result<()> {
    let job_id = resolve_job_id(client, id).await?;
    let job = client.get_job(job_id).await?;

    print_job_details(&job);

    Ok(())
}

async fn list_jobs(client: &CuratorClient, limit: Option<usize>, status: Option<JobStatus>) -> Result<()> {
    let list = client.list_jobs(&ListJobs { limit, status }).await?;

    if list.jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", list.total).bold());
        println!();
        for job in &list.jobs {
            print_job_summary(job);
        }
    }

    Ok(())
}

async fn wait_for(
    client: &CuratorClient,
    job_id: curator_core::domain::JobId,
    interval: u64,
    timeout: Option<u64>,
) -> Result<Job> {
    println!("{}", format!("Waiting for job {}...", job_id).dimmed());

    client
        .wait_for_job(
            job_id,
            Duration::from_secs(interval),
            timeout.map(Duration::from_secs),
        )
        .await
        .with_context(|| format!("Failed while waiting for job {}", job_id))
}

/// Print one line group per job
fn print_job_summary(job: &JobSummary) {
    println!("  {} Job {}", "▸".cyan(), job.job_id.to_string().dimmed());
    println!("    Task:     {}", job.task_description);
    println!("    Status:   {}", colorize_status(&job.status));
    println!("    Priority: {}", job.priority);
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:       {}", job.job_id.to_string().cyan());
    println!("  Status:   {}", colorize_status(&job.status));
    println!("  Priority: {}", job.input.priority);
    println!("  Created:  {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated:  {}", job.updated_at.format("%Y-%m-%d %H:%M:%S"));

    println!("\n{}", "Task:".bold());
    println!("  {}", job.input.task_description);
    if let Some(context) = &job.input.project_context {
        println!("  Context: {}", context.dimmed());
    }
    if let Some(requirements) = &job.input.requirements {
        for (key, value) in requirements {
            println!("  {} = {}", key.cyan(), value);
        }
    }

    if let Some(result) = &job.result {
        println!("\n{}", "Stages:".bold());
        for stage in &result.stages {
            println!(
                "  {} {} ({}), {} tool call(s)",
                "▸".cyan(),
                stage.stage,
                stage.agent_role.dimmed(),
                stage.tool_invocations.len()
            );
            for invocation in &stage.tool_invocations {
                match &invocation.outcome.error {
                    None => println!("      {} {}", "✓".green(), invocation.tool),
                    Some(error) => println!("      {} {}: {}", "✗".red(), invocation.tool, error.dimmed()),
                }
            }
        }

        println!("\n{}", "Output:".bold());
        println!("{}", result.output);
    }

    if let Some(error) = &job.error_message {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> ColoredString {
    match status {
        JobStatus::Pending => status.as_str().yellow(),
        JobStatus::Processing => status.as_str().cyan(),
        JobStatus::Completed => status.as_str().green(),
        JobStatus::Failed => status.as_str().red(),
    }
}
