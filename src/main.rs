use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use fanout_config::{JobDef, MergeOrder};
use fanout_connector::SqlxConnector;
use fanout_executor::{ExecutorConfig, FanoutExecutor, FanoutOutcome};

mod logging;

/// Fanout - run SQL statements across many database instances and merge the results
#[derive(Parser)]
#[command(name = "fanout")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run every query of a job against every instance
  Run {
    /// Path to the job file (JSON)
    job_file: PathBuf,

    /// Override the job's max_parallelism
    #[arg(long)]
    max_parallelism: Option<usize>,

    /// Override the job's per-task timeout, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output format for the combined table
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Merge results in task order instead of completion order
    #[arg(long)]
    deterministic: bool,

    /// Exit successfully even if some tasks failed
    #[arg(long)]
    allow_partial: bool,
  },

  /// Parse and validate a job file without connecting to anything
  Validate {
    /// Path to the job file (JSON)
    job_file: PathBuf,
  },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
  Json,
  Csv,
}

struct RunOptions {
  max_parallelism: Option<usize>,
  timeout_ms: Option<u64>,
  format: OutputFormat,
  deterministic: bool,
  allow_partial: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init();

  match cli.command {
    Some(Commands::Run {
      job_file,
      max_parallelism,
      timeout_ms,
      format,
      deterministic,
      allow_partial,
    }) => {
      let options = RunOptions {
        max_parallelism,
        timeout_ms,
        format,
        deterministic,
        allow_partial,
      };
      run_job(job_file, options)?;
    }
    Some(Commands::Validate { job_file }) => {
      validate_job(job_file)?;
    }
    None => {
      println!("fanout - use --help to see available commands");
    }
  }

  Ok(())
}

fn run_job(job_file: PathBuf, options: RunOptions) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_job_async(job_file, options).await })
}

async fn run_job_async(job_file: PathBuf, options: RunOptions) -> Result<()> {
  let job = load_job(&job_file).await?;

  let mut config = ExecutorConfig::from_job(&job);
  if let Some(max_parallelism) = options.max_parallelism {
    config.max_parallelism = max_parallelism;
  }
  if let Some(timeout_ms) = options.timeout_ms {
    config.task_timeout = Some(Duration::from_millis(timeout_ms));
  }
  if options.deterministic {
    config.merge_order = MergeOrder::Task;
  }

  eprintln!(
    "Loaded job: {} ({} instances x {} queries)",
    job.name.as_deref().unwrap_or("unnamed"),
    job.instances.len(),
    job.queries.len()
  );

  let executor = FanoutExecutor::new(Arc::new(SqlxConnector::new()), config);

  // Ctrl-C stops queued tasks and interrupts running ones.
  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      tracing::warn!("interrupt received, cancelling fanout");
      on_interrupt.cancel();
    }
  });

  let outcome = executor
    .execute(&job.instances, &job.queries, cancel)
    .await
    .context("fanout execution failed")?;

  write_table(&outcome, options.format)?;
  report_failures(&outcome);

  if !outcome.is_complete() && !options.allow_partial {
    bail!(
      "{} of {} tasks failed",
      outcome.failures.len(),
      outcome.task_count()
    );
  }

  Ok(())
}

fn validate_job(job_file: PathBuf) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    let job = load_job(&job_file).await?;
    let executor = FanoutExecutor::new(
      Arc::new(SqlxConnector::new()),
      ExecutorConfig::from_job(&job),
    );
    let tasks = executor
      .plan(&job.instances, &job.queries)
      .with_context(|| format!("invalid job file: {}", job_file.display()))?;

    println!(
      "{}: {} instances x {} queries = {} tasks",
      job.name.as_deref().unwrap_or("unnamed"),
      job.instances.len(),
      job.queries.len(),
      tasks.len()
    );
    Ok(())
  })
}

async fn load_job(job_file: &Path) -> Result<JobDef> {
  let content = tokio::fs::read_to_string(job_file)
    .await
    .with_context(|| format!("failed to read job file: {}", job_file.display()))?;

  let mut job = JobDef::from_json(&content)
    .with_context(|| format!("failed to parse job file: {}", job_file.display()))?;

  job
    .resolve_secrets(|var| std::env::var(var).ok())
    .context("failed to resolve instance passwords")?;

  Ok(job)
}

fn write_table(outcome: &FanoutOutcome, format: OutputFormat) -> Result<()> {
  match format {
    OutputFormat::Json => {
      println!("{}", serde_json::to_string_pretty(&outcome.table.to_json())?);
    }
    OutputFormat::Csv => {
      outcome
        .table
        .write_csv(io::stdout().lock())
        .context("failed to write CSV output")?;
    }
  }
  Ok(())
}

fn report_failures(outcome: &FanoutOutcome) {
  for failure in &outcome.failures {
    eprintln!("{}", failure);
  }

  eprintln!(
    "Execution {}: {} tasks, {} succeeded, {} failed, {} rows",
    outcome.execution_id,
    outcome.task_count(),
    outcome.succeeded_count(),
    outcome.failures.len(),
    outcome.table.len()
  );
}
