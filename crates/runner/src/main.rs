//! Taskgate Runner - drives a synthetic workload through the bounded queue

mod settings;
mod workload;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use taskgate_core::AsyncQueue;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use settings::RunnerConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "taskgate_core=info,taskgate_runner=info";

#[derive(Parser, Debug)]
#[command(name = "taskgate")]
#[command(about = "Run a synthetic workload through a bounded-concurrency queue", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, env = "TASKGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Worker slots (must be at least 1)
    #[arg(short, long, env = "TASKGATE_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Number of tasks to submit
    #[arg(short = 'n', long)]
    tasks: Option<usize>,

    /// Base task duration in milliseconds
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Random extra duration in milliseconds
    #[arg(long)]
    jitter_ms: Option<u64>,

    /// Every k-th task fails (0 = never)
    #[arg(long)]
    fail_every: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Command-line flags take precedence over file and environment
    fn apply(&self, config: &mut RunnerConfig) {
        if let Some(concurrency) = self.concurrency {
            config.queue.concurrency = concurrency;
        }
        if let Some(tasks) = self.tasks {
            config.workload.tasks = tasks;
        }
        if let Some(duration_ms) = self.duration_ms {
            config.workload.duration_ms = duration_ms;
        }
        if let Some(jitter_ms) = self.jitter_ms {
            config.workload.jitter_ms = jitter_ms;
        }
        if let Some(fail_every) = self.fail_every {
            config.workload.fail_every = fail_every;
        }
    }
}

fn init_logging() -> Result<()> {
    let log_format = std::env::var("TASKGATE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

fn print_summary(summary: &workload::Summary) {
    println!("Queue:          {} (concurrency {})", summary.queue, summary.concurrency);
    println!("Submitted:      {}", summary.submitted);
    println!("Max in flight:  {}", summary.max_in_flight);
    println!("Start order:    {:?}", summary.start_order);
    println!("Succeeded:      {:?}", summary.succeeded);
    println!("Failed:         {:?}", summary.failed);
    println!("Elapsed:        {} ms", summary.elapsed_ms);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    info!("Taskgate runner v{} starting...", VERSION);

    let mut config = RunnerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let queue = AsyncQueue::with_config(config.queue.clone()).context("Invalid queue configuration")?;
    let summary = workload::run(&queue, &config.workload).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    } else {
        print_summary(&summary);
    }

    Ok(())
}
