use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mapfold::config::{ErrorPolicy, ExecutorConfig, JobConfig, JobFile};
use mapfold::executor::Executor;
use mapfold::source::{DirEnumerator, InputEnumerator, PathSource};
use mapfold::worker::{build_workers, LineCountFactory};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Count line separators across input files with a parallel map/fold
#[derive(Parser)]
#[command(name = "mapfold")]
#[command(about = "Bounded-parallel map/fold over the files of a directory", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a map/fold job over a directory of input files
    Run {
        /// Directory containing the input files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Path to a YAML job file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Maximum concurrent map calls
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Deadline for the map phase, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Fold the readable inputs even if some fail to read
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Generate randomized fixture files in a temp directory and run over them
    Demo {
        /// Number of fixture files to generate
        #[arg(long, default_value = "100")]
        files: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    let result = match cli.command {
        Commands::Run {
            data_dir,
            config,
            max_parallel,
            timeout,
            continue_on_error,
        } => run_job(data_dir, config, max_parallel, timeout, continue_on_error).await,
        Commands::Demo { files } => run_demo(files).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_job(
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    max_parallel: Option<usize>,
    timeout: Option<u64>,
    continue_on_error: bool,
) -> Result<()> {
    let (mut job, mut executor_config) = match config_path {
        Some(path) => {
            let file = JobFile::load(&path)?;
            (file.options, file.executor)
        }
        None => (JobConfig::new(), ExecutorConfig::default()),
    };

    if let Some(dir) = data_dir {
        job = job.with("data_dir", dir.to_string_lossy().into_owned());
    }
    if let Some(n) = max_parallel {
        executor_config.max_parallel = n;
    }
    if let Some(secs) = timeout {
        executor_config.timeout = Some(Duration::from_secs(secs));
    }
    if continue_on_error {
        executor_config.error_policy = ErrorPolicy::Continue;
    }

    execute_line_count(&job, executor_config).await
}

async fn run_demo(files: usize) -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_fixture_files(dir.path(), files)?;
    debug!("generated {} fixture files in {}", files, dir.path().display());

    let job = JobConfig::new().with("data_dir", dir.path().to_string_lossy().into_owned());
    execute_line_count(&job, ExecutorConfig::default()).await
}

async fn execute_line_count(job: &JobConfig, config: ExecutorConfig) -> Result<()> {
    let sources = DirEnumerator::new().enumerate(job)?;
    let workers = build_workers(&LineCountFactory::<PathSource>::new(), sources);

    let progress_bar = create_progress_bar(workers.len());
    progress_bar.set_message("Mapping inputs");
    let bar = progress_bar.clone();

    let mut executor =
        Executor::new(config).with_progress(Arc::new(move |_outcome| bar.inc(1)));

    // Ctrl-C cancels in-flight and queued map calls.
    let cancel = executor.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = executor.execute(workers).await?;
    progress_bar.finish_with_message(report.summary());

    println!("There are {} lines", report.result);
    if report.failed() > 0 {
        println!("Skipped {} unreadable input(s):", report.failed());
        for outcome in report.outcomes.iter().filter(|o| !o.is_success()) {
            println!("  {}: {}", outcome.locator, outcome.error.as_deref().unwrap_or("unknown"));
        }
    }
    Ok(())
}

fn write_fixture_files(dir: &std::path::Path, count: usize) -> Result<()> {
    let mut rng = rand::rng();
    for i in 0..count {
        let lines = rng.random_range(0..=100);
        std::fs::write(dir.join(i.to_string()), "\n".repeat(lines))?;
    }
    Ok(())
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("█▓▒░ "),
    );
    pb
}
