//! Extract command implementation
//!
//! Runs a complete extraction from the command line:
//! 1. Locate the workspace
//! 2. Build and validate the run configuration
//! 3. Install the Ctrl-C handler that cancels the run
//! 4. Run every repository job, with a progress bar unless `--quiet`
//! 5. Print the summary and fail the process on any failure or interrupt

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::path::PathBuf;
use std::time::Instant;

use patchsort::cancel::CancellationToken;
use patchsort::command::SystemCommandRunner;
use patchsort::config::{ExtractConfig, RunMode};
use patchsort::manifest::XmlManifestResolver;
use patchsort::output::{emoji, render_summary, OutputConfig};
use patchsort::phases::orchestrator;
use patchsort::scheduler::Job;
use patchsort::sink::analysis::DEFAULT_DATABASE;
use patchsort::workspace::Workspace;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Manifest describing the upstream snapshot
    #[arg(short, long, value_name = "FILE")]
    pub upstream: PathBuf,

    /// Manifest describing the head snapshot (defaults to the workspace's current manifest)
    #[arg(long, value_name = "FILE")]
    pub head: Option<PathBuf>,

    /// Directory inside the workspace to start discovery from (defaults to current directory)
    #[arg(short, long, value_name = "DIR", env = "PATCHSORT_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Output directory, cleared at the start of the run (defaults to <workspace>/patches)
    #[arg(short, long, value_name = "DIR", env = "PATCHSORT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Number of repositories processed concurrently (defaults to the core count)
    #[arg(short, long, value_name = "N", env = "PATCHSORT_JOBS")]
    pub jobs: Option<usize>,

    /// Record commits in a SQLite database instead of writing patch files
    #[arg(long)]
    pub analysis: bool,

    /// Database path for --analysis (defaults to <output>/patches.db)
    #[arg(long, value_name = "FILE", requires = "analysis")]
    pub database: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress progress and summary output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the extract command
pub fn execute(args: ExtractArgs, color_flag: &str) -> Result<()> {
    let start_time = Instant::now();
    let out = OutputConfig::from_env_and_flag(color_flag);

    let start = match args.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let workspace = Workspace::discover(&start)?;

    let config = build_config(
        workspace,
        args.upstream,
        args.head,
        args.output,
        args.jobs,
        args.analysis,
        args.database,
    );

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Ctrl-C handler not installed: {}", e);
    }

    if !args.quiet && !args.json {
        println!(
            "{} Extracting into {}",
            emoji(&out, "🔍", "[SCAN]"),
            config.output_root.display()
        );
    }

    let progress = if args.quiet || args.json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")?
                .progress_chars("=> "),
        );
        bar
    };
    let start_bar = progress.clone();
    let finish_bar = progress.clone();

    let summary = orchestrator::execute_extract(
        &config,
        &XmlManifestResolver,
        Box::new(SystemCommandRunner::new(cancel.clone())),
        cancel,
        move |total| start_bar.set_length(total as u64),
        Some(Box::new(move |job: &Job| {
            finish_bar.set_message(job.repo_path.clone());
            finish_bar.inc(1);
        })),
    )?;
    progress.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !args.quiet {
        print!("{}", render_summary(&out, &summary, &config.output_root));
        println!("   Finished in {:.2}s", start_time.elapsed().as_secs_f64());
    }

    if summary.interrupted {
        anyhow::bail!("Run interrupted");
    }
    if !summary.failed.is_empty() {
        anyhow::bail!("{} repositories failed", summary.failed.len());
    }
    Ok(())
}

fn build_config(
    workspace: Workspace,
    upstream: PathBuf,
    head: Option<PathBuf>,
    output: Option<PathBuf>,
    jobs: Option<usize>,
    analysis: bool,
    database: Option<PathBuf>,
) -> ExtractConfig {
    let mut config = ExtractConfig::new(workspace, upstream);
    if let Some(head) = head {
        config.head_manifest = head;
    }
    if let Some(output) = output {
        config.output_root = output;
    }
    if let Some(jobs) = jobs {
        config.workers = jobs;
    }
    if analysis {
        let database = database.unwrap_or_else(|| config.output_root.join(DEFAULT_DATABASE));
        config.mode = RunMode::Analysis { database };
    }
    config
}
