//! Orchestrator for a complete extraction run
//!
//! This module ties the pieces together behind one call:
//! 1. Validate the configuration
//! 2. Resolve the upstream and head manifests, and check that the output
//!    root holds none of the head checkouts
//! 3. Prepare a clean output root (and remove a stale database)
//! 4. Open the shared sinks and build the `RunContext`
//! 5. Plan one job per head repository and run them on the worker pool

use std::fs;
use std::path::Path;

use log::{debug, info};

use super::classify::FeatureClassifier;
use super::RunContext;
use crate::cancel::CancellationToken;
use crate::command::CommandRunner;
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::manifest::ManifestResolver;
use crate::scheduler::{plan_jobs, FinishHook, JobScheduler, RunSummary};
use crate::sink::SharedSinks;

/// Execute a complete extraction run.
///
/// Everything under `config.output_root` is replaced. The returned summary
/// reports per-repository failures; an `Err` means the run could not start.
/// `on_start` receives the number of jobs about to be dispatched.
pub fn execute_extract(
    config: &ExtractConfig,
    resolver: &dyn ManifestResolver,
    runner: Box<dyn CommandRunner>,
    cancel: CancellationToken,
    on_start: impl FnOnce(usize),
    on_finish: Option<FinishHook>,
) -> Result<RunSummary> {
    config.validate()?;

    let upstream = resolver.resolve(&config.upstream_manifest)?;
    let head = resolver.resolve(&config.head_manifest)?;
    debug!(
        "upstream manifest has {} projects, head has {}",
        upstream.len(),
        head.len()
    );
    config.check_output_spares(head.repo_paths())?;

    prepare_output(&config.output_root, config.mode.database())?;

    let ctx = RunContext {
        workspace: config.workspace.clone(),
        output_root: config.output_root.clone(),
        mode: config.mode.clone(),
        runner,
        classifier: FeatureClassifier::new()?,
        sinks: SharedSinks::open(&config.output_root, config.mode.database())?,
    };

    let jobs = plan_jobs(&upstream, &head);
    info!(
        "{} repositories to process, {} not in upstream, {} workers",
        jobs.len(),
        jobs.iter().filter(|job| job.upstream.is_none()).count(),
        config.workers
    );
    on_start(jobs.len());

    let mut scheduler = JobScheduler::new(config.workers, cancel);
    if let Some(hook) = on_finish {
        scheduler = scheduler.on_finish(hook);
    }
    scheduler.run(&ctx, jobs)
}

/// Start from an empty output root, and no leftover database
fn prepare_output(output_root: &Path, database: Option<&Path>) -> Result<()> {
    if output_root.exists() {
        debug!("clearing {}", output_root.display());
        fs::remove_dir_all(output_root)?;
    }
    fs::create_dir_all(output_root)?;

    if let Some(db) = database {
        if db.exists() {
            debug!("removing stale database {}", db.display());
            fs::remove_file(db)?;
        }
        if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
