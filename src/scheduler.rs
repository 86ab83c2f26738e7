//! # Job Scheduling
//!
//! One job per repository, run on a fixed-size `rayon` pool. Each job moves
//! through
//!
//! ```text
//! Pending -> Running -> Skipped(NoNewCommits) | Completed(count) | Failed(error)
//!         |          \-> Cancelled
//!         \-> Skipped(NotInUpstream) | Cancelled
//! ```
//!
//! and hands its final state back to the scheduler, which folds all of them
//! into a `RunSummary` once every job has resolved. A failed job never stops
//! its siblings.
//!
//! Cancellation is cooperative. The scheduler checks the token before
//! starting each job, so jobs that have not started become `Cancelled`
//! without running. Jobs already running end when their command runner kills
//! the in-flight child process.

use log::{debug, error, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::phases::processing::{process_repository, RepoOutcome};
use crate::phases::RunContext;

/// Why a repository produced no patches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The repository is in the head manifest only
    NotInUpstream,
    /// Head carries nothing beyond upstream
    NoNewCommits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Skipped(SkipReason),
    Completed(usize),
    Failed(String),
    Cancelled,
}

/// Extraction of one repository between an upstream and a head revision
#[derive(Debug, Clone)]
pub struct Job {
    pub repo_path: String,
    /// `None` when the repository is absent from the upstream manifest
    pub upstream: Option<String>,
    pub head: String,
    state: JobState,
}

impl Job {
    pub fn new(repo_path: &str, upstream: &str, head: &str) -> Self {
        Self {
            repo_path: repo_path.to_string(),
            upstream: Some(upstream.to_string()),
            head: head.to_string(),
            state: JobState::Pending,
        }
    }

    /// A repository only the head manifest knows about. It resolves to
    /// `Skipped(NotInUpstream)` without touching git.
    pub fn head_only(repo_path: &str, head: &str) -> Self {
        Self {
            repo_path: repo_path.to_string(),
            upstream: None,
            head: head.to_string(),
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    fn transition(&mut self, next: JobState) {
        debug!("{}: {:?} -> {:?}", self.repo_path, self.state, next);
        self.state = next;
    }

    /// Run the job to a final state
    pub fn run(mut self, ctx: &RunContext, cancel: &CancellationToken) -> Self {
        let upstream = match self.upstream.clone() {
            Some(upstream) => upstream,
            None => {
                debug!("{}: not in upstream manifest", self.repo_path);
                self.transition(JobState::Skipped(SkipReason::NotInUpstream));
                return self;
            }
        };
        if cancel.is_cancelled() {
            self.transition(JobState::Cancelled);
            return self;
        }

        self.transition(JobState::Running);
        let next = match process_repository(ctx, &self.repo_path, &upstream, &self.head) {
            Ok(RepoOutcome::NoNewCommits) => JobState::Skipped(SkipReason::NoNewCommits),
            Ok(RepoOutcome::Processed(count)) => JobState::Completed(count),
            Err(e) if e.is_cancelled() => JobState::Cancelled,
            Err(e) => {
                error!("{}: {}", self.repo_path, e);
                JobState::Failed(e.to_string())
            }
        };
        self.transition(next);
        self
    }
}

/// One job per head repository, paired with its upstream revision when
/// the upstream manifest has one.
pub fn plan_jobs(upstream: &Manifest, head: &Manifest) -> Vec<Job> {
    head.entries()
        .map(|entry| match upstream.revision(&entry.repo_path) {
            Some(upstream_rev) => Job::new(&entry.repo_path, upstream_rev, &entry.revision),
            None => Job::head_only(&entry.repo_path, &entry.revision),
        })
        .collect()
}

/// A repository whose job failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRepo {
    pub repo: String,
    pub error: String,
}

/// Aggregate result of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub skipped_not_in_upstream: usize,
    pub skipped_no_new_commits: usize,
    pub completed: usize,
    pub total_patches: usize,
    pub failed: Vec<FailedRepo>,
    pub cancelled: usize,
    /// Whether an interrupt stopped the run early
    pub interrupted: bool,
}

impl RunSummary {
    /// Fold one finished job into the summary
    pub fn record(&mut self, job: &Job) {
        match job.state() {
            JobState::Skipped(SkipReason::NotInUpstream) => self.skipped_not_in_upstream += 1,
            JobState::Skipped(SkipReason::NoNewCommits) => self.skipped_no_new_commits += 1,
            JobState::Completed(count) => {
                self.completed += 1;
                self.total_patches += count;
            }
            JobState::Failed(error) => self.failed.push(FailedRepo {
                repo: job.repo_path.clone(),
                error: error.clone(),
            }),
            JobState::Cancelled => self.cancelled += 1,
            JobState::Pending | JobState::Running => {
                warn!("{}: job finished in state {:?}", job.repo_path, job.state())
            }
        }
    }

    /// True when every dispatched job finished without failure or interruption
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted && self.cancelled == 0
    }
}

/// Called from a worker thread each time a job reaches its final state
pub type FinishHook = Box<dyn Fn(&Job) + Send + Sync>;

/// Runs repository jobs on a bounded worker pool
pub struct JobScheduler {
    workers: usize,
    cancel: CancellationToken,
    on_finish: Option<FinishHook>,
}

impl JobScheduler {
    pub fn new(workers: usize, cancel: CancellationToken) -> Self {
        Self {
            workers,
            cancel,
            on_finish: None,
        }
    }

    /// Call `hook` from the worker thread as each job finishes
    pub fn on_finish<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Job) + Send + Sync + 'static,
    {
        self.on_finish = Some(Box::new(hook));
        self
    }

    /// Run every job and aggregate the results
    pub fn run(&self, ctx: &RunContext, jobs: Vec<Job>) -> Result<RunSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("patchsort-worker-{}", i))
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to start worker pool: {}", e),
            })?;

        let finished: Vec<Job> = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    let job = job.run(ctx, &self.cancel);
                    if let Some(hook) = &self.on_finish {
                        hook(&job);
                    }
                    job
                })
                .collect()
        });

        let mut summary = RunSummary {
            interrupted: self.cancel.is_cancelled(),
            ..RunSummary::default()
        };
        for job in &finished {
            summary.record(job);
        }
        Ok(summary)
    }
}
