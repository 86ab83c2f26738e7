//! Processing one repository
//!
//! This is the body of a repository job:
//!
//! 1.  Resolve the commits head carries beyond upstream.
//! 2.  Extract and classify each one, in resolver order.
//! 3.  In patch mode, write each patch and append its ordering record before
//!     moving on to the next commit. In analysis mode, insert all rows in one
//!     transaction and then append the ordering records.
//!
//! Any error ends the job. Files already written stay on disk.

use log::{debug, info};

use super::extract::{Extracted, Patch, PatchExtractor};
use super::resolve::CommitSetResolver;
use super::{write, RunContext};
use crate::config::RunMode;
use crate::error::{Error, Result};
use crate::sink::analysis::{contributor_domains, AnalysisRow};
use crate::sink::ordering_log::OrderingRecord;

/// What a repository job produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// Head carries nothing beyond upstream
    NoNewCommits,
    /// This many patches were emitted
    Processed(usize),
}

/// Run the pipeline for the repository at `repo` between two revisions
pub fn process_repository(
    ctx: &RunContext,
    repo: &str,
    upstream: &str,
    head: &str,
) -> Result<RepoOutcome> {
    let repo_dir = ctx.workspace.repo_dir(repo);
    if upstream != head && !repo_dir.is_dir() {
        return Err(Error::MissingRepository {
            repo: repo.to_string(),
            path: repo_dir,
        });
    }

    let runner = ctx.runner.as_ref();
    let shas = CommitSetResolver::new(runner).new_commits(&repo_dir, upstream, head)?;
    if shas.is_empty() {
        debug!("{}: nothing new between {} and {}", repo, upstream, head);
        return Ok(RepoOutcome::NoNewCommits);
    }

    let extractor = PatchExtractor::new(runner);
    let count = match &ctx.mode {
        RunMode::Patches => {
            for sha in &shas {
                let extracted = extractor.extract(&repo_dir, sha)?;
                emit_patch(ctx, repo, extracted)?;
            }
            shas.len()
        }
        RunMode::Analysis { .. } => {
            let extracted = shas
                .iter()
                .map(|sha| extractor.extract(&repo_dir, sha))
                .collect::<Result<Vec<_>>>()?;
            record_analysis(ctx, repo, &extracted)?;
            extracted.len()
        }
    };

    info!("{}: {} new patches", repo, count);
    Ok(RepoOutcome::Processed(count))
}

fn emit_patch(ctx: &RunContext, repo: &str, extracted: Extracted) -> Result<()> {
    let bucket = ctx.classifier.classify(&extracted.text());
    let record = OrderingRecord::new(repo, &bucket, &extracted.commit.patch_base_name());
    let patch = Patch::new(&extracted.commit, bucket, extracted.bytes);

    let path = write::write_patch(&ctx.output_root, &patch.bucket, &patch.file_name, &patch.bytes)?;
    debug!("{}: wrote {}", repo, path.display());

    ctx.sinks.append(&record)
}

fn record_analysis(ctx: &RunContext, repo: &str, extracted: &[Extracted]) -> Result<()> {
    let domains = contributor_domains(extracted.iter().map(|e| &e.commit));
    for (domain, commits) in &domains {
        info!("{}: {} commits from {}", repo, commits, domain);
    }

    let classifier = &ctx.classifier;
    let (rows, records): (Vec<AnalysisRow>, Vec<OrderingRecord>) = extracted
        .iter()
        .map(|e| {
            let bucket = classifier.classify(&e.text());
            (
                AnalysisRow::new(&e.commit, repo, &bucket),
                OrderingRecord::new(repo, &bucket, &e.commit.patch_base_name()),
            )
        })
        .unzip();

    ctx.sinks.record_analysis(repo, &rows, &records)
}
