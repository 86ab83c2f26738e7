//! Resolving the commits a repository's head carries beyond upstream
//!
//! A commit is "new" when it is reachable from head, not reachable from
//! upstream, and no commit on the upstream side introduces the same change.
//! Equivalence is patch-id based: hash, author and date are irrelevant, only
//! the diff content counts. `git cherry` performs both steps.

use std::path::Path;

use log::debug;

use crate::command::CommandRunner;
use crate::error::Result;
use crate::git::{self, CherryMark};

/// Computes the genuinely new commits of one repository
pub struct CommitSetResolver<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> CommitSetResolver<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Full hashes of commits in `head` with no equivalent in `upstream`,
    /// oldest first.
    ///
    /// Identical revision strings resolve to an empty set without running
    /// any command.
    pub fn new_commits(&self, repo_dir: &Path, upstream: &str, head: &str) -> Result<Vec<String>> {
        if upstream == head {
            return Ok(Vec::new());
        }

        let lines = git::cherry(self.runner, repo_dir, upstream, head)?;
        let total = lines.len();
        let fresh: Vec<String> = lines
            .into_iter()
            .filter(|l| l.mark == CherryMark::New)
            .map(|l| l.sha)
            .collect();

        debug!(
            "{}: {} commits ahead of {}, {} already upstream",
            repo_dir.display(),
            total,
            upstream,
            total - fresh.len()
        );

        Ok(fresh)
    }
}
