//! Rendering a single commit as a patch
//!
//! The extractor only runs read-only git commands. Its output is the patch
//! (unified diff with a commit-message header, kept as the exact bytes git
//! printed) and the commit's clipped metadata; bucketing is left to the
//! classifier.

use std::borrow::Cow;
use std::path::Path;

use crate::command::CommandRunner;
use crate::commit::Commit;
use crate::error::Result;
use crate::git;

/// A commit together with its rendered patch
#[derive(Debug, Clone)]
pub struct Extracted {
    pub commit: Commit,
    pub bytes: Vec<u8>,
}

impl Extracted {
    /// The patch as text, for classification only
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// A classified patch, ready to be written exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub bucket: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Patch {
    pub fn new(commit: &Commit, bucket: String, bytes: Vec<u8>) -> Self {
        Self {
            bucket,
            file_name: commit.patch_file_name(),
            bytes,
        }
    }
}

pub struct PatchExtractor<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> PatchExtractor<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Read metadata and patch of `sha` from the repository at `repo_dir`
    pub fn extract(&self, repo_dir: &Path, sha: &str) -> Result<Extracted> {
        let commit = git::commit_metadata(self.runner, repo_dir, sha)?;
        let bytes = git::format_patch(self.runner, repo_dir, sha)?;
        Ok(Extracted { commit, bytes })
    }
}
