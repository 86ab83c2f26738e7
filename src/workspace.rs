//! Workspace root discovery
//!
//! A workspace is a directory containing a `.repo` control directory, with
//! each repository checked out at its manifest path below the root.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the control directory that marks a workspace root
pub const CONTROL_DIR: &str = ".repo";

/// Manifest file of the currently checked-out snapshot, relative to the root
pub const CURRENT_MANIFEST: &str = ".repo/manifest.xml";

/// A located multi-repository workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace containing `start` by walking up its ancestors.
    ///
    /// Returns `Error::Environment` when no ancestor holds a `.repo`
    /// directory.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = if start.is_absolute() {
            start.to_path_buf()
        } else {
            std::env::current_dir()?.join(start)
        };

        start
            .ancestors()
            .find(|dir| dir.join(CONTROL_DIR).is_dir())
            .map(|root| Self {
                root: root.to_path_buf(),
            })
            .ok_or_else(|| Error::Environment {
                message: format!("no {} directory above {}", CONTROL_DIR, start.display()),
            })
    }

    /// The workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checkout directory of the repository at manifest path `repo_path`
    pub fn repo_dir(&self, repo_path: &str) -> PathBuf {
        self.root.join(repo_path)
    }

    /// The manifest describing the current checkout
    pub fn current_manifest(&self) -> PathBuf {
        self.root.join(CURRENT_MANIFEST)
    }
}
