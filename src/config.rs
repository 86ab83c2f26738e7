//! # Run Configuration
//!
//! `ExtractConfig` is the validated configuration of one extraction run. The
//! CLI builds it from flags and environment variables; library callers and
//! tests construct it directly.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::workspace::{Workspace, CONTROL_DIR};

/// Where extracted commits go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Write patch files into the bucketed output tree
    Patches,
    /// Record one row per commit in the SQLite store at `database`
    Analysis { database: PathBuf },
}

impl RunMode {
    pub fn database(&self) -> Option<&Path> {
        match self {
            RunMode::Patches => None,
            RunMode::Analysis { database } => Some(database),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub workspace: Workspace,
    pub upstream_manifest: PathBuf,
    pub head_manifest: PathBuf,
    pub output_root: PathBuf,
    /// Number of repositories processed concurrently
    pub workers: usize,
    pub mode: RunMode,
}

/// Worker count used when none is configured: the host's core count
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ExtractConfig {
    /// Configuration with default output (`<workspace>/patches`), worker
    /// count and mode, and the workspace's current manifest as head.
    pub fn new(workspace: Workspace, upstream_manifest: PathBuf) -> Self {
        Self {
            head_manifest: workspace.current_manifest(),
            output_root: workspace.root().join("patches"),
            workspace,
            upstream_manifest,
            workers: default_workers(),
            mode: RunMode::Patches,
        }
    }

    /// Check the configuration before anything is written.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config {
                message: "worker count must be at least 1".to_string(),
            });
        }

        for (role, path) in [
            ("upstream", &self.upstream_manifest),
            ("head", &self.head_manifest),
        ] {
            if !path.is_file() {
                return Err(Error::Config {
                    message: format!("{} manifest not found: {}", role, path.display()),
                });
            }
        }

        // The output tree is wiped at the start of every run, so it must not
        // hold the workspace itself.
        let output = self.resolved_output()?;
        let root = resolve(self.workspace.root())?;
        if root.starts_with(&output) {
            return Err(Error::Config {
                message: format!(
                    "output directory {} contains the workspace root {}",
                    output.display(),
                    root.display()
                ),
            });
        }
        if output.starts_with(root.join(CONTROL_DIR)) {
            return Err(Error::Config {
                message: format!(
                    "output directory {} is inside the workspace control directory",
                    output.display()
                ),
            });
        }

        Ok(())
    }

    /// Reject an output root that equals or contains a repository checkout.
    ///
    /// Needs the resolved manifest, so it runs after `validate`.
    pub fn check_output_spares<'a, I>(&self, repo_paths: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let output = self.resolved_output()?;
        let root = resolve(self.workspace.root())?;
        for repo in repo_paths {
            let checkout = resolve(&root.join(repo))?;
            if checkout.starts_with(&output) {
                return Err(Error::Config {
                    message: format!(
                        "output directory {} contains the checkout of {}",
                        output.display(),
                        repo
                    ),
                });
            }
        }
        Ok(())
    }

    /// The output root as an absolute path with symlinks and `..` resolved
    pub fn resolved_output(&self) -> Result<PathBuf> {
        resolve(&self.output_root)
    }
}

/// Make `path` absolute and resolve it against the filesystem.
///
/// The longest existing prefix is canonicalized, which follows symlinks the
/// way the OS will. The components after it do not exist yet, so `.` and
/// `..` among them are folded lexically.
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let components: Vec<Component> = absolute.components().collect();
    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        if let Ok(mut resolved) = prefix.canonicalize() {
            for component in &components[split..] {
                match component {
                    Component::CurDir => {}
                    Component::ParentDir => {
                        resolved.pop();
                    }
                    other => resolved.push(other),
                }
            }
            return Ok(resolved);
        }
    }
    Ok(absolute)
}
