//! Shared test utilities for integration and E2E tests.
//!
//! `WorkspaceFixture` builds a real workspace in a temporary directory: a
//! `.repo` control directory, git checkouts, an upstream manifest and the
//! current (head) manifest. Tests need `git` on `PATH`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = WorkspaceFixture::new();
//!     let mut cmd = fixture.command();
//!     cmd.arg("extract").arg("--upstream").arg(fixture.upstream_manifest());
//! }
//! ```
//!
//! The `core` checkout has this history:
//!
//! ```text
//! base ── "Fix overflow" (tag v1, upstream)
//!   └──── "Backport overflow fix" ── "Add networking fix" ── "Tweak build" (main, head)
//! ```
//!
//! The backport carries the same diff as the upstream fix, so only the last
//! two commits are new.

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::WorkspaceFixture;
}

/// Email of the in-house author in the fixture history
#[allow(dead_code)]
pub const HOUSE_EMAIL: &str = "dev@corp.io";

/// Email of the external author of "Tweak build"
#[allow(dead_code)]
pub const VENDOR_EMAIL: &str = "ext@vendor.com";

/// Run git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    String::from_utf8_lossy(&git_bytes(dir, args)).into_owned()
}

/// Like `git`, returning stdout exactly as printed
pub fn git_bytes(dir: &Path, args: &[&str]) -> Vec<u8> {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Fixture",
            "-c",
            &format!("user.email={}", HOUSE_EMAIL),
            "-c",
            "commit.gpgsign=false",
            "-c",
            "tag.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output.stdout
}

/// Write `content` to `file` and commit it on the current branch
pub fn commit_file(
    dir: &Path,
    file: &str,
    content: impl AsRef<[u8]>,
    message: &str,
    author: Option<&str>,
) {
    std::fs::write(dir.join(file), content).expect("Failed to write file");
    git(dir, &["add", file]);
    let mut args = vec!["commit", "-q", "-m", message];
    if let Some(author) = author {
        args.push("--author");
        args.push(author);
    }
    git(dir, &args);
}

/// A project line in both manifests: path, upstream revision, head revision
struct Project {
    path: String,
    upstream: Option<String>,
    head: String,
}

/// A temporary workspace with a scripted `core` repository.
pub struct WorkspaceFixture {
    temp_dir: assert_fs::TempDir,
    projects: Vec<Project>,
}

impl WorkspaceFixture {
    /// Workspace with the `core` checkout, an unchanged `same` project and a
    /// head-only `extra` project.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child(".repo")
            .create_dir_all()
            .expect("Failed to create control directory");

        let core = temp_dir.child("core");
        core.create_dir_all().expect("Failed to create checkout");
        build_core_history(core.path());

        let mut fixture = Self {
            temp_dir,
            projects: Vec::new(),
        };
        fixture.projects.push(Project {
            path: "core".to_string(),
            upstream: Some("v1".to_string()),
            head: "main".to_string(),
        });
        fixture.projects.push(Project {
            path: "same".to_string(),
            upstream: Some("r1".to_string()),
            head: "r1".to_string(),
        });
        fixture.projects.push(Project {
            path: "extra".to_string(),
            upstream: None,
            head: "main".to_string(),
        });
        fixture.write_manifests();
        fixture
    }

    /// Add a project present in both manifests
    #[allow(dead_code)]
    pub fn with_project(mut self, path: &str, upstream: &str, head: &str) -> Self {
        self.projects.push(Project {
            path: path.to_string(),
            upstream: Some(upstream.to_string()),
            head: head.to_string(),
        });
        self.write_manifests();
        self
    }

    fn write_manifests(&self) {
        let mut upstream =
            String::from("<manifest>\n  <remote name=\"origin\" fetch=\"..\"/>\n");
        let mut head =
            String::from("<manifest>\n  <default revision=\"main\" remote=\"origin\"/>\n");
        for p in &self.projects {
            if let Some(rev) = &p.upstream {
                upstream.push_str(&format!(
                    "  <project name=\"platform/{0}\" path=\"{0}\" revision=\"{1}\"/>\n",
                    p.path, rev
                ));
            }
            head.push_str(&format!(
                "  <project name=\"platform/{0}\" path=\"{0}\" revision=\"{1}\"/>\n",
                p.path, p.head
            ));
        }
        upstream.push_str("</manifest>\n");
        head.push_str("</manifest>\n");

        self.temp_dir
            .child("upstream.xml")
            .write_str(&upstream)
            .expect("Failed to write upstream manifest");
        self.temp_dir
            .child(".repo/manifest.xml")
            .write_str(&head)
            .expect("Failed to write head manifest");
    }

    /// Workspace root
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn upstream_manifest(&self) -> PathBuf {
        self.path().join("upstream.xml")
    }

    /// Default output root
    pub fn output(&self) -> PathBuf {
        self.path().join("patches")
    }

    /// Create a command running in this workspace, isolated from the
    /// caller's `PATCHSORT_*` environment.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("patchsort");
        cmd.current_dir(self.path())
            .env_remove("PATCHSORT_WORKSPACE")
            .env_remove("PATCHSORT_OUTPUT")
            .env_remove("PATCHSORT_JOBS")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn build_core_history(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/base"]);
    commit_file(dir, "net.c", "int sock;\n", "Initial import", None);

    git(dir, &["checkout", "-q", "-b", "upstream"]);
    commit_file(dir, "fix.c", "int fixed;\n", "Fix overflow", None);
    git(dir, &["tag", "v1"]);

    git(dir, &["checkout", "-q", "-b", "main", "base"]);
    commit_file(dir, "fix.c", "int fixed;\n", "Backport overflow fix", None);
    commit_file(
        dir,
        "net.c",
        "int sock;\n/* ACOS_MOD_FEATURE {networking fix} */\nint retries;\n",
        "Add networking fix",
        None,
    );
    commit_file(
        dir,
        "Makefile",
        "CFLAGS += -O2\n",
        "Tweak build",
        Some(&format!("Vendor <{}>", VENDOR_EMAIL)),
    );
}

/// Files under `dir`, as paths relative to it, sorted
#[allow(dead_code)]
pub fn list_files(dir: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).expect("Failed to read directory") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_builds_workspace() {
        let fixture = WorkspaceFixture::new();
        assert!(fixture.path().join(".repo/manifest.xml").is_file());
        assert!(fixture.upstream_manifest().is_file());
        assert!(fixture.path().join("core/.git").is_dir());
    }

    #[test]
    fn test_fixture_history_has_one_equivalent_commit() {
        let fixture = WorkspaceFixture::new();
        let cherry = git(&fixture.path().join("core"), &["cherry", "v1", "main"]);
        let marks: Vec<char> = cherry.lines().filter_map(|l| l.chars().next()).collect();
        assert_eq!(marks, vec!['-', '+', '+']);
    }
}
