//! Git invocations used by the pipeline and parsing of their output
//!
//! Every function here is read-only with respect to the repository and goes
//! through a `CommandRunner`, so the parsing can be exercised with scripted
//! output.

use std::path::Path;

use crate::command::CommandRunner;
use crate::commit::Commit;
use crate::error::{Error, Result};

const GIT: &str = "git";

/// Separator placed between fields of the `git log` metadata format
const FIELD_SEP: char = '\u{1f}';

/// `%H %h %s %f %ae`, unit-separated
const METADATA_FORMAT: &str = "--format=%H%x1f%h%x1f%s%x1f%f%x1f%ae";

/// How `git cherry` classified a commit from the head side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CherryMark {
    /// No patch-equivalent commit exists upstream
    New,
    /// An equivalent change is already upstream
    Equivalent,
}

/// One line of `git cherry` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CherryLine {
    pub mark: CherryMark,
    pub sha: String,
}

/// Run `git cherry <upstream> <head>` in `repo_dir`.
///
/// Lists commits reachable from `head` but not from `upstream`, oldest first,
/// each marked by whether a patch-equivalent change exists upstream.
pub fn cherry(
    runner: &dyn CommandRunner,
    repo_dir: &Path,
    upstream: &str,
    head: &str,
) -> Result<Vec<CherryLine>> {
    let stdout = runner.run(repo_dir, GIT, &["cherry", upstream, head])?;
    Ok(parse_cherry(&stdout))
}

/// Parse `git cherry` output. Lines that are not `+ <sha>` or `- <sha>` are
/// ignored.
pub fn parse_cherry(output: &str) -> Vec<CherryLine> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let mark = match parts.next()? {
                "+" => CherryMark::New,
                "-" => CherryMark::Equivalent,
                _ => return None,
            };
            let sha = parts.next()?.to_string();
            Some(CherryLine { mark, sha })
        })
        .collect()
}

/// Render `sha` as a single-commit mailbox patch with its message header.
///
/// The bytes are exactly what git printed; patches of binary-ish or
/// non-UTF-8 files must survive unchanged.
pub fn format_patch(runner: &dyn CommandRunner, repo_dir: &Path, sha: &str) -> Result<Vec<u8>> {
    runner.run_bytes(repo_dir, GIT, &["format-patch", "-1", "--stdout", sha])
}

/// Read the metadata of `sha`, including the paths it touches
pub fn commit_metadata(runner: &dyn CommandRunner, repo_dir: &Path, sha: &str) -> Result<Commit> {
    let header = runner.run(
        repo_dir,
        GIT,
        &["log", "-1", "--no-color", METADATA_FORMAT, sha],
    )?;
    let files = runner.run(
        repo_dir,
        GIT,
        &["diff-tree", "--no-commit-id", "--name-only", "-r", "--root", sha],
    )?;
    let changed: Vec<String> = files
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    parse_metadata(&header, &changed).ok_or_else(|| Error::Command {
        command: format!("git log -1 {}", sha),
        dir: repo_dir.to_path_buf(),
        status: "unexpected output".to_string(),
        stderr: header.trim().to_string(),
    })
}

/// Parse the unit-separated metadata line produced with `METADATA_FORMAT`
pub fn parse_metadata(header: &str, changed_files: &[String]) -> Option<Commit> {
    let line = header.lines().next()?;
    let fields: Vec<&str> = line.split(FIELD_SEP).collect();
    if fields.len() != 5 || fields[0].is_empty() {
        return None;
    }
    Some(Commit::new(
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        fields[4],
        changed_files,
    ))
}
