//! Scripted `CommandRunner` for unit tests
//!
//! Rules match on the repository directory suffix and on a prefix of the
//! rendered command line. The first matching rule answers; anything
//! unscripted fails like a real command would.

use std::path::Path;
use std::sync::Mutex;

use crate::cancel::CancellationToken;
use crate::command::{command_line, CommandRunner};
use crate::error::{Error, Result};

enum Reply {
    Stdout(Vec<u8>),
    Fail(String),
    /// Cancel the token, then report cancellation like a killed child
    Cancel(CancellationToken),
}

struct Rule {
    dir: Option<String>,
    prefix: String,
    reply: Reply,
}

/// A fake commit for `FakeRunner::with_repo`
pub struct FakeCommit {
    pub sha: &'static str,
    pub subject: &'static str,
    pub email: &'static str,
    /// Added line placed in the patch body
    pub added: &'static str,
    /// Whether an equivalent change is already upstream
    pub upstream_equivalent: bool,
}

#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(mut self, dir: Option<&str>, prefix: &str, reply: Reply) -> Self {
        self.rules.push(Rule {
            dir: dir.map(str::to_string),
            prefix: prefix.to_string(),
            reply,
        });
        self
    }

    pub fn on(self, prefix: &str, stdout: &str) -> Self {
        self.rule(None, prefix, Reply::Stdout(stdout.as_bytes().to_vec()))
    }

    pub fn on_in(self, dir: &str, prefix: &str, stdout: &str) -> Self {
        self.on_bytes_in(dir, prefix, stdout.as_bytes())
    }

    pub fn on_bytes_in(self, dir: &str, prefix: &str, stdout: &[u8]) -> Self {
        self.rule(Some(dir), prefix, Reply::Stdout(stdout.to_vec()))
    }

    pub fn fail_in(self, dir: &str, prefix: &str, stderr: &str) -> Self {
        self.rule(Some(dir), prefix, Reply::Fail(stderr.to_string()))
    }

    pub fn cancel_in(self, dir: &str, prefix: &str, token: CancellationToken) -> Self {
        self.rule(Some(dir), prefix, Reply::Cancel(token))
    }

    /// Script a repository: `git cherry` plus metadata, file list and patch
    /// text for each commit.
    pub fn with_repo(
        mut self,
        dir: &str,
        upstream: &str,
        head: &str,
        commits: &[FakeCommit],
    ) -> Self {
        let cherry: String = commits
            .iter()
            .map(|c| {
                let mark = if c.upstream_equivalent { '-' } else { '+' };
                format!("{} {}\n", mark, c.sha)
            })
            .collect();
        self = self.on_in(dir, &format!("git cherry {} {}", upstream, head), &cherry);

        for c in commits {
            let sanitized: String = c
                .subject
                .chars()
                .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
                .collect();
            let abbrev = &c.sha[..c.sha.len().min(7)];
            let header = format!(
                "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\n",
                c.sha, abbrev, c.subject, sanitized, c.email
            );
            let patch = format!(
                "From {} Mon Sep 17 00:00:00 2001\nSubject: [PATCH] {}\n---\n\
                 diff --git a/file.c b/file.c\n--- a/file.c\n+++ b/file.c\n\
                 @@ -1 +1,2 @@\n context\n+{}\n",
                c.sha, c.subject, c.added
            );
            let log = format!(
                "git log -1 --no-color --format=%H%x1f%h%x1f%s%x1f%f%x1f%ae {}",
                c.sha
            );
            let diff_tree = format!("git diff-tree --no-commit-id --name-only -r --root {}", c.sha);
            self = self
                .on_in(dir, &log, &header)
                .on_in(dir, &diff_tree, "file.c\n")
                .on_in(dir, &format!("git format-patch -1 --stdout {}", c.sha), &patch);
        }
        self
    }

    /// Rendered command lines in invocation order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run_bytes(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        let rendered = command_line(program, args);
        self.calls.lock().unwrap().push(rendered.clone());

        let rule = self.rules.iter().find(|r| {
            r.dir.as_ref().is_none_or(|d| dir.ends_with(d)) && rendered.starts_with(&r.prefix)
        });

        match rule.map(|r| &r.reply) {
            Some(Reply::Stdout(s)) => Ok(s.clone()),
            Some(Reply::Cancel(token)) => {
                token.cancel();
                Err(Error::Cancelled)
            }
            Some(Reply::Fail(stderr)) => Err(Error::Command {
                command: rendered,
                dir: dir.to_path_buf(),
                status: "exit status: 128".to_string(),
                stderr: stderr.clone(),
            }),
            None => Err(Error::Command {
                command: rendered,
                dir: dir.to_path_buf(),
                status: "exit status: 1".to_string(),
                stderr: "unscripted command".to_string(),
            }),
        }
    }
}
