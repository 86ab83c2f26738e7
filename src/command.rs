//! # External Command Execution
//!
//! Every version-control operation in the pipeline goes through the
//! `CommandRunner` trait: run one program with arguments in a directory, block
//! until it exits, and return its captured stdout or a failure carrying the
//! full diagnostic context. Stdout comes back as raw bytes; `run` is a
//! convenience for output that is only ever parsed as text.
//!
//! The trait is the seam that lets the resolver, extractor and scheduler be
//! tested with scripted output instead of real `git` invocations.
//! `SystemCommandRunner` is the production implementation. It polls its child
//! process so that a cancelled run kills in-flight commands instead of waiting
//! for them.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};

/// Trait for running external commands - allows mocking in tests
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` in `dir` and returns its stdout unchanged.
    ///
    /// A non-zero exit is reported as `Error::Command`.
    fn run_bytes(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Vec<u8>>;

    /// Like `run_bytes`, with invalid UTF-8 replaced by U+FFFD
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<String> {
        let stdout = self.run_bytes(dir, program, args)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Render a command line for logs and error messages
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs commands as child processes of this one.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl SystemCommandRunner {
    /// Create a runner that kills its children once `cancel` is set
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run_bytes(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        let rendered = command_line(program, args);
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        debug!("{}: {}", dir.display(), rendered);

        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::CommandSpawn {
                command: rendered.clone(),
                dir: dir.to_path_buf(),
                message: e.to_string(),
            })?;

        // Pipes are drained on their own threads so a chatty child never
        // blocks on a full pipe while we poll for its exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.cancel.is_cancelled() {
                debug!("killing `{}` in {}", rendered, dir.display());
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Cancelled);
            }
            thread::sleep(self.poll_interval);
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            return Err(Error::Command {
                command: rendered,
                dir: dir.to_path_buf(),
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
