//! # Error Handling
//!
//! This module defines the centralized error type for the `patchsort`
//! library. It uses the `thiserror` library to create one `Error` enum that
//! covers every anticipated failure mode, with enough context in each variant
//! to diagnose a failed repository job from the log alone.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum for all library failures.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Errors fall into three groups:
//!
//! - Run-level errors (`Environment`, `ManifestParse`, `Config`) abort the run
//!   before any job is dispatched.
//! - Job-level errors (`Command`, `CommandSpawn`, `MissingRepository`,
//!   `DuplicateCommit`, `Store`, `Io`) fail a single repository job and are
//!   reported in the run summary.
//! - `Cancelled` marks work that was stopped by an interrupt. It is never
//!   reported as a failure.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for patchsort operations
#[derive(Error, Debug)]
pub enum Error {
    /// The process is not running inside a recognized workspace.
    #[error("Not inside a workspace: {message}")]
    Environment { message: String },

    /// A manifest document could not be read or interpreted.
    #[error("Manifest error in {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    /// An external command exited with a non-zero status.
    #[error("Command `{command}` failed in {} ({status}): {stderr}", dir.display())]
    Command {
        command: String,
        dir: PathBuf,
        status: String,
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("Failed to run `{command}` in {}: {message}", dir.display())]
    CommandSpawn {
        command: String,
        dir: PathBuf,
        message: String,
    },

    /// A repository named by the manifests is not checked out in the workspace.
    #[error("Repository {repo} not found at {}", path.display())]
    MissingRepository { repo: String, path: PathBuf },

    /// The same commit hash was recorded twice in the analysis store.
    #[error("Commit {sha} from {repo} is already recorded in the analysis store")]
    DuplicateCommit { sha: String, repo: String },

    /// The run configuration is invalid.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// An error from the SQLite analysis store.
    #[error("Analysis store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// The shared sink lock was poisoned by a panicking writer.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// The run was interrupted before this work finished.
    #[error("Cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error is the result of cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
