//! Append-only record of patch emission order
//!
//! One line per emitted patch: `<repo> <bucket> <patch base name>`. The log
//! itself does no locking; `SharedSinks` serializes every append so each line
//! reaches the file with a single `write_all` and is never interleaved with
//! another writer's line.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File name of the ordering log inside the output root
pub const ORDER_LOG_FILE: &str = "patch-order.log";

/// One emitted patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingRecord {
    pub repo: String,
    pub bucket: String,
    pub patch_base_name: String,
}

impl OrderingRecord {
    pub fn new(repo: &str, bucket: &str, patch_base_name: &str) -> Self {
        Self {
            repo: repo.to_string(),
            bucket: bucket.to_string(),
            patch_base_name: patch_base_name.to_string(),
        }
    }

    /// The record as a newline-terminated log line
    pub fn to_line(&self) -> String {
        format!("{} {} {}\n", self.repo, self.bucket, self.patch_base_name)
    }

    /// Parse a line written by `to_line`
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim_end_matches('\n').splitn(3, ' ');
        let repo = parts.next().filter(|s| !s.is_empty())?;
        let bucket = parts.next().filter(|s| !s.is_empty())?;
        let base = parts.next().filter(|s| !s.is_empty())?;
        Some(Self::new(repo, bucket, base))
    }
}

#[derive(Debug)]
pub struct OrderingLog {
    file: File,
    path: PathBuf,
}

impl OrderingLog {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single write
    pub fn append(&mut self, record: &OrderingRecord) -> Result<()> {
        self.file.write_all(record.to_line().as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}
