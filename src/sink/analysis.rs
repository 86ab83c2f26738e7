//! SQLite store for analysis mode
//!
//! Instead of patch files, analysis mode records one row per new commit in
//! a single `patch` table. The commit hash is a global primary key: the same
//! hash arriving from two repositories is an anomaly and fails the second
//! repository's insert.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection, ErrorCode};

use crate::commit::Commit;
use crate::error::{Error, Result};

/// File name of the store inside the output root when none is configured
pub const DEFAULT_DATABASE: &str = "patches.db";

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS patch (
        sha1    TEXT PRIMARY KEY,
        subject TEXT NOT NULL,
        author  TEXT NOT NULL,
        project TEXT NOT NULL,
        feature TEXT NOT NULL,
        file    TEXT NOT NULL
    );
";

/// One row of the `patch` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRow {
    pub sha1: String,
    pub subject: String,
    /// Author email domain
    pub author: String,
    pub project: String,
    pub feature: String,
    pub file: String,
}

impl AnalysisRow {
    pub fn new(commit: &Commit, repo: &str, bucket: &str) -> Self {
        Self {
            sha1: commit.full_hash.clone(),
            subject: commit.subject.clone(),
            author: commit.author_domain(),
            project: repo.to_string(),
            feature: bucket.to_string(),
            file: commit.files.clone(),
        }
    }
}

/// Count commits per author email domain
pub fn contributor_domains<'a, I>(commits: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a Commit>,
{
    let mut counts = BTreeMap::new();
    for commit in commits {
        *counts.entry(commit.author_domain()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug)]
pub struct AnalysisStore {
    conn: Connection,
}

impl AnalysisStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Insert all rows of one repository in a single transaction.
    ///
    /// A hash that is already stored rolls back the whole batch and returns
    /// `Error::DuplicateCommit`.
    pub fn insert_repository(&mut self, repo: &str, rows: &[AnalysisRow]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for row in rows {
            tx.execute(
                "INSERT INTO patch (sha1, subject, author, project, feature, file)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.sha1,
                    row.subject,
                    row.author,
                    row.project,
                    row.feature,
                    row.file
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref f, _)
                    if f.code == ErrorCode::ConstraintViolation =>
                {
                    Error::DuplicateCommit {
                        sha: row.sha1.clone(),
                        repo: repo.to_string(),
                    }
                }
                other => Error::Store(other),
            })?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Number of stored rows
    pub fn row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patch", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
