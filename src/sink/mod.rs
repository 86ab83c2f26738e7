//! # Shared Sinks
//!
//! The ordering log and the analysis store are the only mutable state shared
//! between repository jobs. Both sit behind one `Mutex`, and every method here
//! holds the guard only for the duration of its write. The guard is a scoped
//! value, so it is released on every exit path, including early returns and
//! unwinding.
//!
//! Patch files are not a shared sink in this sense: each lands at its own
//! path, and the output writer tolerates racing directory creation.

pub mod analysis;
pub mod ordering_log;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

use analysis::{AnalysisRow, AnalysisStore};
use ordering_log::{OrderingLog, OrderingRecord, ORDER_LOG_FILE};

#[derive(Debug)]
struct SinkState {
    log: OrderingLog,
    store: Option<AnalysisStore>,
}

/// The ordering log and optional analysis store, guarded by one lock
#[derive(Debug)]
pub struct SharedSinks {
    state: Mutex<SinkState>,
}

impl SharedSinks {
    pub fn new(log: OrderingLog, store: Option<AnalysisStore>) -> Self {
        Self {
            state: Mutex::new(SinkState { log, store }),
        }
    }

    /// Open the ordering log in `output_root`, and the analysis store at
    /// `database` when given.
    pub fn open(output_root: &Path, database: Option<&Path>) -> Result<Self> {
        let log = OrderingLog::open(&output_root.join(ORDER_LOG_FILE))?;
        let store = database.map(AnalysisStore::open).transpose()?;
        Ok(Self::new(log, store))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SinkState>> {
        self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "shared sinks".to_string(),
        })
    }

    /// Append one ordering record
    pub fn append(&self, record: &OrderingRecord) -> Result<()> {
        self.lock()?.log.append(record)
    }

    /// Insert one repository's rows as a single transaction, then append its
    /// ordering records.
    ///
    /// Nothing is logged when the transaction fails.
    pub fn record_analysis(
        &self,
        repo: &str,
        rows: &[AnalysisRow],
        records: &[OrderingRecord],
    ) -> Result<()> {
        let mut state = self.lock()?;
        let store = state.store.as_mut().ok_or_else(|| Error::Config {
            message: "analysis store is not open".to_string(),
        })?;
        store.insert_repository(repo, rows)?;
        for record in records {
            state.log.append(record)?;
        }
        Ok(())
    }

    /// Number of rows in the analysis store, if one is open
    pub fn stored_rows(&self) -> Result<Option<usize>> {
        let state = self.lock()?;
        state.store.as_ref().map(AnalysisStore::row_count).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::Commit;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_concurrent_appends_produce_whole_lines() {
        let temp_dir = TempDir::new().unwrap();
        let sinks = Arc::new(SharedSinks::open(temp_dir.path(), None).unwrap());
        let writers = 8;
        let per_writer = 200;

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let sinks = Arc::clone(&sinks);
                thread::spawn(move || {
                    for i in 0..per_writer {
                        let record = OrderingRecord::new(
                            &format!("repo{}", w),
                            "some_bucket_with_a_longer_name",
                            &format!("{:07}-A-reasonably-long-sanitized-subject-{}", i, i),
                        );
                        sinks.append(&record).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let content = fs::read_to_string(temp_dir.path().join(ORDER_LOG_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), writers * per_writer);
        for line in &lines {
            let record = OrderingRecord::parse(line).expect("well-formed line");
            assert!(record.repo.starts_with("repo"));
            assert_eq!(record.bucket, "some_bucket_with_a_longer_name");
        }

        // Per-writer order is preserved
        for w in 0..writers {
            let repo = format!("repo{}", w);
            let own: Vec<&str> = lines
                .iter()
                .filter(|l| l.starts_with(&format!("{} ", repo)))
                .copied()
                .collect();
            assert_eq!(own.len(), per_writer);
            assert!(own[0].contains("0000000-"));
            assert!(own[per_writer - 1].contains(&format!("{:07}-", per_writer - 1)));
        }
    }

    #[test]
    fn test_record_analysis_logs_after_commit() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("patches.db");
        let sinks = SharedSinks::open(temp_dir.path(), Some(&db)).unwrap();

        let commit = Commit::new("abc123", "abc", "Subj", "Subj", "a@corp.io", &[]);
        let rows = vec![AnalysisRow::new(&commit, "core", "audio")];
        let records = vec![OrderingRecord::new("core", "audio", &commit.patch_base_name())];

        sinks.record_analysis("core", &rows, &records).unwrap();
        assert_eq!(sinks.stored_rows().unwrap(), Some(1));

        // Same hash again: rejected, and nothing more is logged
        let err = sinks.record_analysis("net", &rows, &records).unwrap_err();
        assert!(matches!(err, Error::DuplicateCommit { .. }));

        let content = fs::read_to_string(temp_dir.path().join(ORDER_LOG_FILE)).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_record_analysis_without_store_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let sinks = SharedSinks::open(temp_dir.path(), None).unwrap();
        assert!(sinks.record_analysis("core", &[], &[]).is_err());
        assert_eq!(sinks.stored_rows().unwrap(), None);
    }

    #[test]
    fn test_lock_is_released_after_panicking_holder() {
        let temp_dir = TempDir::new().unwrap();
        let sinks = Arc::new(SharedSinks::open(temp_dir.path(), None).unwrap());

        let worker = {
            let sinks = Arc::clone(&sinks);
            thread::spawn(move || {
                let _guard = sinks.state.lock().unwrap();
                panic!("worker died while holding the sink lock");
            })
        };
        assert!(worker.join().is_err());

        // The guard was dropped during unwinding; later writers see a
        // poisoned lock instead of blocking forever.
        let err = sinks
            .append(&OrderingRecord::new("core", "bucket", "p"))
            .unwrap_err();
        assert!(matches!(err, Error::LockPoisoned { .. }));
    }
}
