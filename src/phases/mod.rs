//! The extraction pipeline.
//!
//! ## Overview
//!
//! An extraction run goes through these steps:
//! 1. Resolve - find the commits a repository's head carries beyond upstream
//!    (`resolve`)
//! 2. Extract - render each new commit as a single-commit patch (`extract`)
//! 3. Classify - pick the feature bucket from the patch's added lines
//!    (`classify`)
//! 4. Write - place the patch in the bucketed output tree (`write`), or record
//!    it in the analysis store
//!
//! `processing` chains steps 1-4 for one repository. `orchestrator` prepares
//! the output, builds the `RunContext`, and hands one job per repository to
//! the scheduler.

use std::path::PathBuf;

use crate::command::CommandRunner;
use crate::config::RunMode;
use crate::sink::SharedSinks;
use crate::workspace::Workspace;

pub mod classify;
pub mod extract;
pub mod orchestrator;
pub mod processing;
pub mod resolve;
pub mod write;

use classify::FeatureClassifier;

/// Everything a repository job needs, shared read-only by all workers.
///
/// Jobs never touch global state: results flow back as return values and
/// the only shared writes go through `sinks`.
pub struct RunContext {
    pub workspace: Workspace,
    pub output_root: PathBuf,
    pub mode: RunMode,
    pub runner: Box<dyn CommandRunner>,
    pub classifier: FeatureClassifier,
    pub sinks: SharedSinks,
}

/// A context over a scratch workspace with the given checkout directories.
///
/// In analysis mode the store is in memory.
#[cfg(test)]
pub(crate) fn test_context<R: CommandRunner + 'static>(
    runner: R,
    repos: &[&str],
    mode: RunMode,
) -> (tempfile::TempDir, RunContext) {
    use crate::sink::analysis::AnalysisStore;
    use crate::sink::ordering_log::{OrderingLog, ORDER_LOG_FILE};

    let temp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join(".repo")).unwrap();
    for repo in repos {
        std::fs::create_dir_all(temp.path().join(repo)).unwrap();
    }
    let output_root = temp.path().join("out");
    std::fs::create_dir(&output_root).unwrap();

    let log = OrderingLog::open(&output_root.join(ORDER_LOG_FILE)).unwrap();
    let store = match mode {
        RunMode::Patches => None,
        RunMode::Analysis { .. } => Some(AnalysisStore::open_in_memory().unwrap()),
    };

    let ctx = RunContext {
        workspace: Workspace::discover(temp.path()).unwrap(),
        output_root,
        mode,
        runner: Box::new(runner),
        classifier: FeatureClassifier::new().unwrap(),
        sinks: SharedSinks::new(log, store),
    };
    (temp, ctx)
}
