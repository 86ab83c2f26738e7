//! # Patchsort Library
//!
//! This library extracts the commits that a multi-repository workspace's head
//! snapshot carries beyond an upstream snapshot, and sorts them into feature
//! buckets. It backs the `patchsort` command-line tool but can be driven
//! directly, with the external `git` process and the manifest reader both
//! replaceable behind traits.
//!
//! ## Quick Example
//!
//! ```
//! use patchsort::phases::classify::FeatureClassifier;
//!
//! let classifier = FeatureClassifier::new().unwrap();
//! let patch = "--- a/net.c\n+++ b/net.c\n@@ -1 +1,2 @@\n \
//!              int sock;\n+/* ACOS_MOD_FEATURE {networking fix} */\n";
//! assert_eq!(classifier.classify(patch), "networking_fix");
//! assert_eq!(classifier.classify("+int x;\n"), "ungrouped_patches");
//! ```
//!
//! ## Core Concepts
//!
//! - **Workspace (`workspace`)**: The directory tree holding every repository
//!   checkout, recognized by its `.repo` control directory.
//! - **Manifests (`manifest`)**: Snapshots mapping each repository path to a
//!   revision. One describes upstream, one describes head.
//! - **Commands (`command`, `git`)**: Every interaction with version control
//!   goes through a `CommandRunner`, which the `git` module drives.
//! - **Phases (`phases`)**: Resolve, extract, classify and write, chained per
//!   repository by `phases::processing`.
//! - **Sinks (`sink`)**: The ordering log and the optional SQLite analysis
//!   store, shared by all workers behind one lock.
//! - **Scheduling (`scheduler`, `cancel`)**: One job per repository on a
//!   bounded worker pool, with cooperative cancellation.
//!
//! ## Execution Flow
//!
//! The main entry point is `phases::orchestrator::execute_extract`:
//!
//! 1.  **Resolve manifests**: Read both snapshots into repository-to-revision
//!     maps.
//! 2.  **Prepare output**: Start from an empty output root, after checking it
//!     holds neither the workspace nor any checkout.
//! 3.  **Plan**: One job per head repository. Those absent upstream are
//!     skipped without running git.
//! 4.  **Run**: Each job finds its new commits with patch-id equivalence,
//!     renders them as patches, buckets them and records them.
//! 5.  **Summarize**: Fold every job's final state into a `RunSummary`.

pub mod cancel;
pub mod command;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod manifest;
pub mod output;
pub mod phases;
pub mod scheduler;
pub mod sink;
pub mod workspace;

#[cfg(test)]
mod testing;
