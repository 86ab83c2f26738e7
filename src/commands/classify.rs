//! Classify command implementation
//!
//! Prints the feature bucket of each given patch file, one
//! `<bucket>\t<file>` line per file, in argument order.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use patchsort::phases::classify::FeatureClassifier;

/// Arguments for the classify command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Patch files to classify
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Execute the classify command
pub fn execute(args: ClassifyArgs) -> Result<()> {
    let classifier = FeatureClassifier::new()?;
    for file in &args.files {
        let bytes =
            fs::read(file).with_context(|| format!("Failed to read patch {}", file.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        println!("{}\t{}", classifier.classify(&text), file.display());
    }
    Ok(())
}
