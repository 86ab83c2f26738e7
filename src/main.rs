//! # Patchsort CLI
//!
//! This is the binary entry point for the `patchsort` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors and translating them into a
//!   non-zero exit status.
//!
//! The core logic lives in the `patchsort` library crate; the binary is a thin
//! wrapper that owns process-level concerns such as logging setup, the Ctrl-C
//! handler and progress display.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
