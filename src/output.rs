//! # Output Configuration
//!
//! Utilities for controlling CLI output appearance and for rendering the
//! end-of-run summary.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use patchsort::output::{render_summary, OutputConfig};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! print!("{}", render_summary(&config, &summary, &output_root));
//! ```

use std::env;
use std::fmt::Write;
use std::path::Path;

use console::style;

use crate::scheduler::RunSummary;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Human-readable end-of-run report
pub fn render_summary(config: &OutputConfig, summary: &RunSummary, output_root: &Path) -> String {
    let mut out = String::new();
    let paint = |text: String, ok: bool| {
        if !config.use_color {
            text
        } else if ok {
            style(text).green().to_string()
        } else {
            style(text).red().bold().to_string()
        }
    };

    let (icon, plain, headline) = if summary.interrupted {
        ("🛑", "[STOP]", "Interrupted")
    } else if summary.failed.is_empty() {
        ("✅", "[OK]", "Extraction complete")
    } else {
        ("❌", "[FAIL]", "Extraction finished with failures")
    };
    let _ = writeln!(
        out,
        "{} {}",
        emoji(config, icon, plain),
        paint(headline.to_string(), summary.is_success())
    );

    let _ = writeln!(
        out,
        "   {} patches from {} repositories",
        summary.total_patches, summary.completed
    );
    let _ = writeln!(
        out,
        "   {} unchanged, {} not in upstream",
        summary.skipped_no_new_commits, summary.skipped_not_in_upstream
    );
    if summary.cancelled > 0 {
        let _ = writeln!(out, "   {} cancelled", summary.cancelled);
    }
    if !summary.failed.is_empty() {
        let _ = writeln!(
            out,
            "   {}",
            paint(format!("{} failed:", summary.failed.len()), false)
        );
        for failure in &summary.failed {
            let _ = writeln!(out, "     {}: {}", failure.repo, failure.error);
        }
    }
    let _ = writeln!(out, "   Output written to: {}", output_root.display());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FailedRepo;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🔍", "[SCAN]"), "🔍");
        assert_eq!(emoji(&OutputConfig::without_color(), "🔍", "[SCAN]"), "[SCAN]");
    }

    #[test]
    fn test_render_success() {
        let summary = RunSummary {
            completed: 2,
            total_patches: 5,
            skipped_no_new_commits: 3,
            skipped_not_in_upstream: 1,
            ..RunSummary::default()
        };
        let text =
            render_summary(&OutputConfig::without_color(), &summary, Path::new("/w/patches"));

        assert!(text.starts_with("[OK] Extraction complete\n"));
        assert!(text.contains("5 patches from 2 repositories"));
        assert!(text.contains("3 unchanged, 1 not in upstream"));
        assert!(text.contains("Output written to: /w/patches"));
        assert!(!text.contains("failed"));
    }

    #[test]
    fn test_render_failures() {
        let summary = RunSummary {
            failed: vec![FailedRepo {
                repo: "core".to_string(),
                error: "boom".to_string(),
            }],
            ..RunSummary::default()
        };
        let text = render_summary(&OutputConfig::without_color(), &summary, Path::new("out"));

        assert!(text.starts_with("[FAIL]"));
        assert!(text.contains("1 failed:"));
        assert!(text.contains("core: boom"));
    }

    #[test]
    fn test_render_interrupted() {
        let summary = RunSummary {
            interrupted: true,
            cancelled: 4,
            ..RunSummary::default()
        };
        let text = render_summary(&OutputConfig::without_color(), &summary, Path::new("out"));
        assert!(text.starts_with("[STOP] Interrupted"));
        assert!(text.contains("4 cancelled"));
    }
}
