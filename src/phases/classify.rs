//! Feature bucket classification
//!
//! Patches are grouped by a marker that developers put into the code they
//! add, for example:
//!
//! ```text
//! +/* ACOS_MOD_FEATURE {networking fix} */
//! ```
//!
//! Only added lines are scanned, in order, and the first marker wins. The
//! braced label names the bucket; a marker without a label falls back to its
//! suffix. Classification is a pure function of the patch text.
//!
//! Inside a hunk the `@@ -a,b +c,d @@` line counts decide which lines belong
//! to the body, so an added line whose content starts with `++ ` is still
//! scanned. Outside hunks a `+` line counts as added unless it is a `+++ `
//! file header.

use std::str::Lines;

use regex::Regex;

use crate::error::Result;

/// Bucket for patches without a usable marker
pub const DEFAULT_BUCKET: &str = "ungrouped_patches";

const MARKER_PATTERN: &str =
    r"ACOS_MOD_(?P<suffix>[A-Za-z0-9_]+)(?:\s*\{(?P<label>[A-Za-z0-9_ ]*))?";

/// Maps patch text to a normalized bucket name
#[derive(Debug, Clone)]
pub struct FeatureClassifier {
    marker: Regex,
}

impl FeatureClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            marker: Regex::new(MARKER_PATTERN)?,
        })
    }

    /// Bucket name for `patch_text`
    pub fn classify(&self, patch_text: &str) -> String {
        AddedLines::new(patch_text)
            .find_map(|line| self.marker.captures(line))
            .map(|caps| {
                let label = caps
                    .name("label")
                    .map(|m| m.as_str())
                    .filter(|l| !l.trim().is_empty());
                let raw = match label {
                    Some(label) => label,
                    None => caps.name("suffix").map(|m| m.as_str()).unwrap_or_default(),
                };
                normalize_bucket(raw)
            })
            .filter(|bucket| bucket.chars().count() > 2)
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string())
    }
}

/// Added lines of a patch, in order
struct AddedLines<'a> {
    lines: Lines<'a>,
    /// Old and new side lines left in the current hunk
    old: usize,
    new: usize,
}

impl<'a> AddedLines<'a> {
    fn new(patch_text: &'a str) -> Self {
        Self {
            lines: patch_text.lines(),
            old: 0,
            new: 0,
        }
    }
}

impl<'a> Iterator for AddedLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let line = self.lines.next()?;
            if self.old == 0 && self.new == 0 {
                if let Some((old, new)) = hunk_counts(line) {
                    self.old = old;
                    self.new = new;
                } else if line.starts_with('+') && !line.starts_with("+++ ") {
                    return Some(line);
                }
                continue;
            }
            match line.as_bytes().first() {
                Some(b'+') => {
                    self.new = self.new.saturating_sub(1);
                    return Some(line);
                }
                Some(b'-') => self.old = self.old.saturating_sub(1),
                // "\ No newline at end of file"
                Some(b'\\') => {}
                _ => {
                    self.old = self.old.saturating_sub(1);
                    self.new = self.new.saturating_sub(1);
                }
            }
        }
    }
}

/// Old and new line counts of a `@@ -a,b +c,d @@` hunk header
fn hunk_counts(line: &str) -> Option<(usize, usize)> {
    let ranges = line.strip_prefix("@@ -")?;
    let (old, rest) = ranges.split_once(" +")?;
    let (new, _) = rest.split_once(" @@")?;
    Some((range_len(old)?, range_len(new)?))
}

/// Length of a `start[,len]` range; a bare start means one line
fn range_len(range: &str) -> Option<usize> {
    match range.split_once(',') {
        Some((_, len)) => len.parse().ok(),
        None => range.parse::<usize>().ok().map(|_| 1),
    }
}

/// Lowercase, trim, and replace ` `, `.`, `:`, `/`, `-` with `_`.
///
/// Applying it to its own output returns the same string.
pub fn normalize_bucket(raw: &str) -> String {
    raw.to_lowercase()
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '.' | ':' | '/' | '-' => '_',
            other => other,
        })
        .collect()
}
