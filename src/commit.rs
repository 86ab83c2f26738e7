//! Commit metadata and the bounded text fields derived from it

/// Upper bound, in characters, for every metadata field used in a file name
/// or stored row.
pub const MAX_FIELD_CHARS: usize = 128;

/// Clip `text` to at most `MAX_FIELD_CHARS` characters.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn clip(text: &str) -> String {
    match text.char_indices().nth(MAX_FIELD_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// A commit as read from a repository. Every field is clipped on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub full_hash: String,
    pub abbrev_hash: String,
    pub subject: String,
    /// Filesystem-safe rendering of the subject
    pub sanitized_subject: String,
    pub author_email: String,
    /// Changed paths joined with `,`
    pub files: String,
}

impl Commit {
    pub fn new(
        full_hash: &str,
        abbrev_hash: &str,
        subject: &str,
        sanitized_subject: &str,
        author_email: &str,
        changed_files: &[String],
    ) -> Self {
        Self {
            full_hash: clip(full_hash),
            abbrev_hash: clip(abbrev_hash),
            subject: clip(subject),
            sanitized_subject: clip(sanitized_subject),
            author_email: clip(author_email),
            files: clip(&changed_files.join(",")),
        }
    }

    /// Domain part of the author email, lowercased.
    ///
    /// An address without `@` is treated as all domain.
    pub fn author_domain(&self) -> String {
        let email = self.author_email.trim();
        email
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or(email)
            .to_lowercase()
    }

    /// `<abbrevHash>-<sanitizedSubject>`, the patch file name without extension
    pub fn patch_base_name(&self) -> String {
        format!("{}-{}", self.abbrev_hash, self.sanitized_subject)
    }

    /// File name of the patch in its bucket directory
    pub fn patch_file_name(&self) -> String {
        format!("{}.patch", self.patch_base_name())
    }
}
