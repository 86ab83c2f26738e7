//! Writing patch files into the bucketed output tree
//!
//! Each patch lands at `<root>/<bucket>/<file_name>`. Several workers may
//! create the same bucket directory at once, so an "already exists" outcome
//! from a racing creator is treated as success.
//!
//! Two patches with the same file name in one bucket overwrite each other;
//! the last writer wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Create `dir` and its parents, tolerating a concurrent creator
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Write `bytes` to `<root>/<bucket>/<file_name>` and return the full path
pub fn write_patch(root: &Path, bucket: &str, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let dir = root.join(bucket);
    ensure_dir(&dir)?;

    let path = dir.join(file_name);
    fs::write(&path, bytes)?;
    Ok(path)
}
