use crate::fingerprint::ContentFingerprint;
use std::path::{Path, PathBuf};

pub const INDEX_FILE_EXTENSION: &str = "json";
pub const LOCK_FILE_EXTENSION: &str = "lock";

#[must_use]
pub fn index_path(root: &Path, fingerprint: &ContentFingerprint) -> PathBuf {
    root.join(format!("{fingerprint}.{INDEX_FILE_EXTENSION}"))
}

#[must_use]
pub fn lock_path(root: &Path, fingerprint: &ContentFingerprint) -> PathBuf {
    root.join(format!("{fingerprint}.{LOCK_FILE_EXTENSION}"))
}
