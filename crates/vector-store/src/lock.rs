use crate::error::{Result, VectorStoreError};
use fs2::FileExt;
use std::path::PathBuf;
use std::time::Instant;

/// Exclusive advisory lock on a file; released on drop.
pub(crate) struct BuildLock {
    file: std::fs::File,
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Block (on the blocking pool) until no other process builds the same index.
pub(crate) async fn acquire_build_lock(path: PathBuf) -> Result<BuildLock> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::task::spawn_blocking(move || -> Result<BuildLock> {
        use std::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                VectorStoreError::LockError(format!("open build lock {}: {err}", path.display()))
            })?;

        let start = Instant::now();
        file.lock_exclusive().map_err(|err| {
            VectorStoreError::LockError(format!("acquire build lock {}: {err}", path.display()))
        })?;
        let waited = start.elapsed();
        if waited.as_millis() > 0 {
            log::debug!("waited {waited:?} for build lock {}", path.display());
        }

        Ok(BuildLock { file })
    })
    .await
    .map_err(|err| VectorStoreError::LockError(format!("join build lock task: {err}")))?
}
