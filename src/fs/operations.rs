use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{fs::File, io::AsyncWriteExt};

/// Reads a whole file into a string. A missing file is not an error, it simply means nothing has
/// been stored yet.
pub async fn read_optional(path: &Path) -> Result<Option<String>, std::io::Error> {
    match tokio::fs::read_to_string(path).await {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Replaces file contents so that readers either see the previous or the new version, never a
/// half written one. Data is written into a sibling temporary file which is then renamed over the
/// target.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temporary = temporary_path(path);
    {
        let mut file = File::create(&temporary).await?;
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;
    }
    tokio::fs::rename(&temporary, path).await
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Advisory lock shared between the daemon and cli invocations. Held while a store performs a
/// read-modify-write cycle, so that two processes incrementing the same counter don't lose an
/// update.
pub struct DirectoryLock {
    file: File,
}

impl DirectoryLock {
    pub async fn acquire(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .read(true)
            .open(dir.join(".lock"))
            .await?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    pub async fn release(self) -> Result<()> {
        self.file.unlock_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::fs::operations::{read_optional, write_atomic, DirectoryLock};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let value = read_optional(&dir.path().join("absent.json")).await?;
        assert_eq!(value, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_atomic_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("value.txt");

        write_atomic(&path, b"first").await?;
        write_atomic(&path, b"second").await?;

        assert_eq!(read_optional(&path).await?.as_deref(), Some("second"));
        assert!(!dir.path().join("nested").join("value.txt.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_can_be_reacquired() -> Result<()> {
        let dir = tempdir()?;
        let lock = DirectoryLock::acquire(dir.path()).await?;
        lock.release().await?;
        let lock = DirectoryLock::acquire(dir.path()).await?;
        lock.release().await?;
        Ok(())
    }
}
