use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use uuid::Uuid;

pub(crate) type ArcTmpDir = Arc<TmpDir>;

/// A per-process scratch directory, removed when the server shuts down
#[derive(Debug)]
pub(crate) struct TmpDir {
    path: Option<PathBuf>,
}

impl TmpDir {
    pub(crate) async fn init<P: AsRef<Path>>(path: P) -> std::io::Result<Arc<Self>> {
        let path = path.as_ref().join(Uuid::now_v7().to_string());
        tokio::fs::create_dir_all(&path).await?;
        Ok(Arc::new(TmpDir { path: Some(path) }))
    }

    fn build_tmp_file(&self, ext: Option<&str>) -> PathBuf {
        let path = self.path.as_ref().expect("tmp path exists");

        if let Some(ext) = ext {
            path.join(format!("{}{}", Uuid::now_v7(), ext))
        } else {
            path.join(Uuid::now_v7().to_string())
        }
    }

    /// Reserve a uniquely named path inside the scratch directory
    ///
    /// Nothing is created on disk until the caller writes to the returned path.
    pub(crate) fn tmp_file(&self, ext: Option<&str>) -> TmpFile {
        TmpFile::new(self.build_tmp_file(ext))
    }

    pub(crate) async fn cleanup(self: Arc<Self>) -> std::io::Result<()> {
        if let Some(path) = Arc::into_inner(self).and_then(|mut this| this.path.take()) {
            tokio::fs::remove_dir_all(path).await?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        self.path.as_deref().expect("tmp path exists")
    }
}

impl Drop for TmpDir {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                tracing::warn!("Failed to remove temporary directory {path:?}: {e}");
            }
        }
    }
}

/// Owns a temporary path, removing the file when cleaned up or dropped
///
/// Removing a file that is already gone counts as success, so cleanup can run on every exit path.
#[must_use]
#[derive(Debug)]
pub(crate) struct TmpFile(Option<PathBuf>);

impl TmpFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        TmpFile(Some(path))
    }

    pub(crate) async fn cleanup(mut self) -> std::io::Result<()> {
        if let Some(path) = self.0.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Move the file to `to`, transferring ownership of the new path to the returned guard
    ///
    /// On failure `self` is dropped and the original file is removed.
    pub(crate) async fn rename(mut self, to: PathBuf) -> std::io::Result<TmpFile> {
        tokio::fs::rename(&*self, &to).await?;

        self.0.take();

        Ok(TmpFile::new(to))
    }
}

impl AsRef<Path> for TmpFile {
    fn as_ref(&self) -> &Path {
        self.0.as_deref().unwrap()
    }
}

impl Deref for TmpFile {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.0.as_deref().unwrap()
    }
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TmpDir, TmpFile};

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let tmp_dir = TmpDir::init(scratch.path()).await.expect("Created tmp dir");

        let file = tmp_dir.tmp_file(Some(".mp4"));
        tokio::fs::write(&file, b"bytes").await.expect("Wrote file");
        tokio::fs::remove_file(&file).await.expect("Removed file");

        file.cleanup().await.expect("Missing file is not an error");
    }

    #[tokio::test]
    async fn drop_removes_file() {
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let path = scratch.path().join("dropped");
        std::fs::write(&path, b"bytes").expect("Wrote file");

        drop(TmpFile::new(path.clone()));

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn rename_moves_ownership() {
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let from = scratch.path().join("video.mp4.processing");
        let to = scratch.path().join("video.mp4");
        std::fs::write(&from, b"bytes").expect("Wrote file");

        let renamed = TmpFile::new(from.clone())
            .rename(to.clone())
            .await
            .expect("Renamed");

        assert!(!from.exists());
        assert!(to.exists());

        drop(renamed);
        assert!(!to.exists());
    }

    #[tokio::test]
    async fn failed_rename_removes_source() {
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let from = scratch.path().join("video.mp4.processing");
        let to = scratch.path().join("missing-dir").join("video.mp4");
        std::fs::write(&from, b"bytes").expect("Wrote file");

        let res = TmpFile::new(from.clone()).rename(to).await;

        assert!(res.is_err());
        assert!(!from.exists());
    }

    #[tokio::test]
    async fn cleanup_removes_dir() {
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let tmp_dir = TmpDir::init(scratch.path()).await.expect("Created tmp dir");
        let path = tmp_dir.path().to_path_buf();

        tmp_dir.cleanup().await.expect("Cleaned up");

        assert!(!path.exists());
    }
}
