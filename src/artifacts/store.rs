//! Transient artifact directory management.
//!
//! # Responsibilities
//! - Create the artifact directory on startup (idempotent)
//! - Hand out unique `.png` paths, one per pipeline invocation
//! - Delete artifacts once the pipeline is done with them

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::observability::metrics;

/// Process-wide allocation counter. Relaxed ordering is enough: only uniqueness matters.
static ARTIFACT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A generated file owned by exactly one pipeline invocation.
///
/// Not `Clone`: [`ArtifactStore::remove`] consumes it, so an artifact cannot
/// be removed twice. An artifact dropped without going through `remove`
/// (panic, cancelled request) deletes its file synchronously.
#[derive(Debug)]
pub struct QrArtifact {
    path: PathBuf,
    created_at: SystemTime,
    armed: bool,
}

impl QrArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}

impl Drop for QrArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::warn!(path = %self.path.display(), "Artifact removed on abandoned request");
                metrics::record_artifact_removal("abandoned");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to remove abandoned artifact");
                metrics::record_artifact_removal("error");
            }
        }
    }
}

/// Directory of short-lived generated files.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    directory: PathBuf,
}

impl ArtifactStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub async fn ensure_directory(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        tracing::debug!(directory = %self.directory.display(), "Artifact directory ready");
        Ok(())
    }

    /// Reserve a fresh path for a new artifact.
    ///
    /// Names combine wall-clock milliseconds, the process id, a process-wide
    /// counter and a random suffix: `qr-{millis}-{pid}-{seq}-{rand}.png`.
    /// Nothing is written to disk here.
    pub fn allocate(&self) -> QrArtifact {
        let created_at = SystemTime::now();
        let millis = created_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let seq = ARTIFACT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let file_name = format!(
            "qr-{}-{}-{}-{:08x}.png",
            millis,
            std::process::id(),
            seq,
            fastrand::u32(..)
        );

        QrArtifact {
            path: self.directory.join(file_name),
            created_at,
            armed: true,
        }
    }

    /// Delete an artifact.
    ///
    /// Returns `true` when the file was deleted. A file that is already gone
    /// is logged and reported as `false`; removal never fails the caller.
    pub async fn remove(&self, mut artifact: QrArtifact) -> bool {
        artifact.armed = false;
        let age_ms = artifact
            .created_at
            .elapsed()
            .map(|d| d.as_millis())
            .unwrap_or_default();

        match tokio::fs::remove_file(&artifact.path).await {
            Ok(()) => {
                tracing::debug!(path = %artifact.path.display(), age_ms, "Artifact removed");
                metrics::record_artifact_removal("removed");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %artifact.path.display(), "Artifact already absent");
                metrics::record_artifact_removal("absent");
                false
            }
            Err(e) => {
                tracing::error!(path = %artifact.path.display(), error = %e, "Failed to remove artifact");
                metrics::record_artifact_removal("error");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[tokio::test]
    async fn ensure_directory_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path().join("nested").join("qr"));

        store.ensure_directory().await.unwrap();
        store.ensure_directory().await.unwrap();

        assert!(store.directory().is_dir());
    }

    #[test]
    fn allocated_paths_live_in_directory_with_png_extension() {
        let store = ArtifactStore::new("/tmp/qr-test");
        let artifact = store.allocate();

        assert_eq!(artifact.path().parent(), Some(Path::new("/tmp/qr-test")));
        assert_eq!(artifact.path().extension().and_then(|e| e.to_str()), Some("png"));
        let name = artifact.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("qr-"));
        assert!(!artifact.path().exists());
    }

    #[tokio::test]
    async fn concurrent_allocations_never_collide() {
        let store = ArtifactStore::new("/tmp/qr-test");
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                (0..64).map(|_| store.allocate().path().to_path_buf()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for path in handle.await.unwrap() {
                assert!(seen.insert(path), "duplicate artifact path");
            }
        }
        assert_eq!(seen.len(), 16 * 64);
    }

    #[tokio::test]
    async fn remove_deletes_file() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let artifact = store.allocate();
        let path = artifact.path().to_path_buf();
        std::fs::write(&path, b"png").unwrap();

        assert!(store.remove(artifact).await);
        assert!(!path.exists());
    }

    #[test]
    fn dropped_artifact_deletes_its_file() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let artifact = store.allocate();
        let path = artifact.path().to_path_buf();
        std::fs::write(&path, b"png").unwrap();

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn dropping_unwritten_artifact_is_silent() {
        let tmp = TempDir::new().unwrap();
        drop(ArtifactStore::new(tmp.path()).allocate());
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn remove_tolerates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let artifact = store.allocate();

        assert!(!store.remove(artifact).await);
    }
}
