//! Local filesystem media store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::{MediaStore, UploadRules, UploadedFile};

/// Stores media under a configured web root: images in `<root>/uploads/`,
/// videos in `<root>/uploads/videos/`, served at matching root-relative URLs.
///
/// The file write and any database update around it are not transactional; a
/// crash between the two can leave an orphaned file or a dangling URL.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a root-relative URL to an on-disk path.
    fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }

    async fn ensure_dir(&self, dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to create upload directory {}: {e}",
                dir.display()
            ))
        })
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn store(&self, file: UploadedFile, rules: &UploadRules) -> Result<String, AppError> {
        rules.check(&file)?;

        // Extension presence was just validated.
        let ext = file
            .file_name
            .rfind('.')
            .map(|idx| file.file_name[idx..].to_lowercase())
            .unwrap_or_default();

        let stored_name = format!("{}{ext}", Uuid::new_v4());
        let dir = self.root.join(rules.subdir);
        self.ensure_dir(&dir).await?;

        let path = dir.join(&stored_name);
        fs::write(&path, &file.data).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to write upload {}: {e}",
                path.display()
            ))
        })?;

        debug!(path = %path.display(), bytes = file.data.len(), "Stored upload");
        Ok(format!("/{}/{stored_name}", rules.subdir))
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let path = self.resolve(url);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Failed to delete upload {}: {e}",
                path.display()
            ))),
        }
    }
}
