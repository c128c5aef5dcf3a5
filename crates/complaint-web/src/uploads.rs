//! Disk storage for complaint attachments.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Attachment directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Use `dir` for attachments. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The attachment directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store an upload and return its stored filename
    /// (`<unix-millis>_<sanitized original name>`).
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = format!(
            "{}_{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_filename(original_name)
        );
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        info!(filename = %filename, size = bytes.len(), "Attachment stored");
        Ok(filename)
    }

    /// Delete a stored file. Failures are logged, not returned.
    pub async fn remove(&self, filename: &str) {
        let Some(path) = self.resolve(filename) else {
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(filename, "Attachment removed"),
            Err(err) => warn!(filename, error = %err, "Failed to remove attachment"),
        }
    }

    /// Read a stored file; `None` if it does not exist or the name is unsafe.
    pub async fn read(&self, filename: &str) -> std::io::Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(filename) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Path for a bare filename; rejects anything that could leave the directory.
    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return None;
        }
        Some(self.dir.join(filename))
    }
}

/// Replace every character outside `[A-Za-z0-9.]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect();

    // A run of dots could still read as a parent reference.
    cleaned.replace("..", "__")
}
